// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 推荐引擎集成测试

use bilicrawl::domain::models::video::{Difficulty, Subject, VideoEnrichment, VideoRecord};
use bilicrawl::domain::repositories::VideoRepository;
use bilicrawl::domain::services::recommend_engine::{RecommendEngine, RecommendQuery, Strategy};
use bilicrawl::infrastructure::repositories::InMemoryVideoRepository;
use chrono::{Duration, Utc};
use std::sync::Arc;

struct Seed {
    bvid: &'static str,
    title: &'static str,
    up_name: &'static str,
    view: u64,
    favorite: u64,
    days_ago: i64,
    subject: Subject,
    topics: &'static [&'static str],
    difficulty: Difficulty,
    score: f64,
    recommended: bool,
}

async fn seed_repo(seeds: &[Seed]) -> Arc<InMemoryVideoRepository> {
    let repo = Arc::new(InMemoryVideoRepository::new());
    for s in seeds {
        repo.upsert_batch(&[VideoRecord {
            bvid: s.bvid.to_string(),
            title: s.title.to_string(),
            up_name: s.up_name.to_string(),
            view_count: s.view,
            favorite_count: s.favorite,
            pubdate: Some(Utc::now() - Duration::days(s.days_ago)),
            ..Default::default()
        }])
        .await
        .unwrap();
        repo.upsert_enrichment(&VideoEnrichment {
            bvid: s.bvid.to_string(),
            subject: Some(s.subject),
            topics: s.topics.iter().map(|t| t.to_string()).collect(),
            difficulty: s.difficulty,
            quality_score: s.score,
            is_recommended: s.recommended,
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
    }
    repo
}

fn default_seeds() -> Vec<Seed> {
    vec![
        Seed {
            bvid: "BV1a",
            title: "极限入门",
            up_name: "宋浩老师官方",
            view: 10_000,
            favorite: 500,
            days_ago: 10,
            subject: Subject::Calculus,
            topics: &["极限与连续"],
            difficulty: Difficulty::Entry,
            score: 92.0,
            recommended: true,
        },
        Seed {
            bvid: "BV1b",
            title: "泰勒级数强化",
            up_name: "张宇考研数学",
            view: 50_000,
            favorite: 1_000,
            days_ago: 400,
            subject: Subject::Calculus,
            topics: &["级数"],
            difficulty: Difficulty::Intermediate,
            score: 85.0,
            recommended: true,
        },
        Seed {
            bvid: "BV1c",
            title: "矩阵的本质",
            up_name: "3Blue1Brown",
            view: 200_000,
            favorite: 30_000,
            days_ago: 900,
            subject: Subject::LinearAlgebra,
            topics: &["矩阵", "直观"],
            difficulty: Difficulty::Entry,
            score: 96.0,
            recommended: true,
        },
        Seed {
            bvid: "BV1d",
            title: "竞赛难题选讲",
            up_name: "无名讲师",
            view: 800,
            favorite: 10,
            days_ago: 2000,
            subject: Subject::Probability,
            topics: &["概率基础", "竞赛"],
            difficulty: Difficulty::Advanced,
            score: 55.0,
            recommended: false,
        },
    ]
}

fn engine(repo: Arc<InMemoryVideoRepository>) -> RecommendEngine<Arc<InMemoryVideoRepository>> {
    RecommendEngine::new(repo, 50)
}

#[tokio::test]
async fn test_hot_orders_by_quality_score() {
    let repo = seed_repo(&default_seeds()).await;
    let page = engine(repo)
        .recommend(&RecommendQuery::default())
        .await
        .unwrap();

    // 未达标的 BV1d 被排除
    assert_eq!(page.total, 3);
    let order: Vec<&str> = page.items.iter().map(|i| i.bvid.as_str()).collect();
    assert_eq!(order, vec!["BV1c", "BV1a", "BV1b"]);
    assert_eq!(page.items[0].quality_score, Some(96.0));
}

#[tokio::test]
async fn test_easy_preset_equals_hot_plus_entry() {
    let repo = seed_repo(&default_seeds()).await;
    let eng = engine(repo);

    let easy = eng
        .recommend(&RecommendQuery {
            strategy: Strategy::Easy,
            ..Default::default()
        })
        .await
        .unwrap();
    let hot_entry = eng
        .recommend(&RecommendQuery {
            strategy: Strategy::Hot,
            difficulty: Some(Difficulty::Entry),
            ..Default::default()
        })
        .await
        .unwrap();

    let ids = |p: &bilicrawl::domain::services::recommend_engine::RecommendPage| {
        p.items.iter().map(|i| i.bvid.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&easy), ids(&hot_entry));
    assert_eq!(ids(&easy), vec!["BV1c", "BV1a"]);
}

#[tokio::test]
async fn test_explicit_difficulty_overrides_preset() {
    let repo = seed_repo(&default_seeds()).await;
    let page = engine(repo)
        .recommend(&RecommendQuery {
            strategy: Strategy::Hard,
            difficulty: Some(Difficulty::Intermediate),
            ..Default::default()
        })
        .await
        .unwrap();

    // hard 预设被显式的进阶难度覆盖
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].bvid, "BV1b");
}

#[tokio::test]
async fn test_popular_orders_by_favorite_rate() {
    let repo = seed_repo(&default_seeds()).await;
    let page = engine(repo)
        .recommend(&RecommendQuery {
            strategy: Strategy::Popular,
            ..Default::default()
        })
        .await
        .unwrap();

    // 收藏率：BV1c 15% > BV1a 5% > BV1b 2%
    let order: Vec<&str> = page.items.iter().map(|i| i.bvid.as_str()).collect();
    assert_eq!(order, vec!["BV1c", "BV1a", "BV1b"]);
}

#[tokio::test]
async fn test_latest_orders_by_pubdate() {
    let repo = seed_repo(&default_seeds()).await;
    let page = engine(repo)
        .recommend(&RecommendQuery {
            strategy: Strategy::Latest,
            ..Default::default()
        })
        .await
        .unwrap();

    let order: Vec<&str> = page.items.iter().map(|i| i.bvid.as_str()).collect();
    assert_eq!(order, vec!["BV1a", "BV1b", "BV1c"]);
}

#[tokio::test]
async fn test_course_filter_expands_topics() {
    let repo = seed_repo(&default_seeds()).await;
    let page = engine(repo)
        .recommend(&RecommendQuery {
            course: Some(Subject::Calculus),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|i| i.subject.as_deref() == Some("高等数学")));
}

#[tokio::test]
async fn test_explicit_topic_beats_course_expansion() {
    let repo = seed_repo(&default_seeds()).await;
    let page = engine(repo)
        .recommend(&RecommendQuery {
            topic: Some("级数".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].bvid, "BV1b");
}

#[tokio::test]
async fn test_pagination_totals() {
    let repo = seed_repo(&default_seeds()).await;
    let eng = engine(repo);

    let first = eng
        .recommend(&RecommendQuery {
            page: 1,
            page_size: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.pages, 2);
    assert_eq!(first.items.len(), 2);

    let second = eng
        .recommend(&RecommendQuery {
            page: 2,
            page_size: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].bvid, "BV1b");

    // 越界页返回空列表但总数不变
    let beyond = eng
        .recommend(&RecommendQuery {
            page: 9,
            page_size: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 3);
}

#[tokio::test]
async fn test_page_size_clamped_to_max() {
    let repo = seed_repo(&default_seeds()).await;
    let page = engine(repo)
        .recommend(&RecommendQuery {
            page_size: 500,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.page_size, 50);
}

#[tokio::test]
async fn test_up_name_and_search_filters() {
    let repo = seed_repo(&default_seeds()).await;
    let eng = engine(repo);

    let by_up = eng
        .recommend(&RecommendQuery {
            up_name: Some("宋浩".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_up.total, 1);
    assert_eq!(by_up.items[0].bvid, "BV1a");

    let by_query = eng
        .recommend(&RecommendQuery {
            search_query: Some("本质".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_query.total, 1);
    assert_eq!(by_query.items[0].bvid, "BV1c");
}

#[tokio::test]
async fn test_facet_counts_include_unrecommended() {
    let repo = seed_repo(&default_seeds()).await;
    let eng = engine(repo);

    let topics = eng.topics().await.unwrap();
    let get = |name: &str| topics.iter().find(|(t, _)| t == name).map(|(_, n)| *n);
    assert_eq!(get("矩阵"), Some(1));
    assert_eq!(get("概率基础"), Some(1));

    let difficulties = eng.difficulties().await.unwrap();
    let entry = difficulties
        .iter()
        .find(|(d, _)| *d == Difficulty::Entry)
        .map(|(_, n)| *n);
    assert_eq!(entry, Some(2));
}
