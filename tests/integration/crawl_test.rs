// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 采集管线集成测试
//!
//! 用内存数据源与内存仓储驱动完整采集流程，验证去重、详情缓存、
//! 标签合并、分类评分入库与取消语义。

use async_trait::async_trait;
use bilicrawl::config::settings::CrawlerSettings;
use bilicrawl::domain::models::crawl_run::{CrawlOptions, CrawlTask, RunStatus};
use bilicrawl::domain::models::source_item::{SearchItem, VideoDetail};
use bilicrawl::domain::models::video::{Subject, VideoRecord};
use bilicrawl::domain::repositories::{VideoFilter, VideoRepository};
use bilicrawl::domain::services::topic_classifier::TopicClassifier;
use bilicrawl::domain::source::{SourceError, VideoSource};
use bilicrawl::infrastructure::repositories::InMemoryVideoRepository;
use bilicrawl::workers::crawl_worker::{CrawlError, CrawlWorker, ProgressFn};
use bilicrawl::workers::RunRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 测试用内存数据源
///
/// 页数据按 (keyword, page) 预置，详情调用计数用于验证缓存。
#[derive(Default)]
struct MockSource {
    pages: Mutex<HashMap<(String, u32), Vec<SearchItem>>>,
    failing_pages: Mutex<HashMap<(String, u32), usize>>,
    detail_calls: AtomicUsize,
    tag_calls: AtomicUsize,
    signing: AtomicBool,
}

impl MockSource {
    fn new() -> Self {
        let source = Self::default();
        source.signing.store(true, Ordering::Relaxed);
        source
    }

    fn with_page(self, keyword: &str, page: u32, items: Vec<SearchItem>) -> Self {
        self.pages
            .lock()
            .insert((keyword.to_string(), page), items);
        self
    }

    /// 指定页前 n 次调用返回传输错误
    fn with_failing_page(self, keyword: &str, page: u32, failures: usize) -> Self {
        self.failing_pages
            .lock()
            .insert((keyword.to_string(), page), failures);
        self
    }

    fn without_signing(self) -> Self {
        self.signing.store(false, Ordering::Relaxed);
        self
    }
}

fn item(bvid: &str, title: &str) -> SearchItem {
    SearchItem {
        bvid: bvid.to_string(),
        title: title.to_string(),
        author: "测试UP".to_string(),
        play: 1000,
        duration: "10:00".to_string(),
        ..Default::default()
    }
}

#[async_trait]
impl VideoSource for MockSource {
    async fn search(
        &self,
        keyword: &str,
        page: u32,
        _page_size: u32,
        _order: &str,
    ) -> Result<Vec<SearchItem>, SourceError> {
        let key = (keyword.to_string(), page);

        let mut failing = self.failing_pages.lock();
        if let Some(remaining) = failing.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SourceError::Transport("connection reset".to_string()));
            }
        }
        drop(failing);

        Ok(self.pages.lock().get(&key).cloned().unwrap_or_default())
    }

    async fn detail(&self, bvid: &str) -> Result<VideoDetail, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::Relaxed);
        let mut detail = VideoDetail {
            bvid: bvid.to_string(),
            title: format!("{} 详情标题 导数入门", bvid),
            desc: "高等数学新手教程".to_string(),
            duration: 600,
            pubdate: 1_700_000_000,
            ..Default::default()
        };
        detail.owner.name = "宋浩老师官方".to_string();
        detail.owner.mid = 42;
        detail.stat.view = 100_000;
        detail.stat.favorite = 2_000;
        detail.stat.like = 5_000;
        detail.stat.coin = 1_000;
        Ok(detail)
    }

    async fn tags(&self, bvid: &str) -> Result<Vec<String>, SourceError> {
        self.tag_calls.fetch_add(1, Ordering::Relaxed);
        Ok(vec!["考研".to_string(), format!("tag-{}", bvid)])
    }

    async fn signing_ready(&self) -> bool {
        self.signing.load(Ordering::Relaxed)
    }
}

fn test_settings() -> CrawlerSettings {
    CrawlerSettings {
        max_pages: 15,
        page_size: 20,
        order: "click".to_string(),
        page_delay_min_ms: 0,
        page_delay_max_ms: 0,
        detail_delay_min_ms: 0,
        detail_delay_max_ms: 0,
        error_cooldown_secs: 0,
    }
}

fn capture_progress() -> (ProgressFn, Arc<Mutex<Vec<(u64, u64, String)>>>) {
    let log: Arc<Mutex<Vec<(u64, u64, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let progress: ProgressFn = Arc::new(move |done, total, message| {
        sink.lock().push((done, total, message));
    });
    (progress, log)
}

#[tokio::test]
async fn test_end_to_end_single_page() {
    let source = Arc::new(
        MockSource::new().with_page(
            "导数",
            1,
            vec![item("BV1new", "导数入门"), item("BV1old", "旧视频")],
        ),
    );
    let repo = Arc::new(InMemoryVideoRepository::new());

    // 预置一条已存在记录
    repo.upsert_batch(&[VideoRecord {
        bvid: "BV1old".to_string(),
        title: "旧视频".to_string(),
        view_count: 1,
        ..Default::default()
    }])
    .await
    .unwrap();

    let (progress, log) = capture_progress();
    let worker = CrawlWorker::new(
        source.clone(),
        repo.clone(),
        TopicClassifier::new(),
        test_settings(),
    )
    .with_progress(progress);

    let options = CrawlOptions {
        max_pages: 1,
        ..Default::default()
    };
    let (records, summary) = worker
        .run(&[CrawlTask::new("导数")], &options)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].bvid, "BV1new");
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.pages_fetched, 1);

    // 已存在的视频不触发详情请求
    assert_eq!(source.detail_calls.load(Ordering::Relaxed), 1);
    assert_eq!(source.tag_calls.load(Ordering::Relaxed), 1);

    // 详情优先的规范化与标签合并
    let record = &records[0];
    assert_eq!(record.up_name, "宋浩老师官方");
    assert_eq!(record.view_count, 100_000);
    assert!(record.tags.starts_with("考研,tag-BV1new"));
    assert_eq!(record.source_keyword, "导数");

    // 入库后可按科目查出，且被分类评分
    let rows = repo
        .select(&VideoFilter {
            subject: Some(Subject::Calculus),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let enrichment = rows[0].1.as_ref().unwrap();
    assert!(enrichment.topics.contains(&"导数与微分".to_string()));
    assert!(enrichment.quality_score > 0.0);

    // 终态进度为 (1, 1)
    let entries = log.lock();
    let last = entries.last().unwrap();
    assert_eq!((last.0, last.1), (1, 1));
    assert!(last.2.contains("第1页"), "message = {}", last.2);
    assert!(last.2.contains("新增1条"), "message = {}", last.2);
    assert!(last.2.contains("跳过1条"), "message = {}", last.2);
}

#[tokio::test]
async fn test_duplicate_within_run_counted_once() {
    // 两个关键词命中同一视频
    let source = Arc::new(
        MockSource::new()
            .with_page("极限", 1, vec![item("BV1dup", "极限入门")])
            .with_page("洛必达", 1, vec![item("BV1dup", "极限入门")]),
    );
    let repo = Arc::new(InMemoryVideoRepository::new());

    let worker = CrawlWorker::new(
        source.clone(),
        repo.clone(),
        TopicClassifier::new(),
        test_settings(),
    );
    let options = CrawlOptions {
        max_pages: 1,
        ..Default::default()
    };
    let (records, summary) = worker
        .run(
            &[CrawlTask::new("极限"), CrawlTask::new("洛必达")],
            &options,
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(source.detail_calls.load(Ordering::Relaxed), 1);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn test_signing_unavailable_aborts_run() {
    let source = Arc::new(MockSource::new().without_signing());
    let repo = Arc::new(InMemoryVideoRepository::new());

    let (progress, log) = capture_progress();
    let worker = CrawlWorker::new(source, repo, TopicClassifier::new(), test_settings())
        .with_progress(progress);

    let err = worker
        .run(&[CrawlTask::new("导数")], &CrawlOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::SigningUnavailable));
    assert!(log.lock().iter().any(|(_, _, m)| m.contains("WBI")));
}

#[tokio::test]
async fn test_page_failure_cools_down_and_continues() {
    let source = Arc::new(
        MockSource::new()
            .with_failing_page("积分", 1, 1)
            .with_page("积分", 2, vec![item("BV1ok", "定积分精讲")]),
    );
    let repo = Arc::new(InMemoryVideoRepository::new());

    let worker = CrawlWorker::new(
        source,
        repo.clone(),
        TopicClassifier::new(),
        test_settings(),
    );
    let options = CrawlOptions {
        max_pages: 2,
        ..Default::default()
    };
    let (records, summary) = worker
        .run(&[CrawlTask::new("积分")], &options)
        .await
        .unwrap();

    // 第 1 页失败被跳过，第 2 页照常采集
    assert_eq!(records.len(), 1);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn test_cancellation_stops_before_next_page() {
    let source = Arc::new(MockSource::new().with_page("级数", 1, vec![item("BV1", "级数")]));
    let repo = Arc::new(InMemoryVideoRepository::new());

    let cancel = Arc::new(AtomicBool::new(true));
    let worker = CrawlWorker::new(
        source.clone(),
        repo.clone(),
        TopicClassifier::new(),
        test_settings(),
    )
    .with_cancel(cancel);

    let (records, summary) = worker
        .run(&[CrawlTask::new("级数")], &CrawlOptions::default())
        .await
        .unwrap();

    // 取消在首个页边界生效，没有任何抓取发生
    assert!(records.is_empty());
    assert_eq!(summary.pages_fetched, 0);
    assert_eq!(source.detail_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_zero_configured_max_pages_still_crawls_one_page() {
    let source = Arc::new(MockSource::new().with_page("行列式", 1, vec![item("BV1z", "行列式")]));
    let repo = Arc::new(InMemoryVideoRepository::new());

    let mut settings = test_settings();
    settings.max_pages = 0;
    let worker = CrawlWorker::new(source, repo.clone(), TopicClassifier::new(), settings);

    let options = CrawlOptions {
        max_pages: 5,
        ..Default::default()
    };
    let (records, summary) = worker
        .run(&[CrawlTask::new("行列式")], &options)
        .await
        .unwrap();

    // 页上限保底为 1，不会恐慌也不会多翻页
    assert_eq!(records.len(), 1);
    assert_eq!(summary.pages_fetched, 1);
}

#[tokio::test]
async fn test_registry_lifecycle() {
    let source = Arc::new(MockSource::new().with_page("矩阵", 1, vec![item("BV1m", "矩阵入门")]));
    let repo = Arc::new(InMemoryVideoRepository::new());
    let registry = RunRegistry::new();

    let options = CrawlOptions {
        max_pages: 1,
        ..Default::default()
    };
    let id = registry.submit(
        source,
        repo.clone(),
        TopicClassifier::new(),
        test_settings(),
        vec![CrawlTask::new("矩阵")],
        options,
    );

    // 后台任务尚未调度时状态为 pending
    let first = registry.snapshot(&id).expect("run should exist");
    assert_eq!(first.status, RunStatus::Pending);

    // 等待后台任务进入终态
    let mut waited = 0;
    loop {
        let snapshot = registry.snapshot(&id).expect("run should exist");
        if snapshot.status.is_terminal() {
            break;
        }
        waited += 1;
        assert!(waited < 100, "run did not finish in time");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let result = registry.take_result(&id).expect("terminal result");
    assert_eq!(result.summary.as_ref().unwrap().new_records, 1);
    assert!(result.finished_at.is_some());
    assert_eq!(repo.len(), 1);

    // 结果一次性取走后条目销毁
    assert!(registry.snapshot(&id).is_none());
    assert!(registry.take_result(&id).is_none());
    assert!(registry.is_empty());
}
