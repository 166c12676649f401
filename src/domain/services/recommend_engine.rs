// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 推荐引擎
//!
//! 过滤由仓储完成，排序/分页/并列裁决在此完成。
//! easy/medium/hard 是难度预设：解析为 hot 排序加对应难度过滤，
//! 调用方显式给出难度时以显式值为准。

use crate::config::settings::RecommendSettings;
use crate::domain::models::video::{Difficulty, Subject, VideoEnrichment, VideoRecord};
use crate::domain::repositories::{RepositoryError, VideoFilter, VideoRepository};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// 推荐策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// 按质量分降序
    Hot,
    /// 按收藏率（收藏/播放）降序
    Popular,
    /// 按发布时间降序
    Latest,
    /// 入门预设
    Easy,
    /// 进阶预设
    Medium,
    /// 高阶预设
    Hard,
}

impl FromStr for Strategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hot" => Ok(Strategy::Hot),
            "popular" => Ok(Strategy::Popular),
            "latest" => Ok(Strategy::Latest),
            "easy" => Ok(Strategy::Easy),
            "medium" => Ok(Strategy::Medium),
            "hard" => Ok(Strategy::Hard),
            _ => Err(()),
        }
    }
}

impl Strategy {
    /// 预设策略对应的难度
    fn preset_difficulty(&self) -> Option<Difficulty> {
        match self {
            Strategy::Easy => Some(Difficulty::Entry),
            Strategy::Medium => Some(Difficulty::Intermediate),
            Strategy::Hard => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

/// 推荐查询参数
#[derive(Debug, Clone)]
pub struct RecommendQuery {
    pub strategy: Strategy,
    /// 课程（科目）过滤
    pub course: Option<Subject>,
    /// 显式知识点过滤，给出时优先于课程展开
    pub topic: Option<String>,
    /// 显式难度过滤，优先于预设策略的难度
    pub difficulty: Option<Difficulty>,
    /// UP 主名子串过滤
    pub up_name: Option<String>,
    /// 标题检索
    pub search_query: Option<String>,
    /// 页码，从 1 开始
    pub page: u32,
    pub page_size: u32,
    /// 仅返回达标记录
    pub only_recommended: bool,
}

impl Default for RecommendQuery {
    fn default() -> Self {
        Self {
            strategy: Strategy::Hot,
            course: None,
            topic: None,
            difficulty: None,
            up_name: None,
            search_query: None,
            page: 1,
            page_size: 20,
            only_recommended: true,
        }
    }
}

impl RecommendQuery {
    /// 按配置中的默认分页大小构造查询
    pub fn with_settings(settings: &RecommendSettings) -> Self {
        Self {
            page_size: settings.default_page_size,
            ..Self::default()
        }
    }
}

/// 推荐结果中的单条视频
#[derive(Debug, Clone, Serialize)]
pub struct RecommendItem {
    pub bvid: String,
    pub title: String,
    pub url: String,
    pub up_name: String,
    pub up_mid: u64,
    pub up_face: String,
    pub pic_url: String,
    pub duration: u64,
    pub pubdate: Option<String>,
    pub view_count: u64,
    pub favorite_count: u64,
    pub quality_score: Option<f64>,
    pub subject: Option<String>,
    pub topics: Vec<String>,
    pub difficulty: Option<String>,
}

/// 分页后的推荐结果
#[derive(Debug, Clone, Serialize)]
pub struct RecommendPage {
    pub items: Vec<RecommendItem>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub pages: usize,
}

/// 预设策略解析：easy/medium/hard 映射为 hot 排序 + 预设难度；
/// 显式难度始终胜过预设难度
fn resolve_preset(
    strategy: Strategy,
    explicit: Option<Difficulty>,
) -> (Strategy, Option<Difficulty>) {
    match strategy.preset_difficulty() {
        Some(preset) => (Strategy::Hot, explicit.or(Some(preset))),
        None => (strategy, explicit),
    }
}

/// 推荐引擎
pub struct RecommendEngine<R> {
    repository: R,
    max_page_size: u32,
}

impl<R: VideoRepository> RecommendEngine<R> {
    pub fn new(repository: R, max_page_size: u32) -> Self {
        Self {
            repository,
            max_page_size,
        }
    }

    /// 执行一次推荐查询
    pub async fn recommend(&self, query: &RecommendQuery) -> Result<RecommendPage, RepositoryError> {
        let (strategy, difficulty) = resolve_preset(query.strategy, query.difficulty);

        let filter = self.build_filter(query, difficulty);
        let mut rows = self.repository.select(&filter).await?;

        Self::apply_strategy(&mut rows, strategy);

        let page = query.page.max(1);
        let page_size = query.page_size.clamp(1, self.max_page_size);
        let total = rows.len();
        let pages = total.div_ceil(page_size as usize);
        let offset = (page as usize - 1).saturating_mul(page_size as usize);

        let items: Vec<RecommendItem> = rows
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .map(|(record, enrichment)| Self::serialize(record, enrichment))
            .collect();

        debug!(
            strategy = ?strategy,
            total,
            page,
            returned = items.len(),
            "Recommend query completed"
        );

        Ok(RecommendPage {
            items,
            total,
            page,
            page_size,
            pages,
        })
    }

    /// 各知识点的视频数量，按数量降序
    pub async fn topics(&self) -> Result<Vec<(String, usize)>, RepositoryError> {
        let rows = self.repository.select(&VideoFilter::default()).await?;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for (_, enrichment) in rows {
            if let Some(e) = enrichment {
                for topic in e.topics {
                    *counts.entry(topic).or_default() += 1;
                }
            }
        }
        let mut out: Vec<(String, usize)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    /// 各难度的视频数量，按数量降序
    pub async fn difficulties(&self) -> Result<Vec<(Difficulty, usize)>, RepositoryError> {
        let rows = self.repository.select(&VideoFilter::default()).await?;
        let mut counts: BTreeMap<Difficulty, usize> = BTreeMap::new();
        for (_, enrichment) in rows {
            if let Some(e) = enrichment {
                *counts.entry(e.difficulty).or_default() += 1;
            }
        }
        let mut out: Vec<(Difficulty, usize)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(out)
    }

    fn build_filter(&self, query: &RecommendQuery, difficulty: Option<Difficulty>) -> VideoFilter {
        // 显式知识点过滤时不再展开课程的知识点集合
        let topics_any = match &query.topic {
            Some(topic) => vec![topic.clone()],
            None => query
                .course
                .map(|c| Self::course_topics(c))
                .unwrap_or_default(),
        };

        let search = query
            .search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        VideoFilter {
            subject: query.course,
            topics_any,
            difficulty,
            up_name: query
                .up_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            query: search,
            recommended_only: query.only_recommended,
        }
    }

    /// 课程对应的知识点集合
    fn course_topics(course: Subject) -> Vec<String> {
        let topics: &[&str] = match course {
            Subject::Calculus => &[
                "极限与连续",
                "导数与微分",
                "积分",
                "微分方程",
                "级数",
                "多元函数",
            ],
            Subject::LinearAlgebra => &["行列式", "矩阵", "向量", "线性方程组", "特征值"],
            Subject::Probability => &["概率基础", "随机变量", "数理统计"],
        };
        topics.iter().map(|t| (*t).to_string()).collect()
    }

    /// 排序：主键按策略，并列先比播放量降序再比 bvid 升序
    fn apply_strategy(rows: &mut [(VideoRecord, Option<VideoEnrichment>)], strategy: Strategy) {
        let tiebreak = |a: &(VideoRecord, Option<VideoEnrichment>),
                        b: &(VideoRecord, Option<VideoEnrichment>)| {
            b.0.view_count
                .cmp(&a.0.view_count)
                .then_with(|| a.0.bvid.cmp(&b.0.bvid))
        };

        match strategy {
            Strategy::Popular => {
                rows.sort_by(|a, b| {
                    let rate = |r: &VideoRecord| {
                        r.favorite_count as f64 / r.view_count.max(1) as f64
                    };
                    rate(&b.0)
                        .partial_cmp(&rate(&a.0))
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| tiebreak(a, b))
                });
            }
            Strategy::Latest => {
                rows.sort_by(|a, b| b.0.pubdate.cmp(&a.0.pubdate).then_with(|| tiebreak(a, b)));
            }
            // hot 及已解析的难度预设都按质量分降序
            _ => {
                rows.sort_by(|a, b| {
                    let score = |e: &Option<VideoEnrichment>| {
                        e.as_ref().map(|x| x.quality_score).unwrap_or(0.0)
                    };
                    score(&b.1)
                        .partial_cmp(&score(&a.1))
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| tiebreak(a, b))
                });
            }
        }
    }

    fn serialize(record: VideoRecord, enrichment: Option<VideoEnrichment>) -> RecommendItem {
        RecommendItem {
            bvid: record.bvid,
            title: record.title,
            url: record.url,
            up_name: record.up_name,
            up_mid: record.up_mid,
            up_face: record.up_face,
            pic_url: record.pic_url,
            duration: record.duration,
            pubdate: record.pubdate.map(|d| d.to_rfc3339()),
            view_count: record.view_count,
            favorite_count: record.favorite_count,
            quality_score: enrichment.as_ref().map(|e| e.quality_score),
            subject: enrichment
                .as_ref()
                .and_then(|e| e.subject)
                .map(|s| s.name().to_string()),
            topics: enrichment.as_ref().map(|e| e.topics.clone()).unwrap_or_default(),
            difficulty: enrichment.as_ref().map(|e| e.difficulty.name().to_string()),
        }
    }
}
