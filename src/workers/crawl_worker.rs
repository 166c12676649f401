// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 采集工作器
//!
//! 单次运行的编排器：按任务与页两层循环搜索，逐条补详情与标签，
//! 规范化后分类评分并批量入库。实例持有本次运行的详情/标签缓存
//! 与去重集合，run 消费自身，不跨运行复用。

use crate::config::settings::CrawlerSettings;
use crate::domain::models::crawl_run::{CrawlOptions, CrawlSummary, CrawlTask};
use crate::domain::models::source_item::{SearchItem, VideoDetail};
use crate::domain::models::video::{VideoEnrichment, VideoRecord};
use crate::domain::repositories::{RepositoryError, VideoRepository};
use crate::domain::services::quality_scorer::QualityScorer;
use crate::domain::services::topic_classifier::ClassifierStrategy;
use crate::domain::source::{SourceError, VideoSource};
use crate::utils::parsers::{
    build_video_url, clean_html, normalize_media_url, parse_duration, parse_timestamp,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// 进度回调 (done, total, message)
pub type ProgressFn = Arc<dyn Fn(u64, u64, String) + Send + Sync>;

/// 采集运行错误
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// 签名密钥不可用，整次运行无法开始
    #[error("WBI signing unavailable, check cookie configuration")]
    SigningUnavailable,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 在闭区间内均匀采样延迟，min>=max 时直接取 min
pub fn sample_delay(min_ms: u64, max_ms: u64) -> Duration {
    let ms = if min_ms >= max_ms {
        min_ms
    } else {
        rand::random_range(min_ms..=max_ms)
    };
    Duration::from_millis(ms)
}

/// 采集工作器，一个实例对应一次运行
pub struct CrawlWorker<S, R, C> {
    source: S,
    repository: R,
    classifier: C,
    scorer: QualityScorer,
    settings: CrawlerSettings,
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressFn>,
    detail_cache: HashMap<String, Option<VideoDetail>>,
    tag_cache: HashMap<String, Vec<String>>,
    seen_in_run: HashSet<String>,
}

impl<S, R, C> CrawlWorker<S, R, C>
where
    S: VideoSource,
    R: VideoRepository,
    C: ClassifierStrategy,
{
    pub fn new(source: S, repository: R, classifier: C, settings: CrawlerSettings) -> Self {
        Self {
            source,
            repository,
            classifier,
            scorer: QualityScorer::new(),
            settings,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
            detail_cache: HashMap::new(),
            tag_cache: HashMap::new(),
            seen_in_run: HashSet::new(),
        }
    }

    /// 注入取消标志，置位后在页边界与任务边界停止
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// 注入进度回调
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, done: u64, total: u64, message: String) {
        if let Some(cb) = &self.progress {
            cb(done, total, message);
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// 执行一次完整采集，返回本次新增的记录与汇总
    pub async fn run(
        mut self,
        tasks: &[CrawlTask],
        options: &CrawlOptions,
    ) -> Result<(Vec<VideoRecord>, CrawlSummary), CrawlError> {
        // 先取配置上限再保底 1 页，配置为 0 时不会恐慌
        let max_pages = options.max_pages.min(self.settings.max_pages).max(1);

        if !self.source.signing_ready().await {
            self.report(0, 1, "WBI 初始化失败，请检查 Cookie 配置".to_string());
            return Err(CrawlError::SigningUnavailable);
        }

        // 已入库的 bvid 快照，整次运行内保持不变
        let existing = if options.skip_existing && options.save {
            self.repository.existing_ids().await?
        } else {
            HashSet::new()
        };
        if !existing.is_empty() {
            self.report(0, 1, format!("已加载 {} 条已采集视频", existing.len()));
        }

        let total_steps = tasks.len() as u64 * max_pages as u64;
        let mut steps_done: u64 = 0;
        let mut all_results: Vec<VideoRecord> = Vec::new();
        let mut summary = CrawlSummary::default();

        info!(tasks = tasks.len(), max_pages, "Crawl run started");

        'tasks: for task in tasks {
            let keyword = task.keyword.trim();
            if keyword.is_empty() {
                steps_done += max_pages as u64;
                continue;
            }

            self.report(steps_done, total_steps, format!("抓取: {}", keyword));

            for page in 1..=max_pages {
                if self.cancelled() {
                    info!("Crawl run cancelled");
                    break 'tasks;
                }

                match self.crawl_page(keyword, page, options, &existing).await {
                    Ok(Some((batch, skipped))) => {
                        summary.pages_fetched += 1;
                        summary.new_records += batch.len() as u64;
                        summary.skipped += skipped;

                        if options.save {
                            self.persist(&batch).await;
                        }

                        steps_done += 1;
                        let skip_msg = if skipped > 0 {
                            format!("（跳过{}条）", skipped)
                        } else {
                            String::new()
                        };
                        self.report(
                            steps_done,
                            total_steps,
                            format!("{} 第{}页，新增{}条{}", keyword, page, batch.len(), skip_msg),
                        );
                        all_results.extend(batch);
                    }
                    // 空页：该关键词已翻完，剩余页直接计入进度
                    Ok(None) => {
                        summary.pages_fetched += 1;
                        steps_done += max_pages as u64 - page as u64 + 1;
                        break;
                    }
                    Err(e) => {
                        steps_done += 1;
                        warn!(keyword, page, error = %e, "Page failed, cooling down");
                        self.report(
                            steps_done,
                            total_steps,
                            format!("  第{}页异常: {}", page, e),
                        );
                        sleep(Duration::from_secs(self.settings.error_cooldown_secs)).await;
                    }
                }
            }

            if self.cancelled() {
                break;
            }
        }

        info!(
            new_records = summary.new_records,
            skipped = summary.skipped,
            pages = summary.pages_fetched,
            "Crawl run finished"
        );

        Ok((all_results, summary))
    }

    /// 抓取单页，返回 None 表示空页（该关键词翻页结束）
    async fn crawl_page(
        &mut self,
        keyword: &str,
        page: u32,
        options: &CrawlOptions,
        existing: &HashSet<String>,
    ) -> Result<Option<(Vec<VideoRecord>, u64)>, SourceError> {
        sleep(sample_delay(
            self.settings.page_delay_min_ms,
            self.settings.page_delay_max_ms,
        ))
        .await;

        let items = self
            .source
            .search(keyword, page, self.settings.page_size, &self.settings.order)
            .await?;
        if items.is_empty() {
            return Ok(None);
        }

        let mut batch: Vec<VideoRecord> = Vec::new();
        let mut skipped: u64 = 0;

        for item in items {
            let bvid = item.bvid.clone();
            if bvid.is_empty() || self.seen_in_run.contains(&bvid) {
                continue;
            }
            if existing.contains(&bvid) {
                skipped += 1;
                continue;
            }
            self.seen_in_run.insert(bvid.clone());

            let detail = if options.fetch_detail {
                self.cached_detail(&bvid).await
            } else {
                None
            };

            let mut record = normalize(detail.as_ref(), &item, keyword);

            let tags = if options.fetch_tags {
                self.cached_tags(&bvid).await
            } else {
                Vec::new()
            };
            record.tags = merge_tags(&tags);

            // 轻量智能分类：把首个命中的知识点补进标签
            let classify_tags = format!("{} {}", record.tags, keyword);
            let predicted = self
                .classifier
                .classify(&record.title, &classify_tags, &record.desc);
            if let Some(first) = predicted.topics.first() {
                if !record.tags.contains(first.as_str()) {
                    if record.tags.is_empty() {
                        record.tags = first.clone();
                    } else {
                        record.tags = format!("{},{}", record.tags, first);
                    }
                }
            }

            batch.push(record);
        }

        Ok(Some((batch, skipped)))
    }

    /// 详情缓存式获取：未命中时先延迟再请求，失败缓存 None
    async fn cached_detail(&mut self, bvid: &str) -> Option<VideoDetail> {
        if let Some(cached) = self.detail_cache.get(bvid) {
            return cached.clone();
        }
        sleep(sample_delay(
            self.settings.detail_delay_min_ms,
            self.settings.detail_delay_max_ms,
        ))
        .await;

        let fetched = match self.source.detail(bvid).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(bvid, error = %e, "Detail fetch failed");
                None
            }
        };
        self.detail_cache.insert(bvid.to_string(), fetched.clone());
        fetched
    }

    /// 标签缓存式获取，失败缓存空列表
    async fn cached_tags(&mut self, bvid: &str) -> Vec<String> {
        if let Some(cached) = self.tag_cache.get(bvid) {
            return cached.clone();
        }
        sleep(sample_delay(
            self.settings.detail_delay_min_ms,
            self.settings.detail_delay_max_ms,
        ))
        .await;

        let fetched = match self.source.tags(bvid).await {
            Ok(tags) => tags,
            Err(e) => {
                warn!(bvid, error = %e, "Tag fetch failed");
                Vec::new()
            }
        };
        self.tag_cache.insert(bvid.to_string(), fetched.clone());
        fetched
    }

    /// 批量入库并重算衍生信息，存储失败只记日志不中断运行
    async fn persist(&self, batch: &[VideoRecord]) {
        if batch.is_empty() {
            return;
        }

        if let Err(e) = self.repository.upsert_batch(batch).await {
            warn!(error = %e, count = batch.len(), "Batch upsert failed");
            return;
        }

        for record in batch {
            let classification =
                self.classifier
                    .classify(&record.title, &record.tags, &record.desc);
            let score = self.scorer.score(record);
            let enrichment = VideoEnrichment {
                bvid: record.bvid.clone(),
                subject: classification.subject,
                topics: classification.topics,
                difficulty: classification.difficulty,
                quality_score: score,
                is_recommended: QualityScorer::is_recommended(score),
                updated_at: Utc::now(),
            };
            if let Err(e) = self.repository.upsert_enrichment(&enrichment).await {
                warn!(bvid = %record.bvid, error = %e, "Enrichment upsert failed");
            }
        }
    }
}

/// 规范化：详情数据优先，搜索结果兜底
fn normalize(detail: Option<&VideoDetail>, item: &SearchItem, keyword: &str) -> VideoRecord {
    let d = detail.cloned().unwrap_or_default();

    let bvid = if !d.bvid.is_empty() {
        d.bvid.clone()
    } else {
        item.bvid.clone()
    };

    let pick_str = |a: &str, b: &str| {
        if !a.is_empty() {
            a.to_string()
        } else {
            b.to_string()
        }
    };
    let pick_num = |a: u64, b: u64| if a > 0 { a } else { b };

    let duration = pick_num(d.duration, parse_duration(&item.duration));
    let pubdate_ts = pick_num(d.pubdate, item.pubdate);

    VideoRecord {
        url: build_video_url(&bvid),
        aid: pick_num(d.aid, item.aid),
        title: clean_html(&pick_str(&d.title, &item.title)),
        desc: d.desc.trim().to_string(),
        up_name: pick_str(&d.owner.name, item.author.trim()),
        up_mid: pick_num(d.owner.mid, item.mid),
        up_face: pick_str(&d.owner.face, &item.upic),
        pic_url: pick_str(&d.pic, &normalize_media_url(&item.pic)),
        view_count: pick_num(d.stat.view, item.play),
        danmaku_count: pick_num(d.stat.danmaku, item.video_review),
        reply_count: pick_num(d.stat.reply, item.review),
        favorite_count: pick_num(d.stat.favorite, item.favorites),
        like_count: d.stat.like,
        coin_count: d.stat.coin,
        share_count: d.stat.share,
        duration,
        pubdate: parse_timestamp(pubdate_ts),
        tags: String::new(),
        bili_tid: pick_num(d.tid, item.typeid),
        bili_tname: pick_str(&d.tname, &item.typename),
        source_keyword: keyword.to_string(),
        crawl_time: Utc::now(),
        bvid,
    }
}

/// 合并标签：去空白、按出现顺序去重、逗号连接
fn merge_tags(tags: &[String]) -> String {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(t.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}
