// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内存视频仓储
//!
//! 以 bvid 为键的两张哈希表，upsert 整体覆盖。select 负责全部
//! 过滤逻辑，排序与分页交给上层推荐引擎。

use crate::domain::models::video::{Subject, VideoEnrichment, VideoRecord};
use crate::domain::repositories::{RepositoryError, VideoFilter, VideoRepository};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// 内存实现，适合单进程部署与测试
#[derive(Debug, Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<String, VideoRecord>>,
    enrichments: RwLock<HashMap<String, VideoEnrichment>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前记录总数
    pub fn len(&self) -> usize {
        self.videos.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.read().is_empty()
    }

    /// 基础有效性过滤：bvid 与标题非空、播放量大于零、
    /// 且已有科目归属的衍生记录
    fn passes_base(record: &VideoRecord, enrichment: Option<&VideoEnrichment>) -> bool {
        if record.bvid.is_empty() || record.title.is_empty() || record.view_count == 0 {
            return false;
        }
        matches!(enrichment, Some(e) if e.subject.is_some())
    }

    fn passes_filter(
        filter: &VideoFilter,
        record: &VideoRecord,
        enrichment: Option<&VideoEnrichment>,
    ) -> bool {
        if !Self::passes_base(record, enrichment) {
            return false;
        }
        // passes_base 保证了衍生记录存在
        let Some(e) = enrichment else {
            return false;
        };

        if filter.recommended_only && !e.is_recommended {
            return false;
        }

        if let Some(subject) = filter.subject {
            if e.subject != Some(subject) {
                return false;
            }
        }

        // 知识点按子串匹配，"方程" 可命中 "微分方程"
        if !filter.topics_any.is_empty()
            && !filter
                .topics_any
                .iter()
                .any(|t| e.topics.iter().any(|et| et.contains(t.as_str())))
        {
            return false;
        }

        if let Some(difficulty) = filter.difficulty {
            if e.difficulty != difficulty {
                return false;
            }
        }

        if let Some(up_name) = &filter.up_name {
            if !record.up_name.contains(up_name.as_str()) {
                return false;
            }
        }

        // 全文检索只作用于标题
        if let Some(query) = &filter.query {
            let q = query.to_lowercase();
            if !record.title.to_lowercase().contains(&q) {
                return false;
            }
        }

        true
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn upsert_batch(&self, records: &[VideoRecord]) -> Result<(), RepositoryError> {
        let mut videos = self.videos.write();
        for record in records {
            if record.bvid.is_empty() {
                continue;
            }
            let mut incoming = record.clone();
            // 分区名为遗留字段，保留首个非空值
            if incoming.bili_tname.is_empty() {
                if let Some(existing) = videos.get(&incoming.bvid) {
                    incoming.bili_tname = existing.bili_tname.clone();
                }
            }
            videos.insert(incoming.bvid.clone(), incoming);
        }
        Ok(())
    }

    async fn upsert_enrichment(
        &self,
        enrichment: &VideoEnrichment,
    ) -> Result<(), RepositoryError> {
        if enrichment.bvid.is_empty() {
            return Ok(());
        }
        self.enrichments
            .write()
            .insert(enrichment.bvid.clone(), enrichment.clone());
        Ok(())
    }

    async fn existing_ids(&self) -> Result<HashSet<String>, RepositoryError> {
        Ok(self.videos.read().keys().cloned().collect())
    }

    async fn select(
        &self,
        filter: &VideoFilter,
    ) -> Result<Vec<(VideoRecord, Option<VideoEnrichment>)>, RepositoryError> {
        let videos = self.videos.read();
        let enrichments = self.enrichments.read();

        Ok(videos
            .values()
            .filter_map(|record| {
                let enrichment = enrichments.get(&record.bvid);
                if Self::passes_filter(filter, record, enrichment) {
                    Some((record.clone(), enrichment.cloned()))
                } else {
                    None
                }
            })
            .collect())
    }
}
