// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::video::{Difficulty, Subject, VideoEnrichment, VideoRecord};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// 查询过滤条件
///
/// 过滤在仓储内完成，排序与分页由推荐引擎负责。
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// 学科过滤
    pub subject: Option<Subject>,
    /// 命中任一知识点即保留，空表示不过滤
    pub topics_any: Vec<String>,
    /// 难度过滤
    pub difficulty: Option<Difficulty>,
    /// UP 主名子串过滤
    pub up_name: Option<String>,
    /// 标题/UP 主/标签的子串检索，不区分大小写
    pub query: Option<String>,
    /// 仅保留达标（is_recommended）的记录
    pub recommended_only: bool,
}

/// 视频仓储抽象
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// 批量写入或更新基础记录，以 bvid 为主键
    async fn upsert_batch(&self, records: &[VideoRecord]) -> Result<(), RepositoryError>;

    /// 写入或更新衍生信息
    async fn upsert_enrichment(&self, enrichment: &VideoEnrichment)
        -> Result<(), RepositoryError>;

    /// 返回当前库中全部 bvid，供采集去重
    async fn existing_ids(&self) -> Result<HashSet<String>, RepositoryError>;

    /// 过滤后返回记录及其衍生信息
    async fn select(
        &self,
        filter: &VideoFilter,
    ) -> Result<Vec<(VideoRecord, Option<VideoEnrichment>)>, RepositoryError>;
}

#[async_trait]
impl<T: VideoRepository + ?Sized> VideoRepository for Arc<T> {
    async fn upsert_batch(&self, records: &[VideoRecord]) -> Result<(), RepositoryError> {
        (**self).upsert_batch(records).await
    }

    async fn upsert_enrichment(
        &self,
        enrichment: &VideoEnrichment,
    ) -> Result<(), RepositoryError> {
        (**self).upsert_enrichment(enrichment).await
    }

    async fn existing_ids(&self) -> Result<HashSet<String>, RepositoryError> {
        (**self).existing_ids().await
    }

    async fn select(
        &self,
        filter: &VideoFilter,
    ) -> Result<Vec<(VideoRecord, Option<VideoEnrichment>)>, RepositoryError> {
        (**self).select(filter).await
    }
}
