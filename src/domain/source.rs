// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::source_item::{SearchItem, VideoDetail};
use async_trait::async_trait;
use std::sync::Arc;

/// 数据源访问错误
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 网络层错误（连接失败、超时、重试耗尽后的 5xx）
    #[error("Transport error: {0}")]
    Transport(String),

    /// 触发频率限制且重试耗尽
    #[error("Rate limited by upstream")]
    RateLimited,

    /// 上游业务错误（HTTP 200 但响应 code 非 0）
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// 响应体无法按预期结构解析
    #[error("Decode error: {0}")]
    Decode(String),

    /// 签名密钥不可用，无法发起需签名的请求
    #[error("WBI signing keys unavailable")]
    SigningUnavailable,
}

/// 视频数据源抽象
///
/// 采集端只依赖该 trait，便于测试时以内存实现替换真实 HTTP 客户端。
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// 按关键词检索视频，page 从 1 开始，空页返回空向量
    async fn search(
        &self,
        keyword: &str,
        page: u32,
        page_size: u32,
        order: &str,
    ) -> Result<Vec<SearchItem>, SourceError>;

    /// 拉取单条视频的完整详情
    async fn detail(&self, bvid: &str) -> Result<VideoDetail, SourceError>;

    /// 拉取视频的标签名列表
    async fn tags(&self, bvid: &str) -> Result<Vec<String>, SourceError>;

    /// 签名密钥是否已就绪
    async fn signing_ready(&self) -> bool;
}

#[async_trait]
impl<T: VideoSource + ?Sized> VideoSource for Arc<T> {
    async fn search(
        &self,
        keyword: &str,
        page: u32,
        page_size: u32,
        order: &str,
    ) -> Result<Vec<SearchItem>, SourceError> {
        (**self).search(keyword, page, page_size, order).await
    }

    async fn detail(&self, bvid: &str) -> Result<VideoDetail, SourceError> {
        (**self).detail(bvid).await
    }

    async fn tags(&self, bvid: &str) -> Result<Vec<String>, SourceError> {
        (**self).tags(bvid).await
    }

    async fn signing_ready(&self) -> bool {
        (**self).signing_ready().await
    }
}
