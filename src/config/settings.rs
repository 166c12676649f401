// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含上游 API、采集器和推荐引擎的所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 上游 API 配置
    pub api: ApiSettings,
    /// 采集器配置
    pub crawler: CrawlerSettings,
    /// 推荐引擎配置
    pub recommend: RecommendSettings,
}

/// 上游 API 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// API 基础地址
    pub base_url: String,
    /// Cookie（SESSDATA 等，未登录时部分接口会被风控）
    pub cookie: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// User-Agent 请求头
    pub user_agent: String,
    /// 瞬时故障的最大重试次数
    pub max_retries: u32,
}

/// 采集器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 每个关键词最大采集页数
    pub max_pages: u32,
    /// 搜索接口单页条数
    pub page_size: u32,
    /// 搜索排序方式（click/pubdate/dm 等）
    pub order: String,
    /// 页级请求前随机延迟下界（毫秒）
    pub page_delay_min_ms: u64,
    /// 页级请求前随机延迟上界（毫秒）
    pub page_delay_max_ms: u64,
    /// 详情/标签请求前随机延迟下界（毫秒）
    pub detail_delay_min_ms: u64,
    /// 详情/标签请求前随机延迟上界（毫秒）
    pub detail_delay_max_ms: u64,
    /// 单页异常后的冷却时间（秒）
    pub error_cooldown_secs: u64,
}

/// 推荐引擎配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendSettings {
    /// 默认分页大小
    pub default_page_size: u32,
    /// 最大分页大小
    pub max_page_size: u32,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default API settings
            .set_default("api.base_url", "https://api.bilibili.com")?
            .set_default("api.cookie", "")?
            .set_default("api.timeout_secs", 15)?
            .set_default(
                "api.user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36",
            )?
            .set_default("api.max_retries", 5)?
            // Default crawler settings
            .set_default("crawler.max_pages", 15)?
            .set_default("crawler.page_size", 20)?
            .set_default("crawler.order", "click")?
            .set_default("crawler.page_delay_min_ms", 1800)?
            .set_default("crawler.page_delay_max_ms", 3500)?
            .set_default("crawler.detail_delay_min_ms", 400)?
            .set_default("crawler.detail_delay_max_ms", 900)?
            .set_default("crawler.error_cooldown_secs", 5)?
            // Default recommend settings
            .set_default("recommend.default_page_size", 20)?
            .set_default("recommend.max_page_size", 50)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("BILICRAWL").separator("__"));

        builder.build()?.try_deserialize()
    }
}
