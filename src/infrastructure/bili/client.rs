// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! B 站开放接口客户端
//!
//! 负责网络请求、信封解包与 WBI 签名。429/5xx 做带退避的温和
//! 重试并尊重 Retry-After；业务错误（code 非 0）不重试。

use crate::config::settings::ApiSettings;
use crate::domain::models::source_item::{SearchItem, VideoDetail};
use crate::domain::source::{SourceError, VideoSource};
use crate::infrastructure::bili::wbi;
use crate::utils::retry_policy::{is_retryable_status, RetryPolicy};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const NAV_PATH: &str = "/x/web-interface/nav";
const SEARCH_PATH: &str = "/x/web-interface/wbi/search/type";
const VIEW_PATH: &str = "/x/web-interface/view";
const TAG_PATH: &str = "/x/web-interface/view/detail/tag";

/// 响应体截断长度，用于错误信息
const SNIPPET_LEN: usize = 200;

/// 统一响应信封
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

/// B 站 API 客户端
pub struct BiliClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    mixin_key: RwLock<Option<String>>,
}

impl BiliClient {
    /// 按配置构造客户端，签名密钥延迟到首次需要时初始化
    pub fn new(settings: &ApiSettings) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://www.bilibili.com/"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        let cookie = settings.cookie.trim();
        if !cookie.is_empty() {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| SourceError::Transport(format!("Invalid cookie header: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::with_max_retries(settings.max_retries),
            mixin_key: RwLock::new(None),
        })
    }

    /// 确保签名密钥已初始化，失败时保持未就绪状态
    async fn ensure_signing(&self) -> bool {
        if self.mixin_key.read().is_some() {
            return true;
        }

        match self.fetch_mixin_key().await {
            Ok(Some(key)) => {
                *self.mixin_key.write() = Some(key);
                debug!("WBI signing keys initialized");
                true
            }
            Ok(None) => {
                warn!("WBI key material too short, signing disabled");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to initialize WBI signing keys");
                false
            }
        }
    }

    /// 拉取 nav 接口并派生 mixin key
    async fn fetch_mixin_key(&self) -> Result<Option<String>, SourceError> {
        let data = self.request_data(NAV_PATH, &[]).await?;
        let wbi_img = data.get("wbi_img").cloned().unwrap_or(Value::Null);
        let img_url = wbi_img
            .get("img_url")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let sub_url = wbi_img
            .get("sub_url")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(wbi::mixin_key(img_url, sub_url))
    }

    /// 带重试的请求，成功时返回信封中的 data 字段
    async fn request_data(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let result = self.http.get(&url).query(params).send().await;
            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    if attempt <= self.retry.max_retries {
                        let backoff = self.retry.calculate_backoff(attempt);
                        warn!(url = %url, attempt, error = %e, "Request failed, retrying");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(SourceError::Transport(format!("Request failed: {}", e)));
                }
            };

            let status = response.status();
            if is_retryable_status(status.as_u16()) {
                if attempt <= self.retry.max_retries {
                    let backoff = retry_after(&response).unwrap_or_else(|| {
                        self.retry.calculate_backoff(attempt)
                    });
                    warn!(url = %url, status = status.as_u16(), attempt, "Retryable status, backing off");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                return if status == StatusCode::TOO_MANY_REQUESTS {
                    Err(SourceError::RateLimited)
                } else {
                    Err(SourceError::Transport(format!(
                        "HTTP {} after {} attempts",
                        status.as_u16(),
                        attempt
                    )))
                };
            }

            let body = response
                .text()
                .await
                .map_err(|e| SourceError::Transport(format!("Failed to read body: {}", e)))?;

            if !status.is_success() {
                return Err(SourceError::Transport(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    snippet(&body)
                )));
            }

            // 风控时可能返回 HTML 而非 JSON
            let envelope: Envelope = serde_json::from_str(&body)
                .map_err(|_| SourceError::Decode(format!("Non-JSON response: {}", snippet(&body))))?;

            if envelope.code != 0 {
                return Err(SourceError::Api {
                    code: envelope.code,
                    message: envelope.message,
                });
            }

            return Ok(envelope.data);
        }
    }

    /// 对参数做 WBI 签名
    fn sign(&self, params: &[(String, String)]) -> Result<Vec<(String, String)>, SourceError> {
        let guard = self.mixin_key.read();
        let key = guard.as_ref().ok_or(SourceError::SigningUnavailable)?;
        Ok(wbi::sign_params(params, key, Utc::now().timestamp()))
    }
}

fn snippet(body: &str) -> String {
    body.trim()
        .replace('\n', " ")
        .chars()
        .take(SNIPPET_LEN)
        .collect()
}

/// 解析 Retry-After 头（仅秒数形式）
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl VideoSource for BiliClient {
    async fn search(
        &self,
        keyword: &str,
        page: u32,
        page_size: u32,
        order: &str,
    ) -> Result<Vec<SearchItem>, SourceError> {
        if !self.ensure_signing().await {
            return Err(SourceError::SigningUnavailable);
        }

        let params = vec![
            ("search_type".to_string(), "video".to_string()),
            ("keyword".to_string(), keyword.to_string()),
            ("page".to_string(), page.to_string()),
            ("page_size".to_string(), page_size.to_string()),
            ("order".to_string(), order.to_string()),
        ];
        let signed = self.sign(&params)?;
        let data = self.request_data(SEARCH_PATH, &signed).await?;

        let result = data.get("result").cloned().unwrap_or(Value::Null);
        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result)
            .map_err(|e| SourceError::Decode(format!("Bad search result: {}", e)))
    }

    async fn detail(&self, bvid: &str) -> Result<VideoDetail, SourceError> {
        let params = vec![("bvid".to_string(), bvid.to_string())];
        let data = self.request_data(VIEW_PATH, &params).await?;
        serde_json::from_value(data)
            .map_err(|e| SourceError::Decode(format!("Bad video detail: {}", e)))
    }

    async fn tags(&self, bvid: &str) -> Result<Vec<String>, SourceError> {
        let params = vec![("bvid".to_string(), bvid.to_string())];
        let data = self.request_data(TAG_PATH, &params).await?;

        let items = match data {
            Value::Array(items) => items,
            Value::Object(ref map) => match map.get("data") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Ok(items
            .iter()
            .filter_map(|t| t.get("tag_name").and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn signing_ready(&self) -> bool {
        self.ensure_signing().await
    }
}
