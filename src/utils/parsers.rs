// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

static COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)([万亿])?$").expect("计数正则非法"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("标签正则非法"));

/// 解析平台计数值
///
/// 兼容上游常见的三种形态：整数、数字字符串、带 万/亿 单位的字符串。
/// 任何解析失败都返回 0，保证调用方不需要处理错误。
pub fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Null => 0,
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else {
                n.as_f64().map(|f| f.max(0.0) as u64).unwrap_or(0)
            }
        }
        Value::String(s) => parse_count_text(s),
        _ => 0,
    }
}

/// 解析字符串形式的计数，如 "1.2万"、"3亿"、"-"
pub fn parse_count_text(value: &str) -> u64 {
    let s = value.trim().replace(',', "");
    if s.is_empty() || s == "-" {
        return 0;
    }

    if let Some(caps) = COUNT_RE.captures(&s) {
        let num: f64 = caps[1].parse().unwrap_or(0.0);
        let multiplier = match caps.get(2).map(|m| m.as_str()) {
            Some("万") => 10_000.0,
            Some("亿") => 100_000_000.0,
            _ => 1.0,
        };
        return (num * multiplier) as u64;
    }

    s.parse::<f64>().map(|f| f.max(0.0) as u64).unwrap_or(0)
}

/// serde 辅助：把数字或字符串形式的计数字段反序列化为 u64
pub fn de_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_count(&value))
}

/// 解析 "12:34" / "1:02:03" 形式的时长为秒数
///
/// 纯数字字符串按秒数直接解析；非法输入返回 0。
pub fn parse_duration(value: &str) -> u64 {
    let s = value.trim();
    if s.is_empty() {
        return 0;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().unwrap_or(0);
    }

    let parts: Vec<Option<u64>> = s.split(':').map(|p| p.trim().parse().ok()).collect();
    if parts.iter().any(|p| p.is_none()) {
        return 0;
    }
    match parts.len() {
        2 => parts[0].unwrap_or(0) * 60 + parts[1].unwrap_or(0),
        3 => parts[0].unwrap_or(0) * 3600 + parts[1].unwrap_or(0) * 60 + parts[2].unwrap_or(0),
        _ => 0,
    }
}

/// 解析上游返回的发布时间戳（秒或毫秒），0 视为未知
pub fn parse_timestamp(timestamp: u64) -> Option<DateTime<Utc>> {
    if timestamp == 0 {
        return None;
    }
    let secs = if timestamp > 1_000_000_000_000 {
        timestamp / 1000
    } else {
        timestamp
    };
    Utc.timestamp_opt(secs as i64, 0).single()
}

/// 去除 HTML 标签并反转义
///
/// 搜索接口的标题里嵌有 `<em class="keyword">` 高亮标签。
pub fn clean_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = TAG_RE.replace_all(text, "");
    html_escape::decode_html_entities(stripped.as_ref())
        .trim()
        .to_string()
}

/// 统一修正媒体 URL：//xx -> https://xx、http -> https
pub fn normalize_media_url(url: &str) -> String {
    let u = url.trim();
    if u.is_empty() {
        return String::new();
    }
    if let Some(rest) = u.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    if let Some(rest) = u.strip_prefix("http://") {
        return format!("https://{}", rest);
    }
    u.to_string()
}

/// 构造视频详情页链接
pub fn build_video_url(bvid: &str) -> String {
    if bvid.is_empty() {
        return String::new();
    }
    format!("https://www.bilibili.com/video/{}", bvid)
}
