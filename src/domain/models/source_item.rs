// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::parsers::de_count;
use serde::{Deserialize, Serialize};

/// 搜索接口返回的轻量条目
///
/// 计数字段在不同接口版本里可能是数字也可能是 "1.2万" 形式的
/// 字符串，统一经 `de_count` 宽容解析；缺失字段取零值。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub bvid: String,
    #[serde(default, deserialize_with = "de_count")]
    pub aid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, deserialize_with = "de_count")]
    pub mid: u64,
    /// 封面图，可能以 // 开头
    #[serde(default)]
    pub pic: String,
    /// UP 主头像
    #[serde(default)]
    pub upic: String,
    #[serde(default, deserialize_with = "de_count")]
    pub play: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub favorites: u64,
    /// 弹幕数
    #[serde(default, deserialize_with = "de_count")]
    pub video_review: u64,
    /// 评论数
    #[serde(default, deserialize_with = "de_count")]
    pub review: u64,
    /// 时长，"12:34" 形式
    #[serde(default)]
    pub duration: String,
    #[serde(default, deserialize_with = "de_count")]
    pub pubdate: u64,
    /// 平台分区 ID
    #[serde(default, deserialize_with = "de_count")]
    pub typeid: u64,
    /// 平台分区名
    #[serde(default)]
    pub typename: String,
    #[serde(default)]
    pub description: String,
}

/// 详情接口返回的完整记录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoDetail {
    #[serde(default)]
    pub bvid: String,
    #[serde(default, deserialize_with = "de_count")]
    pub aid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub pic: String,
    /// 时长（秒）
    #[serde(default, deserialize_with = "de_count")]
    pub duration: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub pubdate: u64,
    #[serde(default)]
    pub owner: VideoOwner,
    #[serde(default)]
    pub stat: VideoStat,
    #[serde(default, deserialize_with = "de_count")]
    pub tid: u64,
    #[serde(default)]
    pub tname: String,
}

/// 详情中的 UP 主信息块
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoOwner {
    #[serde(default, deserialize_with = "de_count")]
    pub mid: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub face: String,
}

/// 详情中的互动统计块
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoStat {
    #[serde(default, deserialize_with = "de_count")]
    pub view: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub danmaku: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub reply: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub favorite: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub coin: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub share: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub like: u64,
}
