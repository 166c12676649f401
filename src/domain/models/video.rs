// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 视频记录实体
///
/// 以平台分配的 bvid 为主键的采集结果。首次采集时创建；
/// 再次采集到同一 bvid 时整体覆盖（upsert），不会产生重复行。
/// 采集管线自身永远不删除记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// 视频唯一标识（bvid）
    pub bvid: String,
    /// av 号（可选的旧式数字 ID）
    pub aid: u64,
    /// 视频详情页链接
    pub url: String,
    /// 标题（已去除搜索高亮标签）
    pub title: String,
    /// 详情页简介
    pub desc: String,
    /// UP 主名称
    pub up_name: String,
    /// UP 主 ID
    pub up_mid: u64,
    /// UP 主头像 URL
    pub up_face: String,
    /// 封面图 URL
    pub pic_url: String,
    /// 播放量
    pub view_count: u64,
    /// 弹幕数
    pub danmaku_count: u64,
    /// 评论数
    pub reply_count: u64,
    /// 收藏数
    pub favorite_count: u64,
    /// 点赞数
    pub like_count: u64,
    /// 投币数
    pub coin_count: u64,
    /// 分享数
    pub share_count: u64,
    /// 时长（秒）
    pub duration: u64,
    /// 发布时间，未知时为 None
    pub pubdate: Option<DateTime<Utc>>,
    /// 合并后的标签文本（逗号分隔，按出现顺序去重）
    pub tags: String,
    /// 平台原始分区 ID
    pub bili_tid: u64,
    /// 平台原始分区名（遗留字段，upsert 时首个非空值保留）
    pub bili_tname: String,
    /// 命中该视频的搜索关键词
    pub source_keyword: String,
    /// 采集时间
    pub crawl_time: DateTime<Utc>,
}

impl Default for VideoRecord {
    fn default() -> Self {
        Self {
            bvid: String::new(),
            aid: 0,
            url: String::new(),
            title: String::new(),
            desc: String::new(),
            up_name: String::new(),
            up_mid: 0,
            up_face: String::new(),
            pic_url: String::new(),
            view_count: 0,
            danmaku_count: 0,
            reply_count: 0,
            favorite_count: 0,
            like_count: 0,
            coin_count: 0,
            share_count: 0,
            duration: 0,
            pubdate: None,
            tags: String::new(),
            bili_tid: 0,
            bili_tname: String::new(),
            source_keyword: String::new(),
            crawl_time: Utc::now(),
        }
    }
}

/// 视频衍生数据实体
///
/// 与 VideoRecord 按 bvid 一一对应，由分类/评分阶段独占维护。
/// 每次都整体重算写入，绝不做部分更新；存在衍生记录即意味着
/// 对应的视频记录存在。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoEnrichment {
    /// 视频唯一标识（bvid）
    pub bvid: String,
    /// 推断出的科目，无法推断时为 None
    pub subject: Option<Subject>,
    /// 知识点列表（按目录优先级排序、已去重）
    pub topics: Vec<String>,
    /// 难度等级
    pub difficulty: Difficulty,
    /// 质量分 0-100
    pub quality_score: f64,
    /// 是否达到推荐阈值
    pub is_recommended: bool,
    /// 最近一次重算时间
    pub updated_at: DateTime<Utc>,
}

/// 科目枚举
///
/// 分类体系支持的三个科目，顺序即科目推断时的优先级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// 高等数学
    Calculus,
    /// 线性代数
    LinearAlgebra,
    /// 概率论与数理统计
    Probability,
}

impl Subject {
    /// 按优先级排列的全部科目
    pub const ALL: [Subject; 3] = [
        Subject::Calculus,
        Subject::LinearAlgebra,
        Subject::Probability,
    ];

    /// 科目全名
    pub fn name(&self) -> &'static str {
        match self {
            Subject::Calculus => "高等数学",
            Subject::LinearAlgebra => "线性代数",
            Subject::Probability => "概率论与数理统计",
        }
    }

    /// 前端使用的课程简称
    pub fn short_name(&self) -> &'static str {
        match self {
            Subject::Calculus => "高数",
            Subject::LinearAlgebra => "线代",
            Subject::Probability => "概率",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Subject {
    type Err = ();

    /// 同时接受全名与简称（含常见别名）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "高等数学" | "高数" | "微积分" => Ok(Subject::Calculus),
            "线性代数" | "线代" => Ok(Subject::LinearAlgebra),
            "概率论与数理统计" | "概率论" | "概率" => Ok(Subject::Probability),
            _ => Err(()),
        }
    }
}

/// 难度等级枚举（三级有序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// 入门
    Entry,
    /// 进阶（未匹配到难度关键词时的默认值）
    #[default]
    Intermediate,
    /// 高阶
    Advanced,
}

impl Difficulty {
    /// 按由浅入深排列的全部难度
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Entry,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Entry => "入门",
            Difficulty::Intermediate => "进阶",
            Difficulty::Advanced => "高阶",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "入门" | "entry" => Ok(Difficulty::Entry),
            "进阶" | "intermediate" => Ok(Difficulty::Intermediate),
            "高阶" | "advanced" => Ok(Difficulty::Advanced),
            _ => Err(()),
        }
    }
}
