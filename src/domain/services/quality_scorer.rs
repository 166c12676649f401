// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 视频质量评分器
//!
//! 综合评分 = 互动分×0.4 + 时长分×0.2 + 新鲜度×0.2 + UP主分×0.2，
//! 各维度均为 0-100，总分四舍五入到两位小数。

use crate::domain::models::video::VideoRecord;
use chrono::{DateTime, Utc};

const WEIGHT_ENGAGEMENT: f64 = 0.40;
const WEIGHT_DURATION: f64 = 0.20;
const WEIGHT_FRESHNESS: f64 = 0.20;
const WEIGHT_UPLOADER: f64 = 0.20;

// 互动分内部权重
const WEIGHT_FAVORITE_RATE: f64 = 0.5;
const WEIGHT_LIKE_RATE: f64 = 0.3;
const WEIGHT_COIN_RATE: f64 = 0.2;

// 归一化参考率：收藏 2%、点赞 5%、投币 1% 即满分
const REF_FAVORITE_RATE: f64 = 0.02;
const REF_LIKE_RATE: f64 = 0.05;
const REF_COIN_RATE: f64 = 0.01;

// 理想时长区间（秒）
const IDEAL_DURATION_MIN: u64 = 5 * 60;
const IDEAL_DURATION_MAX: u64 = 30 * 60;

/// 推荐阈值，达到即标记 is_recommended
pub const RECOMMEND_THRESHOLD: f64 = 60.0;

/// 视频质量评分器
///
/// UP 主评分表按声明顺序匹配，首个命中项生效。
#[derive(Debug, Clone)]
pub struct QualityScorer {
    uploader_scores: Vec<(String, f64)>,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityScorer {
    pub fn new() -> Self {
        Self {
            uploader_scores: Self::default_uploader_scores(),
        }
    }

    /// 以自定义 UP 主评分表构造
    pub fn with_uploader_scores(uploader_scores: Vec<(String, f64)>) -> Self {
        Self { uploader_scores }
    }

    /// 默认的优质 UP 主评分表
    fn default_uploader_scores() -> Vec<(String, f64)> {
        [
            ("宋浩老师官方", 95.0),
            ("宋浩老师", 95.0),
            ("张宇考研数学", 92.0),
            ("汤家凤老师", 90.0),
            ("武忠祥老师", 90.0),
            ("武忠祥", 90.0),
            ("李永乐老师", 88.0),
            ("余丙森老师", 85.0),
            ("3Blue1Brown", 98.0),
            ("3Blue1Brown中国", 95.0),
            ("妈咪说MommyTalk", 85.0),
        ]
        .into_iter()
        .map(|(name, score)| (name.to_string(), score))
        .collect()
    }

    /// 以当前时间计算综合评分
    pub fn score(&self, video: &VideoRecord) -> f64 {
        self.score_at(video, Utc::now())
    }

    /// 以指定参考时间计算综合评分，钳制到 [0, 100]
    pub fn score_at(&self, video: &VideoRecord, now: DateTime<Utc>) -> f64 {
        let total = self.score_engagement(video) * WEIGHT_ENGAGEMENT
            + Self::score_duration(video.duration) * WEIGHT_DURATION
            + Self::score_freshness(video.pubdate, now) * WEIGHT_FRESHNESS
            + self.score_uploader(&video.up_name) * WEIGHT_UPLOADER;

        (total.clamp(0.0, 100.0) * 100.0).round() / 100.0
    }

    /// 是否达到推荐阈值
    pub fn is_recommended(score: f64) -> bool {
        score >= RECOMMEND_THRESHOLD
    }

    /// 互动分：收藏率/点赞率/投币率各自对参考率归一化后加权
    fn score_engagement(&self, video: &VideoRecord) -> f64 {
        let views = video.view_count.max(1) as f64;

        let rate_score = |count: u64, reference: f64| -> f64 {
            ((count as f64 / views) / reference * 100.0).min(100.0)
        };

        rate_score(video.favorite_count, REF_FAVORITE_RATE) * WEIGHT_FAVORITE_RATE
            + rate_score(video.like_count, REF_LIKE_RATE) * WEIGHT_LIKE_RATE
            + rate_score(video.coin_count, REF_COIN_RATE) * WEIGHT_COIN_RATE
    }

    /// 时长分：5-30 分钟满分，过短低分，超过 1 小时每 30 分钟扣 10 分
    fn score_duration(duration: u64) -> f64 {
        if duration < 60 {
            20.0
        } else if duration < 2 * 60 {
            40.0
        } else if duration < IDEAL_DURATION_MIN {
            60.0
        } else if duration <= IDEAL_DURATION_MAX {
            100.0
        } else if duration <= 60 * 60 {
            80.0
        } else {
            let penalty = ((duration - 60 * 60) / (30 * 60)) as f64 * 10.0;
            (80.0 - penalty).max(50.0)
        }
    }

    /// 新鲜度分：按发布距今的天数分档，未知发布时间给中间分
    fn score_freshness(pubdate: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(pub_dt) = pubdate else {
            return 50.0;
        };

        let days_ago = (now - pub_dt).num_days();
        if days_ago < 180 {
            100.0
        } else if days_ago < 365 {
            90.0
        } else if days_ago < 730 {
            70.0
        } else if days_ago < 1095 {
            50.0
        } else {
            30.0
        }
    }

    /// UP 主分：与名单双向子串匹配，未知 UP 主给基准分 60
    fn score_uploader(&self, up_name: &str) -> f64 {
        if !up_name.is_empty() {
            for (known, score) in &self.uploader_scores {
                if up_name.contains(known.as_str()) || known.contains(up_name) {
                    return *score;
                }
            }
        }
        60.0
    }
}
