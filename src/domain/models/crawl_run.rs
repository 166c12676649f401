// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::video::Subject;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 采集任务
///
/// 一次运行的最小输入单元：一个搜索关键词，外加可选的
/// 分类提示（分类器无法推断时回填使用）。任务本身没有持久身份。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    /// 搜索关键词
    pub keyword: String,
    /// 科目提示
    pub subject_hint: Option<Subject>,
    /// 学习阶段提示（如 "考研"）
    pub phase_hint: Option<String>,
}

impl CrawlTask {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            subject_hint: None,
            phase_hint: None,
        }
    }

    pub fn with_subject(keyword: impl Into<String>, subject: Subject) -> Self {
        Self {
            keyword: keyword.into(),
            subject_hint: Some(subject),
            phase_hint: None,
        }
    }
}

/// 采集运行选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOptions {
    /// 每个关键词最大页数（会被配置上限截断）
    pub max_pages: u32,
    /// 是否跳过库中已存在的 bvid
    pub skip_existing: bool,
    /// 是否抓取详情
    pub fetch_detail: bool,
    /// 是否抓取标签
    pub fetch_tags: bool,
    /// 是否写入存储
    pub save: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: 15,
            skip_existing: true,
            fetch_detail: true,
            fetch_tags: true,
            save: true,
        }
    }
}

/// 运行状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Succeeded/Failed/Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// 已提交，尚未开始执行
    #[default]
    Pending,
    /// 执行中
    Running,
    /// 成功结束
    Succeeded,
    /// 失败结束
    Failed,
    /// 被取消
    Cancelled,
}

impl RunStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            "cancelled" => Ok(RunStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 单次运行的汇总结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// 新采集的记录数
    pub new_records: u64,
    /// 因已存在而跳过的条数
    pub skipped: u64,
    /// 实际抓取的页数
    pub pages_fetched: u64,
}
