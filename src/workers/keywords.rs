// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 默认采集关键词
//!
//! 按三科组织，不含讲师人名，讲师由分类阶段识别。

use crate::domain::models::crawl_run::CrawlTask;
use crate::domain::models::video::Subject;

/// 高等数学采集关键词
pub const CALCULUS_KEYWORDS: [&str; 26] = [
    "高等数学",
    "微积分",
    "极限",
    "连续",
    "无穷小",
    "导数",
    "微分",
    "求导",
    "链式法则",
    "积分",
    "定积分",
    "不定积分",
    "换元",
    "分部积分",
    "微分方程",
    "一阶",
    "二阶",
    "通解",
    "级数",
    "幂级数",
    "泰勒级数",
    "收敛",
    "多元函数",
    "偏导",
    "全微分",
    "重积分",
];

/// 线性代数采集关键词
pub const LINEAR_ALGEBRA_KEYWORDS: [&str; 17] = [
    "线性代数",
    "行列式",
    "矩阵",
    "矩阵运算",
    "向量",
    "向量空间",
    "线性相关",
    "线性无关",
    "线性方程组",
    "齐次",
    "非齐次",
    "特征值",
    "特征向量",
    "相似",
    "对角化",
    "二次型",
    "正定",
];

/// 概率论与数理统计采集关键词
pub const PROBABILITY_KEYWORDS: [&str; 20] = [
    "概率论",
    "统计学",
    "数理统计",
    "概率",
    "古典概型",
    "条件概率",
    "全概率",
    "贝叶斯",
    "随机变量",
    "分布",
    "期望",
    "方差",
    "协方差",
    "大数定律",
    "中心极限定理",
    "假设检验",
    "置信区间",
    "点估计",
    "回归分析",
    "相关系数",
];

/// 全量默认采集计划，按科目顺序展开
pub fn default_crawl_plan() -> Vec<CrawlTask> {
    let group = |keywords: &[&str], subject: Subject| {
        keywords
            .iter()
            .map(|kw| CrawlTask::with_subject(*kw, subject))
            .collect::<Vec<_>>()
    };

    let mut plan = group(&CALCULUS_KEYWORDS, Subject::Calculus);
    plan.extend(group(&LINEAR_ALGEBRA_KEYWORDS, Subject::LinearAlgebra));
    plan.extend(group(&PROBABILITY_KEYWORDS, Subject::Probability));
    plan
}
