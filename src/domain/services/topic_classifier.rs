// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 知识点分类器
//!
//! 纯关键词规则：知识点按目录顺序多选匹配，难度取第一个命中的
//! 级别，科目由知识点归属投票推断，无知识点时回退到讲师名识别。

use crate::domain::models::video::{Difficulty, Subject};

/// 知识点目录，按学科顺序排列
pub const TOPICS: [&str; 17] = [
    // 高等数学
    "极限与连续",
    "导数与微分",
    "积分",
    "微分方程",
    "级数",
    "多元函数",
    // 线性代数
    "行列式",
    "矩阵",
    "向量",
    "线性方程组",
    "特征值",
    // 概率论
    "概率基础",
    "随机变量",
    "数理统计",
    // 其他
    "考研相关",
    "竞赛",
    "直观",
];

/// 各知识点的触发关键词
const TOPIC_KEYWORDS: [(&str, &[&str]); 17] = [
    (
        "极限与连续",
        &["极限", "连续", "无穷小", "无穷大", "夹逼", "洛必达", "等价无穷小"],
    ),
    (
        "导数与微分",
        &["导数", "微分", "求导", "链式法则", "隐函数", "参数方程导数", "高阶导数"],
    ),
    (
        "积分",
        &["积分", "定积分", "不定积分", "换元", "分部积分", "变限积分", "广义积分"],
    ),
    (
        "微分方程",
        &["微分方程", "一阶", "二阶", "常微分", "偏微分", "通解", "特解"],
    ),
    (
        "级数",
        &["级数", "幂级数", "泰勒", "麦克劳林", "傅里叶", "收敛", "发散"],
    ),
    (
        "多元函数",
        &[
            "多元函数",
            "偏导",
            "全微分",
            "重积分",
            "二重积分",
            "三重积分",
            "曲线积分",
            "曲面积分",
        ],
    ),
    ("行列式", &["行列式", "克拉默", "代数余子式"]),
    (
        "矩阵",
        &["矩阵", "逆矩阵", "伴随矩阵", "矩阵乘法", "初等变换"],
    ),
    (
        "向量",
        &["向量", "向量空间", "线性相关", "线性无关", "基", "维数", "正交"],
    ),
    (
        "线性方程组",
        &["线性方程组", "齐次", "非齐次", "解的结构", "基础解系"],
    ),
    (
        "特征值",
        &["特征值", "特征向量", "相似", "对角化", "二次型"],
    ),
    (
        "概率基础",
        &["概率", "古典概型", "条件概率", "全概率", "贝叶斯"],
    ),
    (
        "随机变量",
        &["随机变量", "分布", "期望", "方差", "协方差", "二维分布"],
    ),
    (
        "数理统计",
        &["统计", "估计", "假设检验", "置信区间", "回归"],
    ),
    (
        "考研相关",
        &["考研", "真题", "刷题", "数一", "数二", "数三", "历年"],
    ),
    ("竞赛", &["竞赛", "数学竞赛", "建模"]),
    (
        "直观",
        &["本质", "直观", "可视化", "3blue1brown", "科普", "通俗"],
    ),
];

/// 难度触发关键词，按由浅入深的顺序做首次命中
const DIFFICULTY_KEYWORDS: [(Difficulty, &[&str]); 3] = [
    (
        Difficulty::Entry,
        &["入门", "基础", "零基础", "小白", "初学", "通俗", "简单", "快速入门", "从零开始"],
    ),
    (
        Difficulty::Intermediate,
        &["进阶", "提高", "强化", "深入", "考研", "详解", "技巧"],
    ),
    (
        Difficulty::Advanced,
        &["高阶", "难题", "拔高", "竞赛", "证明", "深度", "数学家"],
    ),
];

/// 讲师名回退表，知识点全部未命中时按此推断科目
const LECTURER_KEYWORDS: [(Subject, &[&str]); 3] = [
    (Subject::Calculus, &["宋浩", "张宇", "汤家凤"]),
    (Subject::LinearAlgebra, &["李永乐", "武忠祥"]),
    (Subject::Probability, &["宋浩"]),
];

/// 负向过滤词，命中即判定为非课程内容
const NON_MATH_CONTEXT: [&str; 43] = [
    // 游戏相关
    "游戏",
    "mc",
    "minecraft",
    "我的世界",
    "收容",
    "模组",
    "挑战",
    "极限模式",
    "生存模式",
    "创造模式",
    "生存挑战",
    "原神",
    "王者荣耀",
    "英雄联盟",
    "lol",
    "吃鸡",
    "pubg",
    "steam",
    "主播",
    "直播",
    "游戏解说",
    "实况",
    "通关",
    // 生活/科技 vlog
    "vlog",
    "日常",
    "开箱",
    "装修",
    "改装",
    "汽车",
    "跑车",
    "超跑",
    "黑洞",
    "火箭",
    "航天",
    "飞机",
    // 娱乐
    "鬼畜",
    "搞笑",
    "恶搞",
    "整蛊",
    "整活",
    // 特定游戏内容
    "移除陆地",
    "一格物品栏",
    "加速100",
];

/// 高等数学知识点集合
const CALCULUS_TOPICS: [&str; 6] = [
    "极限与连续",
    "导数与微分",
    "积分",
    "微分方程",
    "级数",
    "多元函数",
];

/// 线性代数知识点集合
const LINEAR_ALGEBRA_TOPICS: [&str; 5] = ["行列式", "矩阵", "向量", "线性方程组", "特征值"];

/// 概率论知识点集合
const PROBABILITY_TOPICS: [&str; 3] = ["概率基础", "随机变量", "数理统计"];

/// 单条视频的分类结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// 命中的知识点，按目录顺序排列
    pub topics: Vec<String>,
    /// 难度，未命中任何难度词时为默认值「进阶」
    pub difficulty: Difficulty,
    /// 推断出的科目
    pub subject: Option<Subject>,
}

/// 分类策略抽象，便于替换为模型分类实现
pub trait ClassifierStrategy: Send + Sync {
    fn classify(&self, title: &str, tags: &str, desc: &str) -> Classification;
}

/// 基于关键词规则的默认分类器
#[derive(Debug, Default, Clone)]
pub struct TopicClassifier;

impl TopicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 小写并去除全部空白，提升匹配鲁棒性
    fn normalize(text: &str) -> String {
        text.to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    /// 负向过滤只看标题与标签，描述噪音太多不参与
    fn is_non_math(title: &str, tags: &str) -> bool {
        let text = Self::normalize(&format!("{} {}", title, tags));
        NON_MATH_CONTEXT.iter().any(|kw| text.contains(kw))
    }

    fn match_topics(normalized: &str) -> Vec<String> {
        TOPIC_KEYWORDS
            .iter()
            .filter(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|kw| normalized.contains(&Self::normalize(kw)))
            })
            .map(|(topic, _)| (*topic).to_string())
            .collect()
    }

    fn match_difficulty(normalized: &str) -> Difficulty {
        for (level, keywords) in DIFFICULTY_KEYWORDS {
            if keywords
                .iter()
                .any(|kw| normalized.contains(&Self::normalize(kw)))
            {
                return level;
            }
        }
        Difficulty::default()
    }

    /// 科目按命中知识点数量投票，平票时按科目优先级取先者
    fn infer_subject(topics: &[String], normalized: &str) -> Option<Subject> {
        if topics.is_empty() {
            return Self::detect_lecturer(normalized);
        }

        let count_in = |set: &[&str]| topics.iter().filter(|t| set.contains(&t.as_str())).count();
        let scores = [
            (Subject::Calculus, count_in(&CALCULUS_TOPICS)),
            (Subject::LinearAlgebra, count_in(&LINEAR_ALGEBRA_TOPICS)),
            (Subject::Probability, count_in(&PROBABILITY_TOPICS)),
        ];

        let max = scores.iter().map(|(_, n)| *n).max().unwrap_or(0);
        if max > 0 {
            return scores.iter().find(|(_, n)| *n == max).map(|(s, _)| *s);
        }

        Self::detect_lecturer(normalized)
    }

    fn detect_lecturer(normalized: &str) -> Option<Subject> {
        for (subject, lecturers) in LECTURER_KEYWORDS {
            if lecturers
                .iter()
                .any(|name| normalized.contains(&Self::normalize(name)))
            {
                return Some(subject);
            }
        }
        None
    }
}

impl ClassifierStrategy for TopicClassifier {
    fn classify(&self, title: &str, tags: &str, desc: &str) -> Classification {
        if Self::is_non_math(title, tags) {
            return Classification {
                topics: Vec::new(),
                difficulty: Difficulty::default(),
                subject: None,
            };
        }

        let normalized = Self::normalize(&format!("{} {} {}", title, tags, desc));
        let topics = Self::match_topics(&normalized);
        let difficulty = Self::match_difficulty(&normalized);
        let subject = Self::infer_subject(&topics, &normalized);

        Classification {
            topics,
            difficulty,
            subject,
        }
    }
}
