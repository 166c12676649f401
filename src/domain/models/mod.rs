// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 采集运行（crawl_run）：采集任务、选项与运行状态
/// - 上游条目（source_item）：搜索/详情接口的原始数据结构
/// - 视频（video）：规范化后的视频记录与衍生分类数据
pub mod crawl_run;
pub mod source_item;
pub mod video;
