// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
/// 包括平台计数解析、重试策略和遥测监控等功能
pub mod parsers;
pub mod retry_policy;
pub mod telemetry;
