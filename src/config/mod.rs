// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置设置模块
///
/// 提供应用程序配置的加载和管理功能
pub mod settings;
