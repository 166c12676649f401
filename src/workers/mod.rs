// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod crawl_worker;
pub mod keywords;
pub mod run_registry;

pub use crawl_worker::{CrawlError, CrawlWorker, ProgressFn};
pub use run_registry::{RunRegistry, RunSnapshot};
