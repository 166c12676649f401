// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bilicrawl::config::settings::Settings;
use bilicrawl::domain::models::crawl_run::{CrawlOptions, RunStatus};
use bilicrawl::domain::services::recommend_engine::{RecommendEngine, RecommendQuery};
use bilicrawl::domain::services::topic_classifier::TopicClassifier;
use bilicrawl::infrastructure::bili::BiliClient;
use bilicrawl::infrastructure::repositories::InMemoryVideoRepository;
use bilicrawl::utils::telemetry;
use bilicrawl::workers::keywords::default_crawl_plan;
use bilicrawl::workers::RunRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 主函数
///
/// 全量采集一轮默认关键词计划，结束后输出热门推荐
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting bilicrawl...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Initialize components
    let client = Arc::new(
        BiliClient::new(&settings.api).map_err(|e| anyhow::anyhow!(e.to_string()))?,
    );
    let repository = Arc::new(InMemoryVideoRepository::new());
    let registry = RunRegistry::new();
    info!("Components initialized");

    // 4. Submit crawl run
    let options = CrawlOptions {
        max_pages: settings.crawler.max_pages,
        ..Default::default()
    };
    let run_id = registry.submit(
        client,
        repository.clone(),
        TopicClassifier::new(),
        settings.crawler.clone(),
        default_crawl_plan(),
        options,
    );
    info!(%run_id, "Crawl run submitted");

    // 5. Poll until the run reaches a terminal state
    let mut printed: usize = 0;
    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;

        let Some(snapshot) = registry.snapshot(&run_id) else {
            break;
        };
        for message in snapshot.messages.iter().skip(printed.min(snapshot.messages.len())) {
            println!("{}", message);
        }
        printed = snapshot.messages.len();

        if snapshot.status.is_terminal() {
            break;
        }
    }

    let Some(result) = registry.take_result(&run_id) else {
        anyhow::bail!("Crawl run vanished before completion");
    };

    match result.status {
        RunStatus::Succeeded => {
            let summary = result.summary.unwrap_or_default();
            info!(
                new_records = summary.new_records,
                skipped = summary.skipped,
                pages = summary.pages_fetched,
                "Crawl run succeeded"
            );
        }
        status => {
            anyhow::bail!(
                "Crawl run ended with status {}: {}",
                status,
                result.error.unwrap_or_default()
            );
        }
    }

    // 6. Print top recommendations
    let engine = RecommendEngine::new(repository, settings.recommend.max_page_size);
    let page = engine
        .recommend(&RecommendQuery::with_settings(&settings.recommend))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    println!("共 {} 条达标视频，热门前 {} 条：", page.total, page.items.len());
    for (rank, item) in page.items.iter().enumerate() {
        println!(
            "{:>2}. [{:.2}] {} - {} ({})",
            rank + 1,
            item.quality_score.unwrap_or(0.0),
            item.title,
            item.up_name,
            item.url
        );
    }

    Ok(())
}
