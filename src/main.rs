use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use card_buyback_lib::application::RefreshService;
use card_buyback_lib::domain::{ImageDataDocument, search_cards};
use card_buyback_lib::infrastructure::logging::log_system_info;
use card_buyback_lib::infrastructure::{
    AppConfig, ExecutionContext, HttpClient, HttpResourceDriver, init_logging_with_config,
};

mod cli;

use cli::{Cli, Commands, ContextKind};

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(order) = cli.strategy_order {
        config.fetch.strategy_order = order;
    }
    if let Some(size) = &cli.image_size {
        config.fetch.image_size.clone_from(size);
    }
    if let Some(origin) = &cli.static_origin {
        config.sources.static_origin = Some(origin.clone());
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
}

fn build_context(config: &AppConfig, kind: ContextKind) -> Result<ExecutionContext> {
    let static_origin: Option<Url> = config.static_origin();
    Ok(match kind {
        ContextKind::Server => {
            if let Some(origin) = &static_origin {
                warn!("Static origin {} is ignored in the server context", origin);
            }
            ExecutionContext::server()
        }
        ContextKind::Browser => {
            let http = HttpClient::from_http_config(&config.http)?.with_context_label("HttpResourceDriver");
            ExecutionContext::browser(Arc::new(HttpResourceDriver::new(http)), static_origin)
        }
    })
}

async fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    init_logging_with_config(config.logging.clone())?;
    log_system_info();

    let context = build_context(&config, cli.context)?;
    info!("Execution context: {:?}", context);
    let service = RefreshService::from_config(&config, &context)?;

    match cli.command {
        Commands::Refresh { output } => {
            let outcome = service.refresh().await;
            write_json(&outcome, output.as_deref()).await?;
        }

        Commands::Search { query } => {
            let outcome = service.refresh().await;
            let hits = search_cards(&outcome.data, &query);
            for card in &hits {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    card.model_number, card.title, card.rarity, card.price, card.image_url
                );
            }
            info!("{} cards match '{}'", hits.len(), query);
        }

        Commands::Images { output } => {
            let outcome = service.fetch_images().await;
            info!(
                "{} image records from {}",
                outcome.records.len(),
                outcome.source.as_deref().unwrap_or("no source")
            );
            write_json(&ImageDataDocument::new(outcome.records), output.as_deref()).await?;
        }
    }

    Ok(())
}
