use std::sync::Arc;
use std::time::Duration;

use advault_cli::{format_ad_row, format_failure_row, init_tracing};
use advault_core::Config;
use advault_db::{AdRepository, AdStore};
use advault_ingest::IngestPipeline;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

#[derive(Parser, Debug)]
#[command(name = "advault")]
#[command(about = "Ingest video ads from social posts into the ad library")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest one or more post URLs
    Ingest {
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        /// Output format: json or table (default: table)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Print a stored ad as JSON
    Show {
        #[arg(value_name = "POST_ID")]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = Config::from_env()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;
    advault_db::MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    let store: Arc<dyn AdStore> = Arc::new(AdRepository::new(pool));

    match args.command {
        Command::Ingest { urls, format } => {
            if format != "json" && format != "table" {
                return Err(anyhow::anyhow!("Invalid format. Must be: json or table"));
            }

            let storage = advault_storage::create_storage(&config)
                .await
                .context("Failed to initialize storage")?;
            let pipeline = IngestPipeline::from_config(config.ingest(), storage, store)?;

            let results = pipeline.ingest_batch(urls.clone()).await;
            let failed = results.iter().filter(|r| r.is_err()).count();

            if format == "json" {
                let items: Vec<serde_json::Value> = urls
                    .iter()
                    .zip(&results)
                    .map(|(url, result)| match result {
                        Ok(ad) => serde_json::json!({ "url": url, "ad": ad }),
                        Err(e) => serde_json::json!({
                            "url": url,
                            "error": e.to_string(),
                            "stage": e.stage.to_string(),
                        }),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                println!(
                    "{:<22} {:<32} {:<18} {:>5}  STATUS",
                    "ID", "TITLE", "CREATOR", "SHOTS"
                );
                for (url, result) in urls.iter().zip(&results) {
                    match result {
                        Ok(ad) => println!("{}", format_ad_row(ad)),
                        Err(e) => println!("{}", format_failure_row(url, e)),
                    }
                }
                println!();
                println!("{} ingested, {} failed", results.len() - failed, failed);
            }

            if failed > 0 {
                std::process::exit(1);
            }
        }
        Command::Show { id } => match store.get_ad_by_id(&id).await? {
            Some(ad) => println!("{}", serde_json::to_string_pretty(&ad)?),
            None => return Err(anyhow::anyhow!("Ad not found: {}", id)),
        },
    }

    Ok(())
}
