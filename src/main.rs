mod cli;

use newreleases::{
    catalog::{CatalogGateway, HttpCatalog},
    config,
    engine::{EngineOptions, EngineOutput, ReleaseEngine},
    sources::CatalogArtistSource,
};
use newreleases_common::Error;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn scan(
    config_path: Option<&std::path::Path>,
    days: Option<u32>,
    optimized_search: bool,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let mut options = EngineOptions::from_config(&config);
    if let Some(days) = days {
        if days == 0 {
            anyhow::bail!("--days must be at least 1");
        }
        options = options.with_window_days(days);
    }
    if optimized_search {
        options = options.with_optimized_search(true);
    }

    let gateway: Arc<dyn CatalogGateway> = match HttpCatalog::new(&config.catalog) {
        Ok(catalog) => Arc::new(catalog),
        Err(e @ Error::Unauthorized(_)) => {
            anyhow::bail!(
                "{e}\nSet catalog.access_token in the config file or export {}",
                config::ACCESS_TOKEN_ENV
            );
        }
        Err(e) => return Err(e.into()),
    };

    let cancel = CancellationToken::new();
    tokio::spawn(interrupt_signal(cancel.clone()));

    let engine = ReleaseEngine::new(gateway.clone(), options).with_cancellation(cancel);
    let sources = CatalogArtistSource::enabled(gateway, &config.sources);

    let output = match engine.run(sources).await {
        Ok(output) => output,
        Err(e @ Error::Unauthorized(_)) => {
            anyhow::bail!("{e}\nThe access token was rejected; re-authenticate and try again");
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_output(&output);
    }

    Ok(())
}

fn print_output(output: &EngineOutput) {
    if output.releases.is_empty() {
        println!("No new releases found");
    }
    for item in &output.releases {
        let release = &item.release;
        let date = release
            .release_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        println!(
            "{:<10}  {:<5}  {} - {}",
            date, item.category, release.artist_name, release.name
        );
    }

    let summary = &output.summary;
    println!();
    println!(
        "Artists: {} scanned, {} succeeded, {} failed",
        summary.total_artists,
        summary.succeeded_artists,
        summary.failed_artist_ids.len()
    );
    println!("Releases: {}", summary.total_releases_found);
    if !summary.failed_artist_ids.is_empty() {
        let ids: Vec<&str> = summary.failed_artist_ids.iter().map(|id| id.as_str()).collect();
        println!("Failed artists: {}", ids.join(", "));
    }
    if summary.cancelled {
        println!("Scan was interrupted; results are partial");
    }
}

async fn interrupt_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            tracing::info!("Interrupt received; finishing in-flight requests");
            cancel.cancel();
        }
        _ = cancel.cancelled() => {}
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "newreleases=debug,newreleases_common=debug".to_string()
        } else {
            "newreleases=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan {
            days,
            optimized_search,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan(cli.config.as_deref(), days, optimized_search, json))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("newreleases {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Catalog: {}", config.catalog.base_url);
    println!(
        "  Access token: {}",
        if config.catalog.resolve_access_token().is_some() {
            "set"
        } else {
            "missing"
        }
    );
    println!("  Window: {} days", config.scan.window_days);
    println!("  Optimized search: {}", config.scan.use_optimized_search);
    println!(
        "  Batches: {} artists, concurrency {}",
        config.scheduler.batch_size, config.scheduler.concurrency
    );

    Ok(())
}
