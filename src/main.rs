use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use poolwatch::client::{LivePriceClient, NodeClient, PriceFeed, RestNodeClient};
use poolwatch::config::Config;
use poolwatch::refresh::Refresher;
use poolwatch::scheduler::Scheduler;
use poolwatch::server;
use poolwatch::store::SnapshotStore;

#[derive(Parser, Debug)]
#[command(name = "poolwatch")]
#[command(about = "Prometheus exporter for a DEX chain's pairs, pools, prices and balances")]
struct Cli {
    /// Base URL of the node's REST API, e.g. https://api.mainnet.example.network
    node_api_url: Option<String>,

    /// Base URL of the price-feed API, e.g. https://apigw.example.network
    price_api_url: Option<String>,

    /// Path to config file
    #[arg(short, long, default_value = "poolwatch.toml")]
    config: PathBuf,

    /// Accept invalid TLS certificates from the node API
    #[arg(long)]
    insecure: bool,

    /// Listen address for the metrics endpoint
    #[arg(long)]
    listen: Option<String>,

    /// Track an address's balances (repeatable)
    #[arg(long = "address", value_name = "ADDRESS")]
    addresses: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config: {}", cli.config.display()))?;
    if let Some(url) = cli.node_api_url {
        config.node_api_url = url;
    }
    if let Some(url) = cli.price_api_url {
        config.price_api_url = url;
    }
    if cli.insecure {
        config.insecure = true;
    }
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    config.tracked_addresses.extend(cli.addresses);

    if config.node_api_url.is_empty() || config.price_api_url.is_empty() {
        anyhow::bail!("node and price-feed API URLs are required (arguments or config file)");
    }

    let node: Arc<dyn NodeClient> =
        Arc::new(RestNodeClient::with_options(&config.node_api_url, config.insecure)?);
    let price_feed: Arc<dyn PriceFeed> = Arc::new(LivePriceClient::new(&config.price_api_url)?);
    let store = Arc::new(SnapshotStore::new());
    let refresher = Arc::new(
        Refresher::new(node, price_feed, store.clone())
            .with_tracked_addresses(config.tracked_addresses.clone()),
    );

    let mut scheduler = Scheduler::new();
    let intervals = &config.intervals;
    {
        let refresher = refresher.clone();
        scheduler.spawn_periodic("pairs", Duration::from_secs(intervals.pairs), move || {
            let refresher = refresher.clone();
            async move { refresher.refresh_pairs().await }
        });
    }
    {
        let refresher = refresher.clone();
        scheduler.spawn_periodic("pools", Duration::from_secs(intervals.pools), move || {
            let refresher = refresher.clone();
            async move { refresher.refresh_pools().await }
        });
    }
    {
        let refresher = refresher.clone();
        scheduler.spawn_periodic("prices", Duration::from_secs(intervals.prices), move || {
            let refresher = refresher.clone();
            async move { refresher.refresh_prices().await }
        });
    }
    {
        let refresher = refresher.clone();
        scheduler.spawn_periodic(
            "liquid_staking",
            Duration::from_secs(intervals.liquid_staking),
            move || {
                let refresher = refresher.clone();
                async move { refresher.refresh_liquid_staking().await }
            },
        );
    }
    {
        let refresher = refresher.clone();
        scheduler.spawn_periodic("balances", Duration::from_secs(intervals.balances), move || {
            let refresher = refresher.clone();
            async move { refresher.refresh_balances().await }
        });
    }

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("bind {}", config.listen_addr))?;
    info!(
        node = %config.node_api_url,
        price_feed = %config.price_api_url,
        tracked = config.tracked_addresses.len(),
        "poolwatch started"
    );

    tokio::select! {
        result = server::serve(listener, store) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            scheduler.shutdown().await;
        }
    }

    Ok(())
}
