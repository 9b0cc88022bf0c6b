use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default listen address for the metrics endpoint.
fn default_listen_addr() -> String {
    "0.0.0.0:2112".to_string()
}

/// Refresh periods per data domain, in seconds.
///
/// Pairs change rarely (new listings), so they refresh on a minute-class
/// interval; everything else tracks live market state on a seconds-class
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    pub pairs: u64,
    pub pools: u64,
    pub prices: u64,
    pub liquid_staking: u64,
    pub balances: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            pairs: 60,
            pools: 2,
            prices: 2,
            liquid_staking: 2,
            balances: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chain node's REST (gRPC-gateway) API.
    pub node_api_url: String,

    /// Base URL of the price-feed API.
    pub price_api_url: String,

    /// Accept invalid TLS certificates from the node API.
    pub insecure: bool,

    /// Address the metrics endpoint listens on.
    pub listen_addr: String,

    /// Addresses whose balances are tracked and valued.
    pub tracked_addresses: Vec<String>,

    pub intervals: IntervalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_api_url: String::new(),
            price_api_url: String::new(),
            insecure: false,
            listen_addr: default_listen_addr(),
            tracked_addresses: Vec::new(),
            intervals: IntervalConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config: {}", path.display()))
    }
}
