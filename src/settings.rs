use std::path::PathBuf;

use clap::ValueEnum;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Where pages come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Plain HTTP fetch of the served HTML.
    #[default]
    Http,
    /// spider.cloud render API (needs SPIDER_API_KEY).
    Spider,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub delay_ms: u64,
    pub jitter_ms: u64,
    pub checkpoint_every: usize,
    pub out_dir: PathBuf,
    pub db_path: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backend: Backend,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            delay_ms: 1000,
            jitter_ms: 0,
            checkpoint_every: 50,
            out_dir: PathBuf::from("data"),
            db_path: PathBuf::from("data/toons.sqlite"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            backend: Backend::Http,
        }
    }
}

impl Settings {
    /// Defaults, then `toon_scraper.toml` if present, then `TOON_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("toon_scraper").required(false))
                .add_source(Environment::with_prefix("TOON").try_parsing(true)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
