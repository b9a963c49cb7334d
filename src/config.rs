use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::bootstrap::RetryPolicy;

pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:19006",
    "exp://192.168.1.219:8081",
    "exp://192.168.1.82:8081",
    "timetodo://",
];

/// Command-line overrides, applied on top of every other source.
#[derive(Debug, Default, Parser)]
#[command(name = "tender")]
#[command(about = "User signup and listing HTTP service")]
pub struct Cli {
    /// Listen address, e.g. `127.0.0.1:8080` (overrides host and port)
    #[arg(long)]
    pub addr: Option<String>,
}

/// Resolved runtime configuration.
///
/// Layering, lowest to highest priority: built-in defaults, `TENDER_*`
/// environment variables, the bare `PORT` and `DATABASE_URL` variables, then
/// the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub loglevel: String,
    /// Total connection attempts at boot, the first one included.
    pub connect_max_attempts: u32,
    pub connect_backoff_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
    /// Full listen address; wins over `host`/`port` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://tender.db".to_string(),
            host: "0.0.0.0".to_string(),
            port: 4000,
            loglevel: "info".to_string(),
            connect_max_attempts: 15,
            connect_backoff_secs: 5,
            read_timeout_secs: 5,
            write_timeout_secs: 10,
            idle_timeout_secs: 60,
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.map(String::from).to_vec(),
            addr: None,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("TENDER_"))
            .merge(Env::raw().only(&["port", "database_url"]))
    }

    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        let mut figment = Self::figment();
        if let Some(addr) = &cli.addr {
            figment = figment.merge(Serialized::default("addr", addr));
        }
        figment.extract()
    }

    pub fn listen_addr(&self) -> String {
        match &self.addr {
            Some(addr) => addr.clone(),
            None => format!("{}:{}", self.host, self.port),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.connect_max_attempts,
            backoff: Duration::from_secs(self.connect_backoff_secs),
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
