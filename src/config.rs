use std::net::SocketAddr;

use anyhow::{anyhow, bail, Context};
use simplelog::LevelFilter;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

// Settings read once at startup, immutable afterwards
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_key: String,
    pub listen_addr: SocketAddr,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| anyhow!("$DATABASE_URL is not set"))?;

        let server_key = lookup("SERVER_KEY").ok_or_else(|| anyhow!("$SERVER_KEY is not set"))?;
        if server_key.is_empty() {
            bail!("$SERVER_KEY is empty");
        }

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("$LISTEN_ADDR is not a socket address")?;

        let log_level = match lookup("LOG_LEVEL") {
            Some(level) => level
                .parse::<LevelFilter>()
                .map_err(|_| anyhow!("$LOG_LEVEL is not a log level: {}", level))?,
            None => LevelFilter::Info,
        };

        Ok(Config {
            database_url,
            server_key,
            listen_addr,
            log_level,
        })
    }
}
