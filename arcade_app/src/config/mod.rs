use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub mod setup;
#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize)]
pub struct ArcadeConfig {
    #[serde(default)]
    pub games: GamesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub log: LogConfig,
}

const fn default_idle_timeout_secs() -> NonZeroU64 {
    NonZeroU64::new(60).expect("60 is non-zero")
}

const fn default_settle_delay_ms() -> u64 {
    1500
}

const fn default_page_size() -> NonZeroUsize {
    NonZeroUsize::new(10).expect("10 is non-zero")
}

#[derive(Debug, Deserialize)]
pub struct GamesConfig {
    /// Fallback idle window for guilds that didn't set their own.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: NonZeroU64,
    /// How long a memory mismatch stays face-up.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Entries per leaderboard page.
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroUsize,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            page_size: default_page_size(),
        }
    }
}

impl GamesConfig {
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.get())
    }

    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file for persistent data. Data is kept in memory only without it.
    pub path: Option<PathBuf>,
}

const fn default_guild_id() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_guild_id")]
    pub guild_id: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            guild_id: default_guild_id(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    /// Whether to route panics through the logger.
    #[serde(default)]
    pub panic: bool,
    #[serde(default)]
    pub log4rs: log4rs::config::RawConfig,
}
