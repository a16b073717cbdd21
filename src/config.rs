use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent ⇒ run against the in-memory store with seeded demo data.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Where the reorder-notification feed is persisted across restarts.
    pub notifications_path: PathBuf,
    /// Interval of the background reorder sweep, in seconds.
    pub reorder_check_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            notifications_path: std::env::var("NOTIFICATIONS_PATH")
                .unwrap_or_else(|_| "reorder_notifications.json".to_string())
                .into(),
            reorder_check_secs: std::env::var("REORDER_CHECK_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("REORDER_CHECK_SECS must be a valid number")?,
        })
    }
}
