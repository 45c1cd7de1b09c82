use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use info_screen_core::{FailurePolicy, SessionSettings, DEFAULT_CAPACITY};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("{field} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Daemon settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Where the display feed listens.
    pub listen: SocketAddr,
    /// Base URL of the booking/ticket backend.
    pub backend_url: String,
    pub tickets_path: String,
    pub bookings_path: String,
    /// Deployed display asset to HEAD-probe for redeployments. Unset disables the watchdog.
    pub asset_probe_url: Option<String>,

    pub ticket_poll_seconds: u64,
    pub booking_poll_seconds: u64,
    pub asset_probe_seconds: u64,
    pub request_timeout_seconds: u64,

    /// Tickets per column. Negative reports every column as overflowing.
    pub column_capacity: i64,
    pub failure_policy: FailurePolicy,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8787)),
            backend_url: "http://localhost:9090".to_string(),
            tickets_path: "/api/info-screen/zendesk/tickets".to_string(),
            bookings_path: "/api/info-screen/bookings".to_string(),
            asset_probe_url: None,
            ticket_poll_seconds: 20,
            booking_poll_seconds: 60,
            asset_probe_seconds: 30,
            request_timeout_seconds: 10,
            column_capacity: DEFAULT_CAPACITY,
            failure_policy: FailurePolicy::Clear,
        }
    }
}

impl KioskConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("ticket_poll_seconds", self.ticket_poll_seconds),
            ("booking_poll_seconds", self.booking_poll_seconds),
            ("asset_probe_seconds", self.asset_probe_seconds),
            ("request_timeout_seconds", self.request_timeout_seconds),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::ZeroInterval(*name));
        }

        check_url("backend_url", &self.backend_url)?;
        check_url("tickets_url", &self.tickets_url())?;
        check_url("bookings_url", &self.bookings_url())?;
        if let Some(url) = &self.asset_probe_url {
            check_url("asset_probe_url", url)?;
        }
        Ok(())
    }

    pub fn tickets_url(&self) -> String {
        join_url(&self.backend_url, &self.tickets_path)
    }

    pub fn bookings_url(&self) -> String {
        join_url(&self.backend_url, &self.bookings_path)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            capacity: self.column_capacity,
            failure_policy: self.failure_policy,
        }
    }

    pub fn ticket_poll_interval(&self) -> Duration {
        Duration::from_secs(self.ticket_poll_seconds)
    }

    pub fn booking_poll_interval(&self) -> Duration {
        Duration::from_secs(self.booking_poll_seconds)
    }

    pub fn asset_probe_interval(&self) -> Duration {
        Duration::from_secs(self.asset_probe_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        })
}
