//! Client configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::state::session::SessionRequest;

/// Server address used when `GRADIAN_SERVER_URL` is not set.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";

/// Default number of queued dispatch commands per session.
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Default time allowed for a session task to finish closing.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Server base address; sessions live under `<base>/join/..` and
    /// `<base>/create/..`
    pub base_url: Url,

    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,

    #[serde(default = "default_close_timeout")]
    pub close_timeout: Duration,
}

fn default_command_capacity() -> usize {
    DEFAULT_COMMAND_CAPACITY
}

fn default_close_timeout() -> Duration {
    DEFAULT_CLOSE_TIMEOUT
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "ws" | "wss" => {}
            other => return Err(ConfigError::InvalidScheme(other.to_string())),
        }
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::CannotBeABase(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        })
    }

    /// Read `GRADIAN_SERVER_URL`, `GRADIAN_COMMAND_CAPACITY` and
    /// `GRADIAN_CLOSE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("GRADIAN_SERVER_URL")
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Ok(Self::new(&base_url)?
            .with_command_capacity(read_usize(
                "GRADIAN_COMMAND_CAPACITY",
                DEFAULT_COMMAND_CAPACITY,
            ))
            .with_close_timeout(Duration::from_millis(read_u64(
                "GRADIAN_CLOSE_TIMEOUT_MS",
                DEFAULT_CLOSE_TIMEOUT.as_millis() as u64,
            ))))
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        // tokio panics on a zero-capacity channel
        self.command_capacity = capacity.max(1);
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// The address a request connects to.
    pub fn request_url(&self, request: &SessionRequest) -> Result<Url, ConfigError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::CannotBeABase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(request.kind.path_segments());
        Ok(url)
    }
}

fn read_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_usize(key: &str, fallback: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(fallback)
}
