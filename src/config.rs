//! Client configuration.

use crate::authority::RetryPolicy;
use crate::channel::ReconnectPolicy;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strictly_wordgrid::{Language, PlayerId, Role, STANDARD_SIZE, SessionState};
use tracing::{debug, info, instrument};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "STRICTLY_LETTERS_CONFIG";

/// Config file used when neither the flag nor the variable is set.
pub const DEFAULT_CONFIG_FILE: &str = "strictly_letters.toml";

const PLAYER_ID_VAR: &str = "STRICTLY_LETTERS_PLAYER_ID";
const AUTHORITY_URL_VAR: &str = "STRICTLY_LETTERS_AUTHORITY_URL";
const EVENTS_URL_VAR: &str = "STRICTLY_LETTERS_EVENTS_URL";

/// Configuration for one player's client.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Id the authority knows the local player by.
    player_id: PlayerId,

    /// Name shown until the authority sends a roster.
    display_name: String,

    /// Base URL of the authority's request/response API.
    #[serde(default = "default_authority_url")]
    authority_url: String,

    /// WebSocket URL of the push-event channel.
    #[serde(default = "default_events_url")]
    events_url: String,

    /// Language to start new games in.
    #[serde(default)]
    language: Language,

    /// Whether the local player starts out as administrator.
    #[serde(default)]
    administrator: bool,

    /// Board side length.
    #[serde(default = "default_board_size")]
    board_size: usize,

    /// Retry policy for request/response calls.
    #[serde(default)]
    retry: RetrySettings,

    /// Reconnect policy for the push channel.
    #[serde(default)]
    reconnect: ReconnectSettings,
}

fn default_authority_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_events_url() -> String {
    "ws://127.0.0.1:5000/events".to_string()
}

fn default_board_size() -> usize {
    STANDARD_SIZE
}

/// `[retry]` section.
#[derive(Debug, Clone, Copy, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per call, first one included.
    max_attempts: u32,
    /// Delay before the first retry.
    initial_backoff_ms: u64,
    /// Upper bound on the delay between retries.
    max_backoff_ms: u64,
    /// Per-attempt timeout.
    request_timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2000,
            request_timeout_ms: 5000,
        }
    }
}

/// `[reconnect]` section.
#[derive(Debug, Clone, Copy, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    /// Reconnect attempts before giving up.
    max_attempts: u32,
    /// Delay before the first attempt, growing linearly.
    backoff_ms: u64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_ms: 500,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but identity.
    #[instrument(skip(player_id, display_name), fields(player = %player_id))]
    pub fn new(player_id: PlayerId, display_name: String) -> Self {
        Self {
            player_id,
            display_name,
            authority_url: default_authority_url(),
            events_url: default_events_url(),
            language: Language::default(),
            administrator: false,
            board_size: default_board_size(),
            retry: RetrySettings::default(),
            reconnect: ReconnectSettings::default(),
        }
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(player = %config.player_id, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves and loads the config file, then applies environment overrides.
    ///
    /// The file is the explicit path if given, else `$STRICTLY_LETTERS_CONFIG`,
    /// else `strictly_letters.toml` in the working directory.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = Self::resolve_path(explicit, std::env::var(CONFIG_PATH_VAR).ok());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Picks the config file path.
    pub fn resolve_path(explicit: Option<&Path>, from_env: Option<String>) -> PathBuf {
        match (explicit, from_env) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(path)) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Applies environment overrides using the given lookup.
    #[instrument(skip(self, lookup))]
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(PLAYER_ID_VAR) {
            debug!(player = %id, "Overriding player id");
            self.player_id = PlayerId::new(id);
        }
        if let Some(url) = lookup(AUTHORITY_URL_VAR) {
            debug!(url = %url, "Overriding authority URL");
            self.authority_url = url;
        }
        if let Some(url) = lookup(EVENTS_URL_VAR) {
            debug!(url = %url, "Overriding events URL");
            self.events_url = url;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.player_id.as_str().is_empty() {
            return Err(ConfigError::new("player_id must not be empty".to_string()));
        }
        if self.board_size == 0 {
            return Err(ConfigError::new("board_size must be positive".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::new(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Role the local player starts with.
    pub fn initial_role(&self) -> Role {
        if self.administrator {
            Role::Administrator
        } else {
            Role::Member
        }
    }

    /// Fresh session state for this player.
    pub fn initial_state(&self) -> SessionState {
        let mut state =
            SessionState::new(self.player_id.clone(), self.board_size, self.initial_role());
        if self.administrator {
            // Only administrators may pick a language; members keep the default.
            let _ = state.set_language(self.language);
        }
        state
    }

    /// Retry policy for the authority client.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.retry.max_attempts)
            .with_initial_backoff(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_backoff(Duration::from_millis(self.retry.max_backoff_ms))
    }

    /// Per-attempt request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.retry.request_timeout_ms)
    }

    /// Reconnect policy for the push channel.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::default()
            .with_max_attempts(self.reconnect.max_attempts)
            .with_backoff(Duration::from_millis(self.reconnect.backoff_ms))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
