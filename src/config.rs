//! Application-level configuration loading, including the phrase pool catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexSet;
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BINGO_BACK_CONFIG_PATH";
/// Environment variable that overrides the configured SQLite URL.
const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable that overrides the configured admin token.
const ADMIN_TOKEN_ENV: &str = "BINGO_ADMIN_TOKEN";
const DEFAULT_DATABASE_URL: &str = "sqlite://bingo.db";
const DEFAULT_BROADCAST_CAPACITY: usize = 64;
/// One week.
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Where boards are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Relational storage in a SQLite database.
    Sqlite {
        /// `sqlite://` connection URL.
        url: String,
        /// Pool size; the driver default applies when unset.
        max_connections: Option<u32>,
    },
    /// Process memory; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    phrases: Vec<String>,
    storage: StorageConfig,
    admin_token: Option<String>,
    broadcast_capacity: usize,
    session_ttl: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        phrases = app_config.phrases.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    /// Configuration for tests and embedded use: built-in phrases, memory storage.
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig::Memory,
            ..Self::default()
        }
    }

    /// Replace the phrase catalog (duplicates and blank entries are dropped).
    pub fn with_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phrases = normalize_phrases(phrases.into_iter().map(Into::into));
        self
    }

    /// Set or clear the token guarding the maintenance endpoints.
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|token| !token.is_empty());
        self
    }

    /// Override how long issued session tokens stay valid.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Phrase catalog seeded into the phrase pool.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Selected storage backend.
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Token expected in `X-Admin-Token`; maintenance endpoints are disabled without one.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// Capacity of the live update channel before slow viewers start skipping events.
    pub fn broadcast_capacity(&self) -> usize {
        self.broadcast_capacity
    }

    /// Lifetime of a session token, counted from login.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env::var(DATABASE_URL_ENV).ok().filter(|url| !url.is_empty()) {
            let max_connections = match &self.storage {
                StorageConfig::Sqlite {
                    max_connections, ..
                } => *max_connections,
                StorageConfig::Memory => None,
            };
            info!("using database url from {DATABASE_URL_ENV}");
            self.storage = StorageConfig::Sqlite {
                url,
                max_connections,
            };
        }
        if let Ok(token) = env::var(ADMIN_TOKEN_ENV) {
            self = self.with_admin_token(Some(token));
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            phrases: normalize_phrases(default_phrases().into_iter().map(String::from)),
            storage: StorageConfig::Sqlite {
                url: DEFAULT_DATABASE_URL.to_owned(),
                max_connections: None,
            },
            admin_token: None,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    phrases: Option<Vec<String>>,
    #[serde(default)]
    storage: Option<RawStorage>,
    #[serde(default)]
    admin_token: Option<String>,
    #[serde(default)]
    broadcast_capacity: Option<usize>,
    #[serde(default)]
    session_ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// JSON representation of the `storage` section.
enum RawStorage {
    Sqlite {
        url: String,
        #[serde(default)]
        max_connections: Option<u32>,
    },
    Memory,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let phrases = value
            .phrases
            .map(|phrases| normalize_phrases(phrases.into_iter()))
            .unwrap_or(defaults.phrases);
        let storage = match value.storage {
            Some(RawStorage::Sqlite {
                url,
                max_connections,
            }) => StorageConfig::Sqlite {
                url,
                max_connections,
            },
            Some(RawStorage::Memory) => StorageConfig::Memory,
            None => defaults.storage,
        };

        Self {
            phrases,
            storage,
            admin_token: value.admin_token.filter(|token| !token.is_empty()),
            broadcast_capacity: value
                .broadcast_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_BROADCAST_CAPACITY),
            session_ttl: Duration::from_secs(
                value
                    .session_ttl_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_SESSION_TTL_SECS),
            ),
        }
    }
}

/// Trim, drop blanks and drop duplicates while keeping the catalog order.
fn normalize_phrases(phrases: impl Iterator<Item = String>) -> Vec<String> {
    phrases
        .map(|phrase| phrase.trim().to_owned())
        .filter(|phrase| !phrase.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in phrase catalog shipped with the binary.
fn default_phrases() -> [&'static str; 30] {
    [
        "Someone says \"you're on mute\"",
        "Audio cuts out",
        "Host mispronounces a name",
        "Surprise guest appears",
        "Standing ovation",
        "Someone thanks their mom",
        "Wardrobe malfunction",
        "Camera shows the wrong person",
        "Speech runs over time",
        "Music plays someone off",
        "Technical difficulties slide",
        "Awkward silence",
        "Someone trips on stage",
        "Inside joke nobody gets",
        "Crowd chants a name",
        "Mic feedback squeal",
        "Teleprompter misread",
        "Host changes outfit",
        "Celebrity cameo video",
        "Someone cries on stage",
        "Political remark",
        "Bleeped word",
        "Confetti cannon",
        "Reaction shot of a bored guest",
        "Tribute montage",
        "Someone forgets their notes",
        "Surprise engagement",
        "Sponsor plug",
        "Host breaks character",
        "Lights go out",
    ]
}
