//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the gateway,
//! loaded via the `config` crate from environment variables. Invalid
//! configuration aborts startup before any route is registered.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public base URL of this deployment; callback URLs derive from it.
    pub base_url: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionSettings,

    /// Redirect targets after the auth flows finish.
    #[serde(default)]
    pub paths: PathSettings,

    /// Providers to activate with credentials.
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Session lifetime in minutes.
    #[serde(default = "default_session_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Interval between expiry-sweeper runs, in seconds.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP
    /// development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Where browsers are sent after each flow completes.
#[derive(Debug, Clone, Deserialize)]
pub struct PathSettings {
    /// After a successful login callback.
    #[serde(default = "default_path")]
    pub after_login: String,

    /// After logout.
    #[serde(default = "default_path")]
    pub after_logout: String,

    /// After refetch and account-linking callbacks.
    #[serde(default = "default_path")]
    pub profile: String,
}

/// Credentials for one activated provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Catalog slug.
    pub slug: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Discovery/source URL, mandatory for some providers.
    #[serde(default)]
    pub source: Option<String>,
    /// Extra scopes merged with the provider defaults.
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_session_ttl_minutes() -> i64 {
    60
}

fn default_sweep_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

fn default_path() -> String {
    "/".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: default_session_ttl_minutes(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            after_login: default_path(),
            after_logout: default_path(),
            profile: default_path(),
        }
    }
}

impl Settings {
    /// Loads configuration from the file named by `GATEHOUSE_CONFIG` (if
    /// set) and from `GATEHOUSE__*` environment variables, which override
    /// the file. Provider credentials usually live in the file; scalars are
    /// convenient to override per environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var("GATEHOUSE_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path));
        }
        builder
            .add_source(
                config::Environment::default()
                    .prefix("GATEHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
