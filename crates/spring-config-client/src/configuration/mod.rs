//! Client configuration for Spring Cloud Config
//!
//! `SpringCloudClientConfiguration` mirrors the `spring.cloud.config.*` keys.
//! It owns the connection pool settings and the config discovery settings by
//! value, so both are always present.

pub mod discovery;
pub mod loader;
pub mod pool;

use std::fmt;

use serde::Deserialize;

pub use discovery::{ConfigDiscoveryConfiguration, Format};
pub use loader::ConfigurationLoader;
pub use pool::ConnectionPoolConfiguration;

/// Configuration prefix for the Spring Cloud Config client
pub const PREFIX: &str = "spring.cloud.config";

/// Default config server uri
pub const DEFAULT_URI: &str = "http://localhost:8888";

/// Default value for fail fast
pub const DEFAULT_FAIL_FAST: bool = false;

/// Profile requested when no profile is configured
pub const DEFAULT_PROFILE: &str = "default";

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10000;

/// HTTP client settings for contacting a Spring Cloud Config server
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SpringCloudClientConfiguration {
    enabled: bool,
    uri: Option<String>,
    label: Option<String>,
    fail_fast: bool,
    name: Option<String>,
    profile: Option<String>,
    username: Option<String>,
    password: Option<String>,
    connect_timeout_ms: u64,
    read_timeout_ms: u64,
    pool: ConnectionPoolConfiguration,
    #[serde(rename = "config", alias = "discovery")]
    discovery: ConfigDiscoveryConfiguration,
}

impl Default for SpringCloudClientConfiguration {
    fn default() -> Self {
        Self {
            enabled: false,
            uri: Some(DEFAULT_URI.to_string()),
            label: None,
            fail_fast: DEFAULT_FAIL_FAST,
            name: None,
            profile: None,
            username: None,
            password: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            pool: ConnectionPoolConfiguration::default(),
            discovery: ConfigDiscoveryConfiguration::default(),
        }
    }
}

impl SpringCloudClientConfiguration {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an enabled configuration pointing at the given server uri
    pub fn with_server(uri: &str) -> Self {
        Self {
            enabled: true,
            uri: Some(uri.to_string()),
            ..Default::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_uri(mut self, uri: &str) -> Self {
        self.uri = Some(uri.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the requested profiles (comma separated)
    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }

    /// Set basic authentication credentials
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Set timeouts in milliseconds
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    pub fn with_connection_pool(mut self, pool: ConnectionPoolConfiguration) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_discovery(mut self, discovery: ConfigDiscoveryConfiguration) -> Self {
        self.discovery = discovery;
        self
    }

    /// Whether the config client is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The config server uri, possibly a comma separated list
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// The config server label (git branch, tag or commit)
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether failure to reach the config server is fatal
    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// The application name to request
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn connect_timeout_ms(&self) -> u64 {
        self.connect_timeout_ms
    }

    pub fn read_timeout_ms(&self) -> u64 {
        self.read_timeout_ms
    }

    pub fn connection_pool(&self) -> &ConnectionPoolConfiguration {
        &self.pool
    }

    pub fn discovery(&self) -> &ConfigDiscoveryConfiguration {
        &self.discovery
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_uri(&mut self, uri: Option<String>) {
        self.uri = uri;
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// If set to true an error is returned when configuration cannot be retrieved
    pub fn set_fail_fast(&mut self, fail_fast: bool) {
        self.fail_fast = fail_fast;
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_profile(&mut self, profile: Option<String>) {
        self.profile = profile;
    }

    pub fn set_username(&mut self, username: Option<String>) {
        self.username = username;
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password;
    }

    /// Server uris in failover order.
    ///
    /// A comma separated `uri` yields one entry per server.
    pub fn server_uris(&self) -> Vec<String> {
        self.uri
            .as_deref()
            .map(split_comma_list)
            .unwrap_or_default()
    }

    /// Requested profiles, `["default"]` when none are configured
    pub fn profiles(&self) -> Vec<String> {
        let profiles = self
            .profile
            .as_deref()
            .map(split_comma_list)
            .unwrap_or_default();

        if profiles.is_empty() {
            vec![DEFAULT_PROFILE.to_string()]
        } else {
            profiles
        }
    }
}

impl fmt::Debug for SpringCloudClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpringCloudClientConfiguration")
            .field("enabled", &self.enabled)
            .field("uri", &self.uri)
            .field("label", &self.label)
            .field("fail_fast", &self.fail_fast)
            .field("name", &self.name)
            .field("profile", &self.profile)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "******"))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("pool", &self.pool)
            .field("discovery", &self.discovery)
            .finish()
    }
}

fn split_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
