// Connection pool settings for the config server HTTP client

use serde::Deserialize;

/// Connection pool configuration (`spring.cloud.config.pool.*`)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConnectionPoolConfiguration {
    /// Keep idle connections for reuse (default: true)
    pub enabled: bool,
    /// Maximum idle connections kept per host
    pub max_connections: Option<usize>,
    /// How long an idle connection is kept, in milliseconds
    pub idle_timeout_ms: Option<u64>,
}

impl Default for ConnectionPoolConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            max_connections: None,
            idle_timeout_ms: None,
        }
    }
}

impl ConnectionPoolConfiguration {
    /// A pool that keeps no idle connections
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    pub fn with_idle_timeout_ms(mut self, idle_timeout_ms: u64) -> Self {
        self.idle_timeout_ms = Some(idle_timeout_ms);
        self
    }

    /// Idle connections allowed per host, `None` means unbounded
    pub fn max_idle_per_host(&self) -> Option<usize> {
        if self.enabled {
            self.max_connections
        } else {
            Some(0)
        }
    }
}
