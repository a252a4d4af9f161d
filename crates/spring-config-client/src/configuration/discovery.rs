// Config discovery settings: whether and how remote configuration is read

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Representation requested from the config server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON environment with separate property sources
    #[default]
    Native,
    /// Single merged document rendered as JSON
    Json,
    /// Single merged document rendered as YAML
    #[serde(alias = "yml")]
    Yaml,
    /// Single merged document rendered as Java properties
    Properties,
}

impl Format {
    /// File extension used by the server's flat document endpoint
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Format::Native => None,
            Format::Json => Some("json"),
            Format::Yaml => Some("yml"),
            Format::Properties => Some("properties"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Native => "native",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Properties => "properties",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Format::Native),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "properties" => Ok(Format::Properties),
            other => Err(format!("unknown config format: {}", other)),
        }
    }
}

/// Config discovery configuration (`spring.cloud.config.config.*`)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigDiscoveryConfiguration {
    /// Read remote configuration at all (default: true)
    pub enabled: bool,
    pub format: Format,
}

impl Default for ConfigDiscoveryConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            format: Format::Native,
        }
    }
}

impl ConfigDiscoveryConfiguration {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
