//! Spring Cloud Config client
//!
//! Resolves the application name and profiles from the client configuration,
//! fetches the remote environment and applies the fail-fast policy.

use tracing::{debug, error, info, warn};

use crate::configuration::{Format, SpringCloudClientConfiguration};
use crate::environment::RemoteEnvironment;
use crate::error::{ClientError, Result};
use crate::format::parse_document;
use crate::http::SpringCloudHttpClient;
use crate::model::{ConfigServerPropertySource, ConfigServerResponse};

/// Client for reading remote configuration from a Spring Cloud Config server
pub struct SpringCloudConfigClient {
    configuration: SpringCloudClientConfiguration,
    http_client: SpringCloudHttpClient,
}

impl SpringCloudConfigClient {
    /// Create a new client; fails when the server uri is invalid
    pub fn new(configuration: SpringCloudClientConfiguration) -> Result<Self> {
        let http_client = SpringCloudHttpClient::new(&configuration)?;
        Ok(Self {
            configuration,
            http_client,
        })
    }

    /// Build a client and load the remote environment in one step.
    ///
    /// Errors while building the client follow the same fail-fast policy as
    /// errors while fetching.
    pub async fn locate(
        configuration: SpringCloudClientConfiguration,
    ) -> Result<Option<RemoteEnvironment>> {
        if !is_active(&configuration) {
            return Ok(None);
        }

        let fail_fast = configuration.is_fail_fast();
        match Self::new(configuration) {
            Ok(client) => client.load().await,
            Err(e) => on_failure(fail_fast, e),
        }
    }

    pub fn configuration(&self) -> &SpringCloudClientConfiguration {
        &self.configuration
    }

    pub fn http_client(&self) -> &SpringCloudHttpClient {
        &self.http_client
    }

    fn application_name(&self) -> Result<&str> {
        self.configuration
            .name()
            .filter(|name| !name.trim().is_empty())
            .ok_or(ClientError::MissingApplicationName)
    }

    /// Fetch the environment with its separate property sources
    pub async fn fetch(&self) -> Result<ConfigServerResponse> {
        let name = self.application_name()?;
        let profiles = self.configuration.profiles();
        let label = self.configuration.label();

        debug!(
            "Fetching environment: name={}, profiles={:?}, label={:?}",
            name, profiles, label
        );

        self.http_client
            .get_environment(name, &profiles, label)
            .await
    }

    /// Fetch the merged environment as a single flat document
    pub async fn fetch_document(&self, format: Format) -> Result<ConfigServerPropertySource> {
        let name = self.application_name()?;
        let profiles = self.configuration.profiles();
        let label = self.configuration.label();

        let content = self
            .http_client
            .get_document(name, &profiles, label, format)
            .await?;

        let document_name = match format.extension() {
            Some(ext) => format!("{}-{}.{}", name, profiles.join(","), ext),
            None => name.to_string(),
        };
        parse_document(&document_name, format, &content)
    }

    async fn fetch_environment(&self) -> Result<RemoteEnvironment> {
        match self.configuration.discovery().format {
            Format::Native => Ok(self.fetch().await?.into()),
            format => {
                let source = self.fetch_document(format).await?;
                let name = self.application_name()?;
                Ok(RemoteEnvironment::new(
                    name,
                    self.configuration.profiles(),
                    vec![source],
                ))
            }
        }
    }

    /// Load the remote environment.
    ///
    /// Returns `Ok(None)` when the client or config discovery is disabled, or
    /// when the server cannot be reached and fail-fast is off.
    pub async fn load(&self) -> Result<Option<RemoteEnvironment>> {
        if !is_active(&self.configuration) {
            return Ok(None);
        }

        match self.fetch_environment().await {
            Ok(environment) => {
                info!(
                    "Located environment: name={}, profiles={:?}, label={:?}, version={:?}, \
                     sources={}",
                    environment.name(),
                    environment.profiles(),
                    environment.label(),
                    environment.version(),
                    environment.property_sources().len()
                );
                Ok(Some(environment))
            }
            Err(e) => on_failure(self.configuration.is_fail_fast(), e),
        }
    }
}

fn is_active(configuration: &SpringCloudClientConfiguration) -> bool {
    if !configuration.is_enabled() {
        debug!("Spring Cloud Config client is disabled");
        return false;
    }
    if !configuration.discovery().enabled {
        debug!("Remote config discovery is disabled");
        return false;
    }
    true
}

fn on_failure(fail_fast: bool, err: ClientError) -> Result<Option<RemoteEnvironment>> {
    if fail_fast {
        error!("Could not locate remote configuration: {}", err);
        Err(ClientError::FailFast(Box::new(err)))
    } else {
        warn!(
            "Could not locate remote configuration, continuing without it: {}",
            err
        );
        Ok(None)
    }
}
