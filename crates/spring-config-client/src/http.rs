//! HTTP client with basic authentication and failover
//!
//! Talks to one or more Spring Cloud Config servers. Servers are tried in the
//! order they were configured; a transport error or a 5xx response moves on to
//! the next server, any other error status is returned as is.

use std::{sync::RwLock, time::Duration};

use percent_encoding::percent_decode_str;
use reqwest::{Client, Response, header::ACCEPT};
use tracing::{debug, error, warn};
use url::Url;

use crate::configuration::{Format, SpringCloudClientConfiguration};
use crate::error::{ClientError, Result};
use crate::model::ConfigServerResponse;

/// Placeholder the server expects instead of `/` inside a label
const LABEL_SLASH_ESCAPE: &str = "(_)";

/// One config server with the credentials used for it
#[derive(Clone, Debug)]
struct ServerEndpoint {
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl ServerEndpoint {
    /// Credentials embedded in the uri are used when none are configured
    fn parse(uri: &str, username: Option<&str>, password: Option<&str>) -> Result<Self> {
        let invalid = |reason: String| ClientError::InvalidUri {
            uri: uri.to_string(),
            reason,
        };

        let mut base_url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("uri cannot be a base".to_string()));
        }

        let mut username = username.map(str::to_string);
        let mut password = password.map(str::to_string);

        if !base_url.username().is_empty() {
            if username.is_none() {
                username = Some(decode_userinfo(base_url.username()).map_err(&invalid)?);
                password = base_url
                    .password()
                    .map(decode_userinfo)
                    .transpose()
                    .map_err(&invalid)?;
            }
            base_url
                .set_username("")
                .map_err(|_| invalid("cannot strip username".to_string()))?;
            base_url
                .set_password(None)
                .map_err(|_| invalid("cannot strip password".to_string()))?;
        }

        Ok(Self {
            base_url,
            username,
            password,
        })
    }

    fn url(&self, segments: &[String]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// HTTP client for the config server endpoints
pub struct SpringCloudHttpClient {
    client: Client,
    servers: Vec<ServerEndpoint>,
    current_server_index: RwLock<usize>,
}

impl SpringCloudHttpClient {
    /// Create a new HTTP client from the client configuration
    pub fn new(configuration: &SpringCloudClientConfiguration) -> Result<Self> {
        let uris = configuration.server_uris();
        if uris.is_empty() {
            return Err(ClientError::InvalidUri {
                uri: configuration.uri().unwrap_or_default().to_string(),
                reason: "no config server uri configured".to_string(),
            });
        }

        let servers = uris
            .iter()
            .map(|uri| {
                ServerEndpoint::parse(uri, configuration.username(), configuration.password())
            })
            .collect::<Result<Vec<_>>>()?;

        let pool = configuration.connection_pool();
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(configuration.connect_timeout_ms()))
            .timeout(Duration::from_millis(configuration.read_timeout_ms()));

        if let Some(max_idle) = pool.max_idle_per_host() {
            builder = builder.pool_max_idle_per_host(max_idle);
        }
        if let Some(idle_timeout_ms) = pool.idle_timeout_ms {
            builder = builder.pool_idle_timeout(Duration::from_millis(idle_timeout_ms));
        }

        Ok(Self {
            client: builder.build()?,
            servers,
            current_server_index: RwLock::new(0),
        })
    }

    /// Number of configured servers
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Base url of the server the next request goes to
    pub fn current_server(&self) -> &Url {
        &self.servers[self.current_index()].base_url
    }

    fn current_index(&self) -> usize {
        *self
            .current_server_index
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Switch to the next server (for failover)
    fn switch_to_next_server(&self) {
        let mut index = self
            .current_server_index
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *index = (*index + 1) % self.servers.len();
        debug!("Switched to config server index: {}", *index);
    }

    /// Fetch the environment: `GET /{name}/{profiles}[/{label}]`
    pub async fn get_environment(
        &self,
        name: &str,
        profiles: &[String],
        label: Option<&str>,
    ) -> Result<ConfigServerResponse> {
        let segments = environment_path(name, profiles, label);
        let response = self
            .send_with_failover(&segments, Some("application/json"))
            .await?;
        Ok(response.json::<ConfigServerResponse>().await?)
    }

    /// Fetch a flat document: `GET [/{label}]/{name}-{profiles}.{ext}`
    pub async fn get_document(
        &self,
        name: &str,
        profiles: &[String],
        label: Option<&str>,
        format: Format,
    ) -> Result<String> {
        let segments = document_path(name, profiles, label, format)?;
        let response = self.send_with_failover(&segments, None).await?;
        Ok(response.text().await?)
    }

    /// GET with failover across the configured servers
    async fn send_with_failover(
        &self,
        segments: &[String],
        accept: Option<&str>,
    ) -> Result<Response> {
        let max_retries = self.servers.len();
        let mut last_error = None;

        for _ in 0..max_retries {
            let server = &self.servers[self.current_index()];
            let url = server.url(segments);

            debug!("Fetching remote configuration from {}", url);

            let mut request = self.client.get(url.clone());
            if let Some(accept) = accept {
                request = request.header(ACCEPT, accept);
            }
            if let Some(username) = &server.username {
                request = request.basic_auth(username, server.password.as_ref());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let body = response.text().await.unwrap_or_default();
                    let err = ClientError::RequestFailed {
                        status: status.as_u16(),
                        body,
                    };

                    if status.is_server_error() {
                        warn!(
                            "Config server {} returned {}, switching to next server",
                            url, status
                        );
                        self.switch_to_next_server();
                        last_error = Some(err);
                        continue;
                    }

                    error!("Request to {} failed: {}", url, err);
                    return Err(err);
                }
                Err(e) => {
                    warn!("Request to {} failed: {}, switching to next server", url, e);
                    self.switch_to_next_server();
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or(ClientError::AllServersFailed))
    }
}

/// Userinfo is kept percent-encoded by `Url`; credentials are sent decoded
fn decode_userinfo(raw: &str) -> std::result::Result<String, String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| format!("credentials are not valid UTF-8: {}", e))
}

fn escape_label(label: &str) -> String {
    label.replace('/', LABEL_SLASH_ESCAPE)
}

fn environment_path(name: &str, profiles: &[String], label: Option<&str>) -> Vec<String> {
    let mut segments = vec![name.to_string(), profiles.join(",")];
    if let Some(label) = label {
        segments.push(escape_label(label));
    }
    segments
}

fn document_path(
    name: &str,
    profiles: &[String],
    label: Option<&str>,
    format: Format,
) -> Result<Vec<String>> {
    let extension = format.extension().ok_or_else(|| {
        ClientError::InvalidDocument(format!("{} format has no document endpoint", format))
    })?;

    let mut segments = Vec::with_capacity(2);
    if let Some(label) = label {
        segments.push(escape_label(label));
    }
    segments.push(format!("{}-{}.{}", name, profiles.join(","), extension));
    Ok(segments)
}
