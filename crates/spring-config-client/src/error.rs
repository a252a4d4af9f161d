//! Client error types for the Spring Cloud Config SDK

/// Error type for config server client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("invalid config server uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("all config servers failed")]
    AllServersFailed,

    #[error("application name not configured")]
    MissingApplicationName,

    #[error("invalid config document: {0}")]
    InvalidDocument(String),

    #[error("could not locate remote configuration: {0}")]
    FailFast(#[source] Box<ClientError>),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::AllServersFailed;
        assert_eq!(err.to_string(), "all config servers failed");

        let err = ClientError::RequestFailed {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "request failed with status 404: not found");

        let err = ClientError::InvalidUri {
            uri: "::".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config server uri '::': relative URL without a base"
        );
    }

    #[test]
    fn test_fail_fast_wraps_cause() {
        let err = ClientError::FailFast(Box::new(ClientError::MissingApplicationName));
        assert_eq!(
            err.to_string(),
            "could not locate remote configuration: application name not configured"
        );

        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("application name not configured"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ClientError = parse_err.into();
        assert!(matches!(err, ClientError::Serialization(_)));
    }
}
