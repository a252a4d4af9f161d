//! Spring Cloud Config client - Rust SDK for Spring Cloud Config servers
//!
//! This crate provides:
//! - Client configuration bound from layered sources (file, environment, overrides)
//! - Model types for the config server environment payload
//! - HTTP client with basic authentication and failover across servers
//! - Precedence-ordered resolution of remote property sources
//! - Fail-fast or fail-soft startup when the server cannot be reached

pub mod client;
pub mod configuration;
pub mod environment;
pub mod error;
pub mod format;
pub mod http;
pub mod model;

pub use client::SpringCloudConfigClient;
pub use configuration::{
    ConfigDiscoveryConfiguration, ConfigurationLoader, ConnectionPoolConfiguration, Format,
    SpringCloudClientConfiguration,
};
pub use environment::RemoteEnvironment;
pub use error::ClientError;
pub use http::SpringCloudHttpClient;
pub use model::*;
