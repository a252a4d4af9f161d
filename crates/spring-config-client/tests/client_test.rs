//! Spring Config Client HTTP Tests
//!
//! Exercises the client against a mock config server.

use serde_json::json;
use spring_config_client::{
    ClientError, ConfigDiscoveryConfiguration, Format, SpringCloudClientConfiguration,
    SpringCloudConfigClient,
};
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn environment_body() -> serde_json::Value {
    json!({
        "name": "orders",
        "profiles": ["dev"],
        "label": "main",
        "version": "abc123",
        "state": null,
        "propertySources": [
            {"name": "orders-dev.yml", "source": {"vat.rate": "21", "region": "eu"}},
            {"name": "orders.yml", "source": {"vat.rate": "7.7", "currency": "EUR"}}
        ]
    })
}

fn client_config(uri: &str) -> SpringCloudClientConfiguration {
    SpringCloudClientConfiguration::with_server(uri)
        .with_name("orders")
        .with_profile("dev")
        .with_timeouts(1000, 2000)
}

#[tokio::test]
async fn test_fetch_environment() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/dev/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = SpringCloudConfigClient::new(client_config(&server.uri()).with_label("main"))?;
    let response = client.fetch().await?;

    assert_eq!(response.name, "orders");
    assert_eq!(response.label.as_deref(), Some("main"));
    assert_eq!(response.property_sources.len(), 2);
    assert_eq!(response.property_sources[0].name, "orders-dev.yml");
    Ok(())
}

#[tokio::test]
async fn test_load_resolves_by_precedence() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .mount(&server)
        .await;

    let client = SpringCloudConfigClient::new(client_config(&server.uri()))?;
    let environment = client.load().await?.expect("environment should be located");

    assert_eq!(environment.get("vat.rate"), Some("21"));
    assert_eq!(environment.get("currency"), Some("EUR"));
    assert_eq!(environment.version(), Some("abc123"));
    Ok(())
}

#[tokio::test]
async fn test_default_profile_requested() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = SpringCloudClientConfiguration::with_server(&server.uri()).with_name("orders");
    let client = SpringCloudConfigClient::new(config)?;
    client.fetch().await?;
    Ok(())
}

#[tokio::test]
async fn test_label_with_slash_is_escaped() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/dev/feature(_)vat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        SpringCloudConfigClient::new(client_config(&server.uri()).with_label("feature/vat"))?;
    client.fetch().await?;
    Ok(())
}

#[tokio::test]
async fn test_basic_auth_sent() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/dev"))
        .and(basic_auth("reader", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = client_config(&server.uri()).with_credentials("reader", "secret");
    let client = SpringCloudConfigClient::new(config)?;
    client.fetch().await?;
    Ok(())
}

#[tokio::test]
async fn test_uri_credentials_are_decoded() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/dev"))
        .and(basic_auth("us@er", "p@ss:word"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server
        .uri()
        .replacen("http://", "http://us%40er:p%40ss%3Aword@", 1);
    let client = SpringCloudConfigClient::new(client_config(&uri))?;
    client.fetch().await?;
    Ok(())
}

#[tokio::test]
async fn test_failover_to_next_server() -> anyhow::Result<()> {
    let failing = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&failing)
        .await;

    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(1)
        .mount(&healthy)
        .await;

    let uri = format!("{},{}", failing.uri(), healthy.uri());
    let client = SpringCloudConfigClient::new(client_config(&uri))?;
    let response = client.fetch().await?;

    assert_eq!(response.name, "orders");
    assert!(client
        .http_client()
        .current_server()
        .as_str()
        .starts_with(&healthy.uri()));
    Ok(())
}

#[tokio::test]
async fn test_client_error_does_not_fail_over() -> anyhow::Result<()> {
    let first = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such application"))
        .expect(1)
        .mount(&first)
        .await;

    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(0)
        .mount(&second)
        .await;

    let uri = format!("{},{}", first.uri(), second.uri());
    let client = SpringCloudConfigClient::new(client_config(&uri))?;
    let result = client.fetch().await;

    match result {
        Err(ClientError::RequestFailed { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such application");
        }
        other => panic!("expected RequestFailed, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_fail_fast_returns_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = SpringCloudConfigClient::new(client_config(&server.uri()).with_fail_fast(true))?;
    let result = client.load().await;

    assert!(matches!(result, Err(ClientError::FailFast(_))));
    Ok(())
}

#[tokio::test]
async fn test_fail_soft_continues_without_remote_config() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = SpringCloudConfigClient::new(client_config(&server.uri()))?;
    let environment = client.load().await?;

    assert!(environment.is_none());
    Ok(())
}

#[tokio::test]
async fn test_disabled_client_makes_no_request() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(environment_body()))
        .expect(0)
        .mount(&server)
        .await;

    let client = SpringCloudConfigClient::new(client_config(&server.uri()).with_enabled(false))?;
    assert!(client.load().await?.is_none());

    let config = client_config(&server.uri())
        .with_discovery(ConfigDiscoveryConfiguration::default().with_enabled(false));
    assert!(SpringCloudConfigClient::locate(config).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_application_name() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    let config = SpringCloudClientConfiguration::with_server(&server.uri()).with_fail_fast(true);
    let client = SpringCloudConfigClient::new(config)?;

    assert!(matches!(
        client.fetch().await,
        Err(ClientError::MissingApplicationName)
    ));
    assert!(matches!(client.load().await, Err(ClientError::FailFast(_))));
    Ok(())
}

#[tokio::test]
async fn test_locate_with_invalid_uri() -> anyhow::Result<()> {
    let config = client_config("not a uri");
    assert!(SpringCloudConfigClient::locate(config).await?.is_none());

    let config = client_config("not a uri").with_fail_fast(true);
    let result = SpringCloudConfigClient::locate(config).await;
    assert!(matches!(result, Err(ClientError::FailFast(_))));
    Ok(())
}

#[tokio::test]
async fn test_load_yaml_document() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/main/orders-dev.yml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("vat:\n  rate: 21\n  country: Spain\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = client_config(&server.uri())
        .with_label("main")
        .with_discovery(ConfigDiscoveryConfiguration::default().with_format(Format::Yaml));
    let environment = SpringCloudConfigClient::locate(config)
        .await?
        .expect("environment should be located");

    assert_eq!(environment.property_sources().len(), 1);
    assert_eq!(environment.property_sources()[0].name, "orders-dev.yml");
    assert_eq!(environment.get("vat.rate"), Some("21"));
    assert_eq!(environment.get("vat.country"), Some("Spain"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_properties_document() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders-dev.properties"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("vat.rate: 21\nregion: eu\nurl=http\\://x\ngreeting=caf\\u00e9\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = SpringCloudConfigClient::new(client_config(&server.uri()))?;
    let source = client.fetch_document(Format::Properties).await?;

    assert_eq!(source.name, "orders-dev.properties");
    assert_eq!(source.get("region"), Some("eu"));
    assert_eq!(source.get("url"), Some("http://x"));
    assert_eq!(source.get("greeting"), Some("caf\u{e9}"));
    Ok(())
}
