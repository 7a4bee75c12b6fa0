use coerce_dapr::config::{ConfigErr, DaprConfig, PubSubConfig, SidecarConfig};
use std::collections::HashMap;
use std::time::Duration;

pub mod util;

#[macro_use]
extern crate async_trait;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    move |key: &str| vars.get(key).cloned()
}

#[test]
pub fn test_defaults() {
    let config = DaprConfig::default();

    assert_eq!(config.sidecar.base_url(), "http://127.0.0.1:3500");
    assert_eq!(config.sidecar.request_timeout(), Duration::from_secs(60));
    assert_eq!(config.pubsub.default_name, "pubsub");
    assert_eq!(config.pubsub.buffer_size, 10);
    assert_eq!(config.pubsub.buffer_time_span(), Duration::from_secs(1));
    assert_eq!(config.actors.type_name_prefix, None);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
pub fn test_env_overrides_sidecar() {
    let config = DaprConfig::default()
        .with_env_from(lookup(&[
            ("DAPR_HOST", "dapr-sidecar"),
            ("DAPR_HTTP_PORT", "3600"),
            ("DAPR_API_TOKEN", "secret"),
        ]))
        .unwrap();

    assert_eq!(config.sidecar.base_url(), "http://dapr-sidecar:3600");
    assert_eq!(config.sidecar.api_token.as_deref(), Some("secret"));
    assert_eq!(config.pubsub, PubSubConfig::default());
}

#[test]
pub fn test_env_invalid_port() {
    let result = DaprConfig::default().with_env_from(lookup(&[("DAPR_HTTP_PORT", "not-a-port")]));
    assert!(matches!(result, Err(ConfigErr::Invalid(_))));
}

#[test]
pub fn test_empty_env_token_ignored() {
    let mut config = DaprConfig::default();
    config.sidecar.api_token = Some("configured".to_string());

    let config = config
        .with_env_from(lookup(&[("DAPR_API_TOKEN", "")]))
        .unwrap();

    assert_eq!(config.sidecar.api_token, None);
}

#[test]
pub fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("coerce-dapr-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"
        [sidecar]
        host = "10.0.0.5"
        http_port = 3501
        api_token = "abc"

        [pubsub]
        default_name = "kafka-pubsub"
        buffer_size = 50
        buffer_time_span_ms = 250

        [actors]
        type_name_prefix = "orders-"
        "#,
    )
    .unwrap();

    let config = DaprConfig::load(&path);
    let _ = std::fs::remove_file(&path);

    let config = config.unwrap();
    assert_eq!(
        config.sidecar,
        SidecarConfig {
            host: "10.0.0.5".to_string(),
            http_port: 3501,
            api_token: Some("abc".to_string()),
            request_timeout_ms: 60_000,
        }
    );

    assert_eq!(
        config.pubsub,
        PubSubConfig::new("kafka-pubsub", 50, Duration::from_millis(250))
    );

    assert_eq!(config.actors.type_name_prefix.as_deref(), Some("orders-"));
}

#[test]
pub fn test_load_missing_file() {
    let result = DaprConfig::load("/definitely/not/here/dapr.toml");
    assert!(matches!(result, Err(ConfigErr::Io(_))));
}

#[test]
pub fn test_invalid_toml_rejected() {
    assert!(matches!(
        DaprConfig::from_toml("[pubsub\nbuffer_size = 1"),
        Err(ConfigErr::Parse(_))
    ));

    assert!(matches!(
        DaprConfig::from_toml("[pubsub]\nbuffer_size = \"ten\""),
        Err(ConfigErr::Parse(_))
    ));

    assert!(matches!(
        DaprConfig::from_toml("[pubsub]\nbuffer_time_span_ms = 0"),
        Err(ConfigErr::Invalid(_))
    ));
}

#[cfg(feature = "http")]
#[test]
pub fn test_sidecar_client_from_config() {
    use coerce_dapr::transport::http::SidecarClient;

    let mut sidecar = SidecarConfig::default();
    sidecar.host = "dapr".to_string();

    let client = SidecarClient::new(&sidecar).unwrap();
    assert_eq!(client.base_url().as_str(), "http://dapr:3500/");
}
