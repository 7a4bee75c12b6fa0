//! Sidecar, pub/sub and actor configuration
//!
//! Configuration is plain data, loadable from TOML and optionally overridden by the
//! environment variables the Dapr runtime injects into the application
//! (`DAPR_HOST`, `DAPR_HTTP_PORT`, `DAPR_API_TOKEN`). Every value is fixed once the
//! component it configures has been created.
//!
//! ```toml
//! [sidecar]
//! host = "127.0.0.1"
//! http_port = 3500
//!
//! [pubsub]
//! default_name = "pubsub"
//! buffer_size = 10
//! buffer_time_span_ms = 1000
//!
//! [actors]
//! type_name_prefix = "orders-"
//! ```
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PUBSUB_NAME: &str = "pubsub";
pub const DEFAULT_BUFFER_SIZE: usize = 10;
pub const DEFAULT_BUFFER_TIME_SPAN_MS: u64 = 1000;

pub const DAPR_HOST_ENV: &str = "DAPR_HOST";
pub const DAPR_HTTP_PORT_ENV: &str = "DAPR_HTTP_PORT";
pub const DAPR_API_TOKEN_ENV: &str = "DAPR_API_TOKEN";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct DaprConfig {
    pub sidecar: SidecarConfig,
    pub pubsub: PubSubConfig,
    pub actors: ActorConfig,
}

/// Where the Dapr sidecar can be reached
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SidecarConfig {
    pub host: String,
    pub http_port: u16,
    pub api_token: Option<String>,
    pub request_timeout_ms: u64,
}

/// Buffered publisher settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PubSubConfig {
    /// Pub/sub component used when a publish request doesn't name one
    pub default_name: String,

    /// Number of buffered messages that triggers an early flush
    pub buffer_size: usize,

    /// Maximum time a message waits in the buffer before being flushed, in milliseconds
    pub buffer_time_span_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ActorConfig {
    /// Prepended to the default type name of every actor proxy created by an `ActorClient`
    pub type_name_prefix: Option<String>,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            http_port: 3500,
            api_token: None,
            request_timeout_ms: 60_000,
        }
    }
}

impl SidecarConfig {
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.http_port)
        } else {
            format!("http://{}:{}", self.host, self.http_port)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_PUBSUB_NAME.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            buffer_time_span_ms: DEFAULT_BUFFER_TIME_SPAN_MS,
        }
    }
}

impl PubSubConfig {
    pub fn new(
        default_name: impl Into<String>,
        buffer_size: usize,
        buffer_time_span: Duration,
    ) -> Self {
        Self {
            default_name: default_name.into(),
            buffer_size,
            buffer_time_span_ms: buffer_time_span.as_millis() as u64,
        }
    }

    pub fn with_default_name(mut self, default_name: impl Into<String>) -> Self {
        self.default_name = default_name.into();
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_buffer_time_span(mut self, buffer_time_span: Duration) -> Self {
        self.buffer_time_span_ms = buffer_time_span.as_millis() as u64;
        self
    }

    pub fn buffer_time_span(&self) -> Duration {
        Duration::from_millis(self.buffer_time_span_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigErr> {
        if self.default_name.trim().is_empty() {
            return Err(ConfigErr::Invalid(
                "pubsub.default_name must not be empty".to_string(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(ConfigErr::Invalid(
                "pubsub.buffer_size must be at least 1".to_string(),
            ));
        }

        if self.buffer_time_span_ms == 0 {
            return Err(ConfigErr::Invalid(
                "pubsub.buffer_time_span_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl DaprConfig {
    pub fn from_toml(source: &str) -> Result<DaprConfig, ConfigErr> {
        let config: DaprConfig =
            toml::from_str(source).map_err(|e| ConfigErr::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<DaprConfig, ConfigErr> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigErr::Io(format!("{} ({})", path.display(), e)))?;

        debug!(path = %path.display(), "loading dapr configuration");
        Self::from_toml(&source)
    }

    /// Overrides the sidecar location with the variables set by the Dapr runtime
    pub fn with_env(self) -> Result<DaprConfig, ConfigErr> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from<F>(mut self, lookup: F) -> Result<DaprConfig, ConfigErr>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(DAPR_HOST_ENV) {
            self.sidecar.host = host;
        }

        if let Some(port) = lookup(DAPR_HTTP_PORT_ENV) {
            self.sidecar.http_port = port.trim().parse().map_err(|_| {
                ConfigErr::Invalid(format!("{} is not a valid port ({})", DAPR_HTTP_PORT_ENV, port))
            })?;
        }

        if let Some(token) = lookup(DAPR_API_TOKEN_ENV) {
            self.sidecar.api_token = Some(token).filter(|t| !t.is_empty());
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigErr> {
        if self.sidecar.host.trim().is_empty() {
            return Err(ConfigErr::Invalid("sidecar.host must not be empty".to_string()));
        }

        self.pubsub.validate()
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum ConfigErr {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl Display for ConfigErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigErr::Io(e) => write!(f, "failed to read configuration: {}", e),
            ConfigErr::Parse(e) => write!(f, "failed to parse configuration: {}", e),
            ConfigErr::Invalid(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigErr {}
