//! Seams to the Dapr sidecar
//!
//! The publisher and the actor proxy never talk to the network directly, they only depend
//! on [`PubSubTransport`] and [`ActorTransport`]. Serialisation of the wire format and any
//! transport-level retries belong to the implementation.
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[cfg(feature = "http")]
pub mod http;

/// Metadata attached to a publish call, sent to the sidecar as `metadata.{key}` parameters.
pub type Metadata = HashMap<String, String>;

/// Metadata key used by pub/sub components to partition (and order) messages
pub const PARTITION_KEY: &str = "partitionKey";

#[async_trait]
pub trait ActorTransport: 'static + Send + Sync {
    /// Invokes `method` on the actor identified by (`actor_type`, `actor_id`).
    ///
    /// `body` is `None` when the call has no arguments, otherwise it holds every argument
    /// in declaration order.
    async fn invoke(
        &self,
        actor_type: &str,
        actor_id: &str,
        method: &str,
        body: Option<Vec<Value>>,
    ) -> Result<Value, TransportErr>;
}

#[async_trait]
pub trait PubSubTransport: 'static + Send + Sync {
    async fn publish(
        &self,
        name: &str,
        topic: &str,
        payload: Value,
        metadata: Option<Metadata>,
    ) -> Result<(), TransportErr>;

    async fn publish_bulk(
        &self,
        name: &str,
        topic: &str,
        payloads: Vec<Value>,
        metadata: Option<Metadata>,
    ) -> Result<(), TransportErr>;
}

/// The error type returned by transport implementations
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub enum TransportErr {
    InvalidEndpoint(String),
    Connection(String),
    Status { code: u16, body: String },
    Serialisation(String),
    Deserialisation(String),
    Remote(String),
}

impl Display for TransportErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportErr::InvalidEndpoint(e) => write!(f, "invalid sidecar endpoint ({})", e),
            TransportErr::Connection(e) => write!(f, "sidecar unreachable ({})", e),
            TransportErr::Status { code, body } => {
                write!(f, "sidecar returned status {} (body={})", code, body)
            }
            TransportErr::Serialisation(e) => write!(f, "serialisation error ({})", e),
            TransportErr::Deserialisation(e) => write!(f, "deserialisation error ({})", e),
            TransportErr::Remote(e) => write!(f, "remote error ({})", e),
        }
    }
}

impl std::error::Error for TransportErr {}
