//! Coerce Dapr
//!
//! Bridges applications to a [Dapr] sidecar through two components:
//!
//! - [`PubSubClient`]: a buffered publisher that coalesces individual publish requests
//!   into grouped bulk-publish calls, flushing once a size threshold is reached or a time
//!   window elapses, and draining everything that is still buffered on shutdown.
//! - [`ActorProxy`]: a local stand-in for a remote actor. Every call made through the proxy
//!   becomes a single remote invocation. Typed proxies are generated from a trait
//!   definition with [`actor_interface`].
//!
//! Both components talk to the sidecar through the [`transport`] seams, [`ActorTransport`]
//! and [`PubSubTransport`]. The `http` feature (enabled by default) provides
//! [`SidecarClient`], an implementation backed by the sidecar's HTTP API.
//!
//! [Dapr]: https://dapr.io
//! [`PubSubClient`]: pubsub::PubSubClient
//! [`ActorProxy`]: actor::ActorProxy
//! [`ActorTransport`]: transport::ActorTransport
//! [`PubSubTransport`]: transport::PubSubTransport
//! [`SidecarClient`]: transport::http::SidecarClient

#[macro_use]
extern crate async_trait;

#[macro_use]
extern crate serde;

#[macro_use]
extern crate tracing;

pub mod actor;
pub mod config;
pub mod pubsub;
pub mod transport;

pub use async_trait::async_trait;
pub use coerce_dapr_macros::actor_interface;
pub use serde_json;
