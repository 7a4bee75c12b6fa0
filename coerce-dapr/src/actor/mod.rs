//! Remote Actor Proxies
//!
//! An [`ActorProxy`] is a local stand-in for a remote actor, addressed by an
//! [`ActorReference`] (an actor type name and an actor id). The proxy holds no state besides
//! the reference and the transport: every call is one remote invocation, made lazily at
//! call time, and the proxy never checks whether the remote actor actually exposes the
//! method being called.
//!
//! ## Typed proxies
//! Typed proxies are generated from a trait with [`actor_interface`]. The macro implements
//! the trait for `ActorProxy<dyn Trait>`, forwarding every method to [`ActorProxy::invoke_as`]
//! with the arguments serialised in declaration order.
//!
//! ```rust,ignore
//! use coerce_dapr::actor::{ActorClient, ActorProxyErr};
//! use coerce_dapr::{actor_interface, async_trait};
//!
//! #[actor_interface(name = "CounterActor")]
//! #[async_trait]
//! pub trait Counter {
//!     async fn increment(&self) -> Result<(), ActorProxyErr>;
//!
//!     #[method("getCounter")]
//!     async fn get_counter(&self) -> Result<i64, ActorProxyErr>;
//! }
//!
//! async fn read_counter(client: &ActorClient) -> Result<i64, ActorProxyErr> {
//!     let counter = client.get_actor::<dyn Counter>("counter-1");
//!     counter.increment().await?;
//!     counter.get_counter().await
//! }
//! ```
//!
//! ## Dynamic proxies
//! Methods that are not part of any interface can still be called through
//! [`ActorProxy::invoke`], which takes the method name and the already-serialised arguments.
//!
//! [`actor_interface`]: crate::actor_interface
use crate::transport::TransportErr;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod client;
pub mod proxy;

pub use client::ActorClient;
pub use proxy::{ActorProxy, ActorProxyBuilder};

/// A reference to a string-based `ActorId`
pub type ActorId = Arc<str>;

/// Implemented for `dyn Trait` by [`actor_interface`][crate::actor_interface], supplying the
/// default remote type name of the interface.
pub trait ActorInterface {
    fn type_name() -> &'static str;
}

/// Identifies a single remote actor instance
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
pub struct ActorReference {
    pub actor_type: Arc<str>,
    pub actor_id: ActorId,
}

impl ActorReference {
    pub fn new(actor_type: impl Into<Arc<str>>, actor_id: impl IntoActorId) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id: actor_id.into_actor_id(),
        }
    }
}

impl Display for ActorReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", &self.actor_type, &self.actor_id)
    }
}

/// Trait allowing the conversion of a type into [`ActorId`][ActorId], by consuming the input
pub trait IntoActorId {
    fn into_actor_id(self) -> ActorId;
}

impl<T: ToString + Send + Sync> IntoActorId for T {
    fn into_actor_id(self) -> ActorId {
        self.to_string().into()
    }
}

/// Serialises a single call argument, used by code generated with
/// [`actor_interface`][crate::actor_interface].
pub fn to_argument<T: Serialize + ?Sized>(argument: &T) -> Result<Value, ActorProxyErr> {
    serde_json::to_value(argument).map_err(|e| ActorProxyErr::Serialisation(e.to_string()))
}

/// The error type returned by remote actor calls
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub enum ActorProxyErr {
    Serialisation(String),
    Deserialisation(String),
    Transport(TransportErr),
}

impl From<TransportErr> for ActorProxyErr {
    fn from(e: TransportErr) -> Self {
        ActorProxyErr::Transport(e)
    }
}

impl Display for ActorProxyErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorProxyErr::Serialisation(e) => {
                write!(f, "failed to serialise call arguments ({})", e)
            }
            ActorProxyErr::Deserialisation(e) => {
                write!(f, "failed to deserialise call result ({})", e)
            }
            ActorProxyErr::Transport(e) => write!(f, "remote call failed ({})", e),
        }
    }
}

impl std::error::Error for ActorProxyErr {}
