use crate::actor::{ActorInterface, ActorProxyErr, ActorReference, IntoActorId};
use crate::transport::ActorTransport;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::Instrument;

/// Local stand-in for a remote actor.
///
/// `A` is the interface the proxy stands in for, usually `dyn Trait` where `Trait` is
/// annotated with [`actor_interface`][crate::actor_interface]. Dynamic proxies use `()`.
pub struct ActorProxy<A: ?Sized> {
    reference: ActorReference,
    transport: Arc<dyn ActorTransport>,
    _a: PhantomData<fn() -> Box<A>>,
}

impl ActorProxy<()> {
    pub fn dynamic(reference: ActorReference, transport: Arc<dyn ActorTransport>) -> Self {
        ActorProxy::new(reference, transport)
    }
}

impl<A: ?Sized> ActorProxy<A> {
    pub fn new(reference: ActorReference, transport: Arc<dyn ActorTransport>) -> Self {
        ActorProxy {
            reference,
            transport,
            _a: PhantomData,
        }
    }

    pub fn reference(&self) -> &ActorReference {
        &self.reference
    }

    pub fn actor_id(&self) -> &str {
        &self.reference.actor_id
    }

    pub fn actor_type(&self) -> &str {
        &self.reference.actor_type
    }

    /// Invokes `method` on the remote actor and returns the response as-is.
    ///
    /// No arguments are sent as an empty body, otherwise the arguments are sent as an
    /// ordered sequence. Transport failures are returned as [`ActorProxyErr::Transport`],
    /// the proxy itself never retries.
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, ActorProxyErr> {
        let actor_type = self.reference.actor_type.as_ref();
        let actor_id = self.reference.actor_id.as_ref();
        let span = tracing::trace_span!("ActorProxy::invoke", actor_type, actor_id, method);

        let body = if args.is_empty() { None } else { Some(args) };

        match self
            .transport
            .invoke(actor_type, actor_id, method, body)
            .instrument(span)
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(target: "ActorProxy", actor_type, actor_id, method, "remote call failed, e={}", &e);
                Err(ActorProxyErr::Transport(e))
            }
        }
    }

    /// Invokes `method` and deserialises the response into `R`
    pub async fn invoke_as<R: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<R, ActorProxyErr> {
        let response = self.invoke(method, args).await?;
        serde_json::from_value(response).map_err(|e| ActorProxyErr::Deserialisation(e.to_string()))
    }
}

impl<A: ?Sized> Clone for ActorProxy<A> {
    fn clone(&self) -> Self {
        ActorProxy::new(self.reference.clone(), self.transport.clone())
    }
}

impl<A: ?Sized> Debug for ActorProxy<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorProxy")
            .field("actor_type", &self.reference.actor_type)
            .field("actor_id", &self.reference.actor_id)
            .finish()
    }
}

/// Creates [`ActorProxy`] instances for a single actor interface
pub struct ActorProxyBuilder<A: ?Sized> {
    default_type_name: String,
    transport: Arc<dyn ActorTransport>,
    _a: PhantomData<fn() -> Box<A>>,
}

impl<A: ?Sized + ActorInterface> ActorProxyBuilder<A> {
    /// Creates a builder whose default remote type name comes from the interface
    pub fn new(transport: Arc<dyn ActorTransport>) -> Self {
        Self::named(A::type_name(), transport)
    }
}

impl<A: ?Sized> ActorProxyBuilder<A> {
    pub fn named(type_name: impl Into<String>, transport: Arc<dyn ActorTransport>) -> Self {
        ActorProxyBuilder {
            default_type_name: type_name.into(),
            transport,
            _a: PhantomData,
        }
    }

    pub fn with_type_name_prefix(mut self, prefix: &str) -> Self {
        self.default_type_name = format!("{}{}", prefix, &self.default_type_name);
        self
    }

    pub fn default_type_name(&self) -> &str {
        &self.default_type_name
    }

    /// Builds a proxy for the actor `actor_id`.
    ///
    /// `actor_type_name` overrides the builder's default type name when provided. Building a
    /// proxy never contacts the remote side.
    pub fn build(&self, actor_id: impl IntoActorId, actor_type_name: Option<&str>) -> ActorProxy<A> {
        let actor_type = actor_type_name.unwrap_or(&self.default_type_name);

        ActorProxy::new(
            ActorReference::new(actor_type, actor_id),
            self.transport.clone(),
        )
    }
}

impl<A: ?Sized> Clone for ActorProxyBuilder<A> {
    fn clone(&self) -> Self {
        ActorProxyBuilder::named(self.default_type_name.clone(), self.transport.clone())
    }
}
