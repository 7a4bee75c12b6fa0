use crate::actor::{ActorInterface, ActorProxy, ActorProxyBuilder, ActorReference, IntoActorId};
use crate::config::ActorConfig;
use crate::transport::ActorTransport;
use std::sync::Arc;

/// Entry point for creating actor proxies that share one transport and [`ActorConfig`]
#[derive(Clone)]
pub struct ActorClient {
    transport: Arc<dyn ActorTransport>,
    config: ActorConfig,
}

impl ActorClient {
    pub fn new(transport: Arc<dyn ActorTransport>) -> Self {
        Self::with_config(transport, ActorConfig::default())
    }

    pub fn with_config(transport: Arc<dyn ActorTransport>, config: ActorConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// Returns a builder for the interface `A`, with the configured type name prefix applied
    pub fn builder<A: ?Sized + ActorInterface>(&self) -> ActorProxyBuilder<A> {
        let builder = ActorProxyBuilder::new(self.transport.clone());
        match &self.config.type_name_prefix {
            Some(prefix) => builder.with_type_name_prefix(prefix),
            None => builder,
        }
    }

    pub fn get_actor<A: ?Sized + ActorInterface>(&self, actor_id: impl IntoActorId) -> ActorProxy<A> {
        self.builder::<A>().build(actor_id, None)
    }

    /// Returns an untyped proxy, for calling methods that aren't part of any interface
    pub fn get_dynamic(&self, actor_type: &str, actor_id: impl IntoActorId) -> ActorProxy<()> {
        ActorProxy::dynamic(
            ActorReference::new(actor_type, actor_id),
            self.transport.clone(),
        )
    }
}
