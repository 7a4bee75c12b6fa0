use crate::pubsub::message::PublishMessage;
use crate::transport::TransportErr;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::marker::PhantomData;

/// Receives every group of messages that could not be delivered.
///
/// Buffered publishes are fire-and-forget, so the registered handler is the only place
/// their failures can be observed. No retry happens after the handler returns.
///
/// The handler runs on the buffer task, and the next flush waits for it to return. It must
/// not await [`PubSubClient::on_shutdown`][super::PubSubClient::on_shutdown], which waits on
/// that same task and would never resolve. Spawn the call instead.
#[async_trait]
pub trait PublishErrorHandler: 'static + Send + Sync {
    async fn on_error(&self, messages: Vec<PublishMessage>, error: TransportErr);
}

pub(crate) struct FnErrorHandler<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnErrorHandler<F, Fut> {
    pub(crate) fn new(f: F) -> Self {
        FnErrorHandler {
            f,
            _fut: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> PublishErrorHandler for FnErrorHandler<F, Fut>
where
    F: 'static + Send + Sync + Fn(Vec<PublishMessage>, TransportErr) -> Fut,
    Fut: 'static + Send + Future<Output = ()>,
{
    async fn on_error(&self, messages: Vec<PublishMessage>, error: TransportErr) {
        (self.f)(messages, error).await
    }
}

/// Messages from one group that failed to publish, along with the transport error
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FlushFailure {
    pub messages: Vec<PublishMessage>,
    pub error: TransportErr,
}

/// The error type returned when a publish request is rejected
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub enum PublishErr {
    MissingTopic,
    MissingPubSubName,
    Serialisation(String),
    Transport(TransportErr),
    Stopped,
}

impl Display for PublishErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishErr::MissingTopic => write!(f, "publish rejected, topic is empty"),
            PublishErr::MissingPubSubName => write!(
                f,
                "publish rejected, no pub/sub component name given and no default is configured"
            ),
            PublishErr::Serialisation(e) => write!(f, "failed to serialise payload ({})", e),
            PublishErr::Transport(e) => write!(f, "publish failed ({})", e),
            PublishErr::Stopped => write!(f, "publisher has been shut down"),
        }
    }
}

impl std::error::Error for PublishErr {}

/// The error type returned by [`PubSubClient::on_shutdown`][super::PubSubClient::on_shutdown]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum ShutdownErr {
    AlreadyShutdown,
    WorkerStopped,
    DrainFailed(Vec<FlushFailure>),
}

impl Display for ShutdownErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownErr::AlreadyShutdown => write!(f, "publisher is already shut down"),
            ShutdownErr::WorkerStopped => {
                write!(f, "buffer task stopped before the final flush completed")
            }
            ShutdownErr::DrainFailed(failures) => write!(
                f,
                "final flush failed for {} message(s) in {} group(s)",
                failures.iter().map(|f| f.messages.len()).sum::<usize>(),
                failures.len()
            ),
        }
    }
}

impl std::error::Error for ShutdownErr {}
