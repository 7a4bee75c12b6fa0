//! Buffered publisher
//!
//! [`PubSubClient`] accepts individual publish requests and hands them to a buffer task,
//! which flushes them once `buffer_size` messages are waiting or `buffer_time_span` has
//! elapsed, whichever comes first. A flush groups messages by pub/sub component, topic and
//! producer id, so a group of several messages costs a single bulk publish.
//!
//! Buffered publishes never report errors to the caller. Register a
//! [`PublishErrorHandler`] to observe failed flushes, and call
//! [`PubSubClient::on_shutdown`] before exiting so nothing left in the buffer is lost.
use crate::config::PubSubConfig;
use crate::pubsub::buffer::{BufferCommand, PublishBuffer};
use crate::pubsub::dispatch::Dispatcher;
use crate::pubsub::error::FnErrorHandler;
use crate::transport::{PubSubTransport, TransportErr};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

mod buffer;
mod dispatch;

pub mod error;
pub mod message;
pub mod metrics;

pub use error::{FlushFailure, PublishErr, PublishErrorHandler, ShutdownErr};
pub use message::{group_messages, GroupKey, Publish, PublishBulk, PublishMessage};
pub use metrics::PublisherMetrics;

#[derive(Clone)]
pub struct PubSubClient {
    inner: Arc<PubSubClientInner>,
}

struct PubSubClientInner {
    default_name: String,
    sender: UnboundedSender<BufferCommand>,
    dispatcher: Dispatcher,
    flush_trigger: CancellationToken,
    shutdown: AtomicBool,
}

impl PubSubClient {
    /// Creates the client and spawns its buffer task on the current tokio runtime.
    pub fn new(config: PubSubConfig, transport: Arc<dyn PubSubTransport>) -> PubSubClient {
        let metrics = Arc::new(PublisherMetrics::new());
        let dispatcher = Dispatcher::new(transport, metrics);
        let flush_trigger = CancellationToken::new();

        let buffer_size = config.buffer_size.max(1);
        let buffer_time_span = config.buffer_time_span();

        let sender = PublishBuffer::new(
            buffer_size,
            buffer_time_span,
            dispatcher.clone(),
            flush_trigger.clone(),
        )
        .start();

        debug!(
            target: "PubSubClient",
            default_name = config.default_name.as_str(),
            buffer_size,
            buffer_time_span_ms = buffer_time_span.as_millis() as u64,
            "publisher started"
        );

        PubSubClient {
            inner: Arc::new(PubSubClientInner {
                default_name: config.default_name,
                sender,
                dispatcher,
                flush_trigger,
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    pub fn default_name(&self) -> &str {
        &self.inner.default_name
    }

    pub fn metrics(&self) -> &PublisherMetrics {
        self.inner.dispatcher.metrics()
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Installs the handler for failed publishes, replacing any previous one
    pub fn register_error_handler<H: PublishErrorHandler>(&self, handler: H) {
        self.inner.dispatcher.set_error_handler(Arc::new(handler));
    }

    pub fn on_error<F, Fut>(&self, f: F)
    where
        F: 'static + Send + Sync + Fn(Vec<PublishMessage>, TransportErr) -> Fut,
        Fut: 'static + Send + Future<Output = ()>,
    {
        self.register_error_handler(FnErrorHandler::new(f));
    }

    /// Appends a message to the buffer without waiting for it to be flushed.
    ///
    /// The request is always buffered, regardless of [`Publish::is_buffered`].
    pub fn enqueue(&self, publish: Publish) -> Result<(), PublishErr> {
        let message = publish.into_message(&self.inner.default_name)?;
        self.enqueue_message(message)
    }

    fn enqueue_message(&self, message: PublishMessage) -> Result<(), PublishErr> {
        if self.is_shutdown() {
            return Err(PublishErr::Stopped);
        }

        trace!(target: "PubSubClient", topic = message.topic.as_str(), "enqueueing message");

        self.inner
            .sender
            .send(BufferCommand::Enqueue(message))
            .map_err(|_| PublishErr::Stopped)?;

        self.metrics().increment_msgs_enqueued();
        Ok(())
    }

    pub async fn publish(&self, publish: Publish) -> Result<(), PublishErr> {
        if publish.is_buffered() {
            return self.enqueue(publish);
        }

        let message = publish.into_message(&self.inner.default_name)?;
        self.publish_unbuffered(message).await
    }

    /// Publishes several payloads that share a component, topic and producer id.
    ///
    /// A single payload is published immediately, more than one are enqueued individually
    /// and left for the buffer to group.
    pub async fn publish_bulk(&self, bulk: PublishBulk) -> Result<(), PublishErr> {
        let mut messages = bulk.into_messages(&self.inner.default_name)?;
        match messages.len() {
            0 => Ok(()),
            1 => match messages.pop() {
                Some(message) => self.publish_unbuffered(message).await,
                None => Ok(()),
            },
            _ => {
                for message in messages {
                    self.enqueue_message(message)?;
                }

                Ok(())
            }
        }
    }

    async fn publish_unbuffered(&self, message: PublishMessage) -> Result<(), PublishErr> {
        if self.is_shutdown() {
            return Err(PublishErr::Stopped);
        }

        self.inner
            .dispatcher
            .publish_reported(message)
            .await
            .map_err(PublishErr::Transport)
    }

    /// Stops the time-based flush and drains everything left in the buffer.
    ///
    /// Resolves once every message enqueued before this call has been handed to the
    /// transport or reported as failed.
    pub async fn on_shutdown(&self, signal: Option<&str>) -> Result<(), ShutdownErr> {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return Err(ShutdownErr::AlreadyShutdown);
        }

        info!(target: "PubSubClient", signal = signal.unwrap_or("none"), "shutting down publisher");

        self.inner.flush_trigger.cancel();

        let (tx, rx) = oneshot::channel();
        self.inner
            .sender
            .send(BufferCommand::Drain(tx))
            .map_err(|_| ShutdownErr::WorkerStopped)?;

        let report = rx.await.map_err(|_| ShutdownErr::WorkerStopped)?;

        debug!(
            target: "PubSubClient",
            delivered = report.delivered,
            failed_groups = report.failures.len(),
            "publisher drained"
        );

        if report.is_ok() {
            Ok(())
        } else {
            Err(ShutdownErr::DrainFailed(report.failures))
        }
    }
}
