use crate::pubsub::error::{FlushFailure, PublishErrorHandler};
use crate::pubsub::message::{group_messages, PublishMessage};
use crate::pubsub::metrics::PublisherMetrics;
use crate::transport::{PubSubTransport, TransportErr};
use parking_lot::RwLock;
use std::sync::Arc;

type ErrorHandlerSlot = Arc<RwLock<Option<Arc<dyn PublishErrorHandler>>>>;

/// Outcome of delivering one batch
#[derive(Debug, Default)]
pub(crate) struct FlushReport {
    pub delivered: usize,
    pub failures: Vec<FlushFailure>,
}

impl FlushReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delivers messages to the transport and reports failures to the registered handler.
///
/// Shared between the buffer task and the unbuffered publish path.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    transport: Arc<dyn PubSubTransport>,
    error_handler: ErrorHandlerSlot,
    metrics: Arc<PublisherMetrics>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn PubSubTransport>, metrics: Arc<PublisherMetrics>) -> Self {
        Dispatcher {
            transport,
            error_handler: Arc::new(RwLock::new(None)),
            metrics,
        }
    }

    pub fn set_error_handler(&self, handler: Arc<dyn PublishErrorHandler>) {
        *self.error_handler.write() = Some(handler);
    }

    pub fn metrics(&self) -> &Arc<PublisherMetrics> {
        &self.metrics
    }

    /// Publishes a single message, without reporting failures
    pub async fn publish_direct(&self, message: &PublishMessage) -> Result<(), TransportErr> {
        self.transport
            .publish(
                &message.name,
                &message.topic,
                message.payload.clone(),
                message.effective_metadata(),
            )
            .await
    }

    /// Publishes a single message, reporting a failure to the error handler
    pub async fn publish_reported(&self, message: PublishMessage) -> Result<(), TransportErr> {
        match self.publish_direct(&message).await {
            Ok(()) => {
                self.metrics.add_msgs_published(1);
                Ok(())
            }
            Err(e) => {
                self.report(vec![message], e.clone()).await;
                Err(e)
            }
        }
    }

    /// Delivers a batch taken from the buffer.
    ///
    /// A batch of one is published directly. Larger batches are split by group key: groups
    /// of one are published directly, other groups are sent with one bulk publish each.
    /// A failing group is reported and never stops the remaining groups.
    pub async fn publish_batch(&self, messages: Vec<PublishMessage>) -> FlushReport {
        let mut report = FlushReport::default();
        if messages.is_empty() {
            return report;
        }

        self.metrics.increment_flushes();

        if messages.len() == 1 {
            let message = messages.into_iter().next();
            if let Some(message) = message {
                self.deliver_single(message, &mut report).await;
            }

            return report;
        }

        for (key, mut group) in group_messages(messages) {
            if group.len() == 1 {
                if let Some(message) = group.pop() {
                    self.deliver_single(message, &mut report).await;
                }

                continue;
            }

            debug!(
                target: "PublishBuffer",
                name = key.name.as_str(),
                topic = key.topic.as_str(),
                count = group.len(),
                "publishing group in bulk"
            );

            let payloads = group.iter().map(|m| m.payload.clone()).collect();
            let result = self
                .transport
                .publish_bulk(&key.name, &key.topic, payloads, key.bulk_metadata())
                .await;

            match result {
                Ok(()) => {
                    self.metrics.add_msgs_published(group.len());
                    report.delivered += group.len();
                }
                Err(e) => {
                    self.report(group.clone(), e.clone()).await;
                    report.failures.push(FlushFailure {
                        messages: group,
                        error: e,
                    });
                }
            }
        }

        report
    }

    async fn deliver_single(&self, message: PublishMessage, report: &mut FlushReport) {
        match self.publish_direct(&message).await {
            Ok(()) => {
                self.metrics.add_msgs_published(1);
                report.delivered += 1;
            }
            Err(e) => {
                let messages = vec![message];
                self.report(messages.clone(), e.clone()).await;
                report.failures.push(FlushFailure { messages, error: e });
            }
        }
    }

    async fn report(&self, messages: Vec<PublishMessage>, error: TransportErr) {
        let count = messages.len();
        self.metrics.add_msgs_failed(count);

        let handler = self.error_handler.read().clone();
        if let Some(handler) = handler {
            handler.on_error(messages, error.clone()).await;
        }

        error!(
            target: "PublishBuffer",
            count,
            "error publishing {} to pubsub, e={}",
            if count == 1 { "message" } else { "messages" },
            &error
        );
    }
}
