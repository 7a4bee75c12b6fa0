use crate::pubsub::dispatch::{Dispatcher, FlushReport};
use crate::pubsub::message::PublishMessage;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub(crate) enum BufferCommand {
    Enqueue(PublishMessage),
    Drain(oneshot::Sender<FlushReport>),
}

/// Rolling buffer of messages awaiting a flush.
///
/// Owned by a single task, so appending, checking the size threshold and flushing never
/// overlap, and a tick that fires during a flush waits for it to finish.
pub(crate) struct PublishBuffer {
    id: Uuid,
    messages: Vec<PublishMessage>,
    buffer_size: usize,
    time_span: Duration,
    dispatcher: Dispatcher,
    flush_trigger: CancellationToken,
}

impl PublishBuffer {
    pub fn new(
        buffer_size: usize,
        time_span: Duration,
        dispatcher: Dispatcher,
        flush_trigger: CancellationToken,
    ) -> PublishBuffer {
        PublishBuffer {
            id: Uuid::new_v4(),
            messages: Vec::with_capacity(buffer_size.max(1)),
            buffer_size: buffer_size.max(1),
            time_span: time_span.max(Duration::from_millis(1)),
            dispatcher,
            flush_trigger,
        }
    }

    pub fn start(self) -> UnboundedSender<BufferCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(buffer_loop(self, rx));

        tx
    }

    async fn flush(&mut self) -> FlushReport {
        let batch = std::mem::take(&mut self.messages);
        if batch.is_empty() {
            return FlushReport::default();
        }

        debug!(target: "PublishBuffer", "{} - flushing {} message(s)", &self.id, batch.len());
        self.dispatcher.publish_batch(batch).await
    }
}

async fn buffer_loop(mut buffer: PublishBuffer, mut rx: UnboundedReceiver<BufferCommand>) {
    let time_span = buffer.time_span;
    let mut interval = time::interval_at(Instant::now() + time_span, time_span);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    trace!(target: "PublishBuffer", "{} - buffer starting", &buffer.id);

    loop {
        tokio::select! {
            // commands first, so the time span is a soft bound while the channel has a
            // backlog; the size threshold still caps how much can accumulate
            biased;

            command = rx.recv() => match command {
                Some(BufferCommand::Enqueue(message)) => {
                    buffer.messages.push(message);
                    if buffer.messages.len() >= buffer.buffer_size {
                        trace!(target: "PublishBuffer", "{} - buffer full", &buffer.id);

                        buffer.flush().await;
                        interval.reset();
                    }
                }

                Some(BufferCommand::Drain(reply)) => {
                    rx.close();

                    // anything sent before the channel closed is still delivered
                    while let Ok(command) = rx.try_recv() {
                        if let BufferCommand::Enqueue(message) = command {
                            buffer.messages.push(message);
                        }
                    }

                    debug!(target: "PublishBuffer", "{} - draining {} message(s)", &buffer.id, buffer.messages.len());

                    let report = buffer.flush().await;
                    let _ = reply.send(report);
                    break;
                }

                None => {
                    buffer.flush().await;
                    break;
                }
            },

            _ = interval.tick(), if !buffer.flush_trigger.is_cancelled() => {
                if buffer.flush_trigger.is_cancelled() || buffer.messages.is_empty() {
                    continue;
                }

                trace!(target: "PublishBuffer", "{} - buffer time span elapsed", &buffer.id);
                buffer.flush().await;
            }
        }
    }

    trace!(target: "PublishBuffer", "{} - buffer finished", &buffer.id);
}
