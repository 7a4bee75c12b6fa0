#![allow(dead_code)]

use coerce_dapr::transport::{ActorTransport, Metadata, PubSubTransport, TransportErr};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;

lazy_static::lazy_static! {
    static ref LOG_LEVEL: String = std::env::var("LOG_LEVEL").map_or(String::from("OFF"), |s| s);
}

pub fn create_trace_logger() {
    let _ = tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::NONE)
        .with_ansi(false)
        .with_max_level(
            LevelFilter::from_str(LOG_LEVEL.as_str())
                .expect("invalid `LOG_LEVEL` environment variable"),
        )
        .try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Invoke {
        actor_type: String,
        actor_id: String,
        method: String,
        body: Option<Vec<Value>>,
    },
    Publish {
        name: String,
        topic: String,
        payload: Value,
        metadata: Option<Metadata>,
    },
    PublishBulk {
        name: String,
        topic: String,
        payloads: Vec<Value>,
        metadata: Option<Metadata>,
    },
}

impl TransportCall {
    /// Payloads carried by a publish call, in order
    pub fn payloads(&self) -> Vec<Value> {
        match self {
            TransportCall::Publish { payload, .. } => vec![payload.clone()],
            TransportCall::PublishBulk { payloads, .. } => payloads.clone(),
            TransportCall::Invoke { .. } => vec![],
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, TransportCall::PublishBulk { .. })
    }
}

/// Records every call, optionally failing publishes to chosen topics
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    failing_topics: Mutex<HashSet<String>>,
    responses: Mutex<HashMap<String, Value>>,
    invoke_error: Mutex<Option<TransportErr>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<MockTransport> {
        Arc::new(MockTransport::default())
    }

    pub fn fail_topic(&self, topic: &str) {
        self.failing_topics.lock().insert(topic.to_string());
    }

    pub fn respond_with(&self, method: &str, response: Value) {
        self.responses.lock().insert(method.to_string(), response);
    }

    pub fn fail_invocations(&self, error: TransportErr) {
        *self.invoke_error.lock() = Some(error);
    }

    /// Every publish call sleeps for `delay` before being recorded
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Highest number of publish calls that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn published_payloads(&self) -> Vec<Value> {
        self.calls().iter().flat_map(|c| c.payloads()).collect()
    }

    pub fn published_count(&self) -> usize {
        self.published_payloads().len()
    }

    /// Waits until at least `count` calls have been recorded, or the timeout elapses
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> Vec<TransportCall> {
        let deadline = Instant::now() + timeout;
        loop {
            let calls = self.calls();
            if calls.len() >= count || Instant::now() >= deadline {
                return calls;
            }

            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn simulate_latency(&self) {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn check_topic(&self, topic: &str) -> Result<(), TransportErr> {
        if self.failing_topics.lock().contains(topic) {
            Err(TransportErr::Status {
                code: 500,
                body: format!("topic {} unavailable", topic),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PubSubTransport for MockTransport {
    async fn publish(
        &self,
        name: &str,
        topic: &str,
        payload: Value,
        metadata: Option<Metadata>,
    ) -> Result<(), TransportErr> {
        self.simulate_latency().await;
        self.check_topic(topic)?;

        self.calls.lock().push(TransportCall::Publish {
            name: name.to_string(),
            topic: topic.to_string(),
            payload,
            metadata,
        });

        Ok(())
    }

    async fn publish_bulk(
        &self,
        name: &str,
        topic: &str,
        payloads: Vec<Value>,
        metadata: Option<Metadata>,
    ) -> Result<(), TransportErr> {
        self.simulate_latency().await;
        self.check_topic(topic)?;

        self.calls.lock().push(TransportCall::PublishBulk {
            name: name.to_string(),
            topic: topic.to_string(),
            payloads,
            metadata,
        });

        Ok(())
    }
}

#[async_trait]
impl ActorTransport for MockTransport {
    async fn invoke(
        &self,
        actor_type: &str,
        actor_id: &str,
        method: &str,
        body: Option<Vec<Value>>,
    ) -> Result<Value, TransportErr> {
        self.calls.lock().push(TransportCall::Invoke {
            actor_type: actor_type.to_string(),
            actor_id: actor_id.to_string(),
            method: method.to_string(),
            body,
        });

        let error = self.invoke_error.lock().clone();
        if let Some(error) = error {
            return Err(error);
        }

        let response = self.responses.lock().get(method).cloned();
        Ok(response.unwrap_or(Value::Null))
    }
}
