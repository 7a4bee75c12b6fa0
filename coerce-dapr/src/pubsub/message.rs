use crate::pubsub::error::PublishErr;
use crate::transport::{Metadata, PARTITION_KEY};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// A single publish request, built with named parameters.
///
/// Requests are buffered by default, see [`Publish::unbuffered`].
#[derive(Debug, Clone, PartialEq)]
pub struct Publish {
    name: Option<String>,
    topic: String,
    payload: Value,
    producer_id: Option<String>,
    metadata: Option<Metadata>,
    buffered: bool,
}

/// Several payloads for the same pub/sub component, topic and producer
#[derive(Debug, Clone, PartialEq)]
pub struct PublishBulk {
    name: Option<String>,
    topic: String,
    payloads: Vec<Value>,
    producer_id: Option<String>,
    metadata: Option<Metadata>,
}

/// A publish request that has been validated and is owned by the buffer until flushed
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublishMessage {
    pub name: String,
    pub topic: String,
    pub payload: Value,
    pub producer_id: Option<String>,
    pub metadata: Option<Metadata>,
}

/// Messages sharing a key may be delivered by a single bulk-publish call
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct GroupKey {
    pub name: String,
    pub topic: String,
    pub producer_id: Option<String>,
}

impl Publish {
    pub fn new(topic: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            name: None,
            topic: topic.into(),
            payload: payload.into(),
            producer_id: None,
            metadata: None,
            buffered: true,
        }
    }

    pub fn json<T: Serialize + ?Sized>(
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, PublishErr> {
        let payload =
            serde_json::to_value(payload).map_err(|e| PublishErr::Serialisation(e.to_string()))?;

        Ok(Self::new(topic, payload))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_producer_id(mut self, producer_id: impl Into<String>) -> Self {
        self.producer_id = Some(producer_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    /// Publishes straight to the transport, bypassing the buffer
    pub fn unbuffered(self) -> Self {
        self.buffered(false)
    }

    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    pub(crate) fn into_message(self, default_name: &str) -> Result<PublishMessage, PublishErr> {
        PublishMessage::create(
            self.name,
            default_name,
            self.topic,
            self.payload,
            self.producer_id,
            self.metadata,
        )
    }
}

impl PublishBulk {
    pub fn new(topic: impl Into<String>, payloads: Vec<Value>) -> Self {
        Self {
            name: None,
            topic: topic.into(),
            payloads,
            producer_id: None,
            metadata: None,
        }
    }

    pub fn json<T: Serialize>(topic: impl Into<String>, payloads: &[T]) -> Result<Self, PublishErr> {
        let payloads = payloads
            .iter()
            .map(|p| serde_json::to_value(p).map_err(|e| PublishErr::Serialisation(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(topic, payloads))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_producer_id(mut self, producer_id: impl Into<String>) -> Self {
        self.producer_id = Some(producer_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn into_messages(self, default_name: &str) -> Result<Vec<PublishMessage>, PublishErr> {
        let PublishBulk {
            name,
            topic,
            payloads,
            producer_id,
            metadata,
        } = self;

        payloads
            .into_iter()
            .map(|payload| {
                PublishMessage::create(
                    name.clone(),
                    default_name,
                    topic.clone(),
                    payload,
                    producer_id.clone(),
                    metadata.clone(),
                )
            })
            .collect()
    }
}

impl PublishMessage {
    fn create(
        name: Option<String>,
        default_name: &str,
        topic: String,
        payload: Value,
        producer_id: Option<String>,
        metadata: Option<Metadata>,
    ) -> Result<PublishMessage, PublishErr> {
        if topic.trim().is_empty() {
            return Err(PublishErr::MissingTopic);
        }

        let name = match name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None if !default_name.trim().is_empty() => default_name.to_string(),
            None => return Err(PublishErr::MissingPubSubName),
        };

        Ok(PublishMessage {
            name,
            topic,
            payload,
            producer_id: producer_id.filter(|p| !p.is_empty()),
            metadata,
        })
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            name: self.name.clone(),
            topic: self.topic.clone(),
            producer_id: self.producer_id.clone(),
        }
    }

    /// Metadata sent with a direct publish: the producer id becomes the partition key,
    /// which explicit metadata may override.
    pub fn effective_metadata(&self) -> Option<Metadata> {
        match (&self.producer_id, &self.metadata) {
            (Some(producer_id), metadata) => {
                let mut merged = Metadata::new();
                merged.insert(PARTITION_KEY.to_string(), producer_id.clone());
                if let Some(metadata) = metadata {
                    merged.extend(metadata.clone());
                }

                Some(merged)
            }
            (None, Some(metadata)) => Some(metadata.clone()),
            (None, None) => None,
        }
    }
}

impl GroupKey {
    /// Metadata sent with a bulk publish for this group
    pub fn bulk_metadata(&self) -> Option<Metadata> {
        self.producer_id.as_ref().map(|producer_id| {
            let mut metadata = Metadata::new();
            metadata.insert(PARTITION_KEY.to_string(), producer_id.clone());
            metadata
        })
    }
}

/// Partitions a batch by [`GroupKey`].
///
/// Groups are returned in the order their first message appears in the batch, and every
/// group keeps the batch order of its messages.
pub fn group_messages(messages: Vec<PublishMessage>) -> Vec<(GroupKey, Vec<PublishMessage>)> {
    let mut groups: Vec<(GroupKey, Vec<PublishMessage>)> = vec![];
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();

    for message in messages {
        let key = message.group_key();
        match positions.get(&key) {
            Some(&position) => groups[position].1.push(message),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![message]));
            }
        }
    }

    groups
}
