//! Message envelopes exchanged with the broker transport.
//!
//! The core only ever inspects the correlation id and delivery-attempt
//! metadata; payload bytes are opaque and belong to the serialization
//! collaborator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// String-keyed header map attached to broker messages.
pub type Headers = HashMap<String, serde_json::Value>;

/// Generate a fresh correlation id (UUID v4).
///
/// Uniqueness per outstanding request is the sender's responsibility; a v4
/// UUID makes accidental collision practically impossible.
#[must_use]
pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A message delivered by the broker to a consumer.
///
/// Created per delivery and discarded after consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Routing key the message was delivered with.
    pub routing_key: String,
    /// Correlation id linking this message to an outstanding request.
    pub correlation_id: String,
    /// Broker headers.
    #[serde(default)]
    pub headers: Headers,
    /// Delivery attempt as tracked by the transport.
    ///
    /// `0` means the transport does not track attempts; the consumer then
    /// counts redeliveries internally.
    #[serde(default)]
    pub delivery_attempt: u32,
}

impl InboundMessage {
    /// Build a minimal envelope with no headers and an untracked attempt.
    pub fn new(
        payload: impl Into<Vec<u8>>,
        routing_key: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            routing_key: routing_key.into(),
            correlation_id: correlation_id.into(),
            headers: Headers::new(),
            delivery_attempt: 0,
        }
    }

    /// Key identifying this message's lineage across redeliveries.
    ///
    /// The correlation id when present, otherwise the routing key.
    #[must_use]
    pub fn lineage_key(&self) -> &str {
        if self.correlation_id.is_empty() {
            &self.routing_key
        } else {
            &self.correlation_id
        }
    }
}

/// A request envelope handed to the transport for publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Serialized request payload.
    pub payload: Vec<u8>,
    /// Routing key to publish under.
    pub routing_key: String,
    /// Correlation id the response must echo back.
    pub correlation_id: String,
    /// Broker headers.
    #[serde(default)]
    pub headers: Headers,
}

impl OutboundMessage {
    /// Build an envelope with a freshly generated correlation id.
    pub fn new(payload: impl Into<Vec<u8>>, routing_key: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            routing_key: routing_key.into(),
            correlation_id: new_correlation_id(),
            headers: Headers::new(),
        }
    }

    /// Build an envelope with a caller-supplied correlation id.
    pub fn with_correlation_id(
        payload: impl Into<Vec<u8>>,
        routing_key: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            routing_key: routing_key.into(),
            correlation_id: correlation_id.into(),
            headers: Headers::new(),
        }
    }
}

/// Outcome of consuming a single delivery, reported back to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeStatus {
    /// Handled; the transport should ack the delivery.
    Consumed,
    /// Handling failed but the redelivery budget remains; requeue.
    RejectRequeue,
    /// Redelivery budget exhausted; drop without requeueing.
    RejectTerminal,
}
