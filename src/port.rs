//! Transport ports.
//!
//! This module defines the traits the wire-level transport collaborator
//! implements. The core publishes and consumes through these boundaries and
//! never touches channels, connections or TLS itself.

use async_trait::async_trait;

use crate::domain::{InboundMessage, OutboundMessage};
use crate::error::Result;

/// Outbound port: publishes a request envelope to the broker.
///
/// Implementations are expected to attempt the cluster's addresses in the
/// dispatch order supplied by
/// [`ClusterDescriptor`](crate::cluster::ClusterDescriptor).
#[async_trait]
pub trait TicketPublisher: Send + Sync {
    /// Publish one envelope.
    ///
    /// # Errors
    ///
    /// Any transport-level failure; the gateway surfaces it to the sender
    /// and releases the pending registration.
    async fn publish(&self, message: &OutboundMessage) -> Result<()>;
}

/// Inbound port: application handling of one delivered message.
///
/// Implementations own payload deserialization and domain mapping. A
/// returned error — including a deserialization failure — counts as a failed
/// delivery attempt and is subject to the consumer's retry policy.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Handle one delivery.
    ///
    /// # Errors
    ///
    /// Any per-message failure. The consumer loop never crashes on it; the
    /// retry limiter decides between requeue and terminal rejection.
    async fn consume(&self, message: &InboundMessage) -> Result<()>;

    /// Called exactly once per message lineage after the redelivery budget
    /// is exhausted. Expected to log/alert; the message will not be
    /// requeued again.
    async fn after_limit_reached(&self, message: &InboundMessage);
}
