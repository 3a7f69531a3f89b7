//! Retry-bounded message consumption.
//!
//! Wraps an [`InboundHandler`] with a bounded-redelivery policy: while a
//! message lineage stays under the configured attempt limit, failed
//! deliveries are rejected for requeue; once the limit is exceeded the
//! handler's terminal callback fires exactly once and the message is
//! rejected without requeue.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::domain::{ConsumeStatus, InboundMessage};
use crate::port::InboundHandler;

/// Consumer wrapper enforcing a redelivery budget.
pub struct RetryLimitedConsumer {
    handler: Arc<dyn InboundHandler>,
    retry_limit: u32,
    /// Failed-attempt count per message lineage. Entries exist only for
    /// lineages that have failed at least once and are cleared on success
    /// or terminal rejection.
    attempts: DashMap<String, u32>,
    /// Serializes open/close so concurrent lifecycle calls cannot race.
    open: Mutex<bool>,
}

impl RetryLimitedConsumer {
    pub fn new(handler: Arc<dyn InboundHandler>, retry_limit: u32) -> Self {
        Self {
            handler,
            retry_limit,
            attempts: DashMap::new(),
            open: Mutex::new(false),
        }
    }

    /// The configured redelivery budget.
    #[must_use]
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Mark the consumer open. Idempotent.
    pub fn open(&self) {
        let mut open = self.open.lock();
        if !*open {
            *open = true;
            debug!("consumer opened");
        }
    }

    /// Mark the consumer closed. Idempotent.
    pub fn close(&self) {
        let mut open = self.open.lock();
        if *open {
            *open = false;
            debug!("consumer closed");
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    /// Process one delivery and report its status to the transport.
    ///
    /// A delivery to a closed consumer is requeued untouched. Handler
    /// failures (including deserialization failures surfaced by the
    /// handler) count toward the lineage's attempt budget; the transport's
    /// own `delivery_attempt`, when tracked, seeds the count.
    pub async fn deliver(&self, message: &InboundMessage) -> ConsumeStatus {
        if !self.is_open() {
            warn!(
                correlation_id = %message.correlation_id,
                "delivery while closed, requeueing"
            );
            return ConsumeStatus::RejectRequeue;
        }

        match self.handler.consume(message).await {
            Ok(()) => {
                self.attempts.remove(message.lineage_key());
                ConsumeStatus::Consumed
            }
            Err(e) => self.record_failure(message, &e).await,
        }
    }

    async fn record_failure(
        &self,
        message: &InboundMessage,
        cause: &crate::error::Error,
    ) -> ConsumeStatus {
        let key = message.lineage_key().to_string();

        // Holding the entry across the update keeps concurrent redeliveries
        // of one lineage from double-counting an attempt.
        let attempt = {
            let mut entry = self.attempts.entry(key.clone()).or_insert(0);
            *entry = (*entry + 1).max(message.delivery_attempt);
            *entry
        };

        if attempt > self.retry_limit {
            // Removing the counter is the exactly-once gate for the
            // terminal callback: only the remover fires it.
            if self.attempts.remove(&key).is_some() {
                error!(
                    correlation_id = %message.correlation_id,
                    routing_key = %message.routing_key,
                    attempt,
                    limit = self.retry_limit,
                    error = %cause,
                    "redelivery budget exhausted, rejecting terminally"
                );
                self.handler.after_limit_reached(message).await;
            }
            ConsumeStatus::RejectTerminal
        } else {
            warn!(
                correlation_id = %message.correlation_id,
                attempt,
                limit = self.retry_limit,
                error = %cause,
                "delivery failed, requeueing"
            );
            ConsumeStatus::RejectRequeue
        }
    }
}
