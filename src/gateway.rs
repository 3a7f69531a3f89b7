//! Send gateways: the async request/response path and its blocking facade.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::correlation::{ResponseCorrelator, ResponseHandle};
use crate::domain::{InboundMessage, OutboundMessage};
use crate::error::{CorrelationError, Error, Result};
use crate::port::TicketPublisher;

/// Asynchronous request/response gateway.
///
/// Publishes a request through the transport port, registers it with the
/// correlator and hands back either the correlated response or a waitable
/// handle. Cloning is cheap; clones share the publisher and correlator.
#[derive(Clone)]
pub struct SendGateway {
    publisher: Arc<dyn TicketPublisher>,
    correlator: ResponseCorrelator<InboundMessage>,
    default_timeout: Duration,
}

impl SendGateway {
    pub fn new(
        publisher: Arc<dyn TicketPublisher>,
        correlator: ResponseCorrelator<InboundMessage>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            correlator,
            default_timeout,
        }
    }

    /// The correlator responses must be fed into (by the consumer side).
    #[must_use]
    pub fn correlator(&self) -> &ResponseCorrelator<InboundMessage> {
        &self.correlator
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Publish `message` and register it, returning a handle to await.
    ///
    /// The caller gets the handle back immediately and decides when (or
    /// whether) to wait; this is the non-suspending path.
    ///
    /// # Errors
    ///
    /// Duplicate correlation id, or a publish failure (in which case the
    /// registration is released before returning).
    pub async fn send_detached(
        &self,
        message: &OutboundMessage,
        timeout: Duration,
    ) -> Result<ResponseHandle<InboundMessage>> {
        let handle = self.correlator.register(&message.correlation_id, timeout)?;

        if let Err(e) = self.publisher.publish(message).await {
            // The response can never arrive; do not leave the entry to
            // linger until the sweep.
            self.correlator.abandon(&message.correlation_id);
            debug!(
                correlation_id = %message.correlation_id,
                error = %e,
                "publish failed, registration released"
            );
            return Err(Error::Correlation(CorrelationError::Publish {
                correlation_id: message.correlation_id.clone(),
                reason: e.to_string(),
            }));
        }

        debug!(
            correlation_id = %message.correlation_id,
            routing_key = %message.routing_key,
            "request published"
        );
        Ok(handle)
    }

    /// Publish `message` and await the correlated response.
    ///
    /// # Errors
    ///
    /// As [`send_detached`](Self::send_detached), plus
    /// [`CorrelationError::ResponseTimeout`] when `timeout` elapses first.
    pub async fn send(
        &self,
        message: &OutboundMessage,
        timeout: Duration,
    ) -> Result<InboundMessage> {
        let handle = self.send_detached(message, timeout).await?;
        Ok(handle.wait().await?)
    }

    /// [`send`](Self::send) with the gateway's default timeout.
    pub async fn send_default(&self, message: &OutboundMessage) -> Result<InboundMessage> {
        self.send(message, self.default_timeout).await
    }
}

/// Synchronous facade over [`SendGateway`] for non-async callers.
///
/// Suspends the calling thread until the response arrives or the deadline
/// elapses. Must be called from outside the runtime's worker threads (a
/// plain application thread); calling it from within an async task would
/// block a worker.
#[derive(Clone)]
pub struct BlockingSendGateway {
    gateway: SendGateway,
    runtime: tokio::runtime::Handle,
}

impl BlockingSendGateway {
    /// Wrap `gateway`, driving sends on the given runtime.
    pub fn new(gateway: SendGateway, runtime: tokio::runtime::Handle) -> Self {
        Self { gateway, runtime }
    }

    #[must_use]
    pub fn gateway(&self) -> &SendGateway {
        &self.gateway
    }

    /// Publish `message` and block until the correlated response or the
    /// deadline. Concurrent callers with distinct correlation ids never
    /// block each other.
    ///
    /// # Errors
    ///
    /// As [`SendGateway::send`]; on timeout the orphaned registration is
    /// removed so a late response is discarded safely.
    pub fn send_blocking(
        &self,
        message: &OutboundMessage,
        timeout: Duration,
    ) -> Result<InboundMessage> {
        info!(
            correlation_id = %message.correlation_id,
            ?timeout,
            "blocking send"
        );
        self.runtime.block_on(self.gateway.send(message, timeout))
    }

    /// [`send_blocking`](Self::send_blocking) with the default timeout.
    pub fn send_blocking_default(&self, message: &OutboundMessage) -> Result<InboundMessage> {
        self.send_blocking(message, self.gateway.default_timeout)
    }
}
