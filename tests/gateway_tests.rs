use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use ticketgate::error::{CorrelationError, Error};
use ticketgate::{
    BlockingSendGateway, InboundMessage, OutboundMessage, ResponseCorrelator, SendGateway,
    TicketPublisher,
};

/// Transport stub that echoes every published request back as a response
/// after a configurable delay, the way the trading engine's confirmation
/// queue would.
struct LoopbackPublisher {
    correlator: ResponseCorrelator<InboundMessage>,
    response_delay: Duration,
    published: AtomicU32,
}

impl LoopbackPublisher {
    fn new(correlator: ResponseCorrelator<InboundMessage>, response_delay: Duration) -> Self {
        Self {
            correlator,
            response_delay,
            published: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TicketPublisher for LoopbackPublisher {
    async fn publish(&self, message: &OutboundMessage) -> ticketgate::Result<()> {
        self.published.fetch_add(1, Ordering::SeqCst);

        let correlator = self.correlator.clone();
        let delay = self.response_delay;
        let correlation_id = message.correlation_id.clone();
        let mut payload = b"confirmed:".to_vec();
        payload.extend_from_slice(&message.payload);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            correlator.complete(
                &correlation_id,
                InboundMessage::new(payload, "ticket.confirm", correlation_id.clone()),
            );
        });
        Ok(())
    }
}

/// Transport stub whose publishes always fail.
struct BrokenPublisher;

#[async_trait]
impl TicketPublisher for BrokenPublisher {
    async fn publish(&self, _message: &OutboundMessage) -> ticketgate::Result<()> {
        Err(Error::Transport("broker unreachable".into()))
    }
}

fn loopback_gateway(response_delay: Duration) -> (SendGateway, Arc<LoopbackPublisher>) {
    let correlator = ResponseCorrelator::new();
    let publisher = Arc::new(LoopbackPublisher::new(correlator.clone(), response_delay));
    let gateway = SendGateway::new(publisher.clone(), correlator, Duration::from_secs(5));
    (gateway, publisher)
}

#[tokio::test]
async fn send_returns_the_correlated_response() {
    let (gateway, publisher) = loopback_gateway(Duration::from_millis(10));

    let request = OutboundMessage::new(b"ticket-1".to_vec(), "ticket.submit");
    let response = gateway.send(&request, Duration::from_secs(2)).await.unwrap();

    assert_eq!(response.correlation_id, request.correlation_id);
    assert_eq!(response.payload, b"confirmed:ticket-1");
    assert_eq!(publisher.published.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.correlator().pending_count(), 0);
}

#[tokio::test]
async fn send_times_out_when_response_is_too_slow() {
    let (gateway, _publisher) = loopback_gateway(Duration::from_millis(500));

    let request = OutboundMessage::new(b"ticket-1".to_vec(), "ticket.submit");
    let err = gateway
        .send(&request, Duration::from_millis(20))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Correlation(CorrelationError::ResponseTimeout { .. })
    ));
    // The registration is gone; the late loopback completion is discarded.
    assert_eq!(gateway.correlator().pending_count(), 0);
}

#[tokio::test]
async fn publish_failure_releases_the_registration() {
    let correlator = ResponseCorrelator::new();
    let gateway = SendGateway::new(
        Arc::new(BrokenPublisher),
        correlator.clone(),
        Duration::from_secs(5),
    );

    let request = OutboundMessage::new(b"ticket-1".to_vec(), "ticket.submit");
    let err = gateway.send(&request, Duration::from_secs(2)).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Correlation(CorrelationError::Publish { .. })
    ));
    assert_eq!(correlator.pending_count(), 0);
    // The id is immediately reusable.
    assert!(correlator.register(&request.correlation_id, Duration::from_secs(1)).is_ok());
}

#[tokio::test]
async fn detached_send_does_not_suspend_the_caller() {
    let (gateway, _publisher) = loopback_gateway(Duration::from_millis(50));

    let request = OutboundMessage::new(b"ticket-1".to_vec(), "ticket.submit");
    let handle = gateway
        .send_detached(&request, Duration::from_secs(2))
        .await
        .unwrap();

    // The caller holds the handle; the response arrives asynchronously.
    assert_eq!(handle.correlation_id(), request.correlation_id);
    let response = handle.wait().await.unwrap();
    assert_eq!(response.payload, b"confirmed:ticket-1");
}

#[test]
fn blocking_send_returns_the_correlated_response() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let (gateway, _publisher) =
        runtime.block_on(async { loopback_gateway(Duration::from_millis(10)) });
    let blocking = BlockingSendGateway::new(gateway, runtime.handle().clone());

    let request = OutboundMessage::new(b"ticket-1".to_vec(), "ticket.submit");
    let response = blocking
        .send_blocking(&request, Duration::from_secs(2))
        .unwrap();

    assert_eq!(response.payload, b"confirmed:ticket-1");
}

#[test]
fn blocking_send_surfaces_a_timeout() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let (gateway, _publisher) =
        runtime.block_on(async { loopback_gateway(Duration::from_secs(10)) });
    let blocking = BlockingSendGateway::new(gateway, runtime.handle().clone());

    let request = OutboundMessage::new(b"ticket-1".to_vec(), "ticket.submit");
    let err = blocking
        .send_blocking(&request, Duration::from_millis(30))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Correlation(CorrelationError::ResponseTimeout { .. })
    ));
}

#[test]
fn concurrent_blocking_callers_do_not_serialize() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    let (gateway, _publisher) =
        runtime.block_on(async { loopback_gateway(Duration::from_millis(100)) });
    let blocking = BlockingSendGateway::new(gateway, runtime.handle().clone());

    let started = Instant::now();
    let callers: Vec<_> = (0..4)
        .map(|i| {
            let blocking = blocking.clone();
            std::thread::spawn(move || {
                let request =
                    OutboundMessage::new(format!("ticket-{i}").into_bytes(), "ticket.submit");
                blocking.send_blocking(&request, Duration::from_secs(5)).unwrap()
            })
        })
        .collect();

    for caller in callers {
        caller.join().unwrap();
    }

    // Four 100ms round trips in parallel finish far sooner than in series.
    assert!(
        started.elapsed() < Duration::from_millis(350),
        "blocking callers appear to have serialized: {:?}",
        started.elapsed()
    );
}
