//! Response correlation: matching asynchronous inbound messages to
//! outstanding outbound requests.
//!
//! # Architecture
//!
//! Pending requests live in a concurrent map keyed by correlation id. The
//! map's sharded locking means registrations and completions for distinct
//! ids never serialize on one another; removal from the map is the
//! exactly-once gate for each id — whichever of delivery and expiry removes
//! the entry first wins, and the loser observes it gone and no-ops.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::error::CorrelationError;

/// A pending outbound request awaiting its correlated response.
struct PendingEntry<R> {
    tx: oneshot::Sender<R>,
    registered_at: Instant,
    deadline: Instant,
}

/// Thread-safe registry of outstanding requests.
///
/// `R` is the response type delivered to waiters; the correlator never
/// inspects it.
pub struct ResponseCorrelator<R> {
    pending: Arc<DashMap<String, PendingEntry<R>>>,
}

impl<R> Default for ResponseCorrelator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ResponseCorrelator<R> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<R> ResponseCorrelator<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Register an outstanding request under `correlation_id`.
    ///
    /// Returns a handle the caller can await. The registering caller is
    /// responsible for generating unique ids; a second registration for an
    /// id that is still pending is a protocol violation.
    ///
    /// # Errors
    ///
    /// [`CorrelationError::DuplicateCorrelation`] when the id is already
    /// pending.
    pub fn register(
        &self,
        correlation_id: &str,
        timeout: Duration,
    ) -> Result<ResponseHandle<R>, CorrelationError> {
        let (tx, rx) = oneshot::channel();
        let now = Instant::now();
        let deadline = now + timeout;

        match self.pending.entry(correlation_id.to_string()) {
            Entry::Occupied(_) => {
                return Err(CorrelationError::DuplicateCorrelation {
                    correlation_id: correlation_id.to_string(),
                })
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PendingEntry {
                    tx,
                    registered_at: now,
                    deadline,
                });
            }
        }
        trace!(correlation_id, ?timeout, "registered pending request");

        Ok(ResponseHandle {
            correlation_id: correlation_id.to_string(),
            timeout,
            deadline,
            rx,
            correlator: self.clone(),
        })
    }

    /// Deliver a response to the waiter registered under `correlation_id`.
    ///
    /// Returns `true` when a waiter was resolved. A stray completion — the
    /// id was never registered, already completed or already expired — is a
    /// safe no-op: the response is dropped and `false` returned.
    pub fn complete(&self, correlation_id: &str, response: R) -> bool {
        let Some((_, entry)) = self.pending.remove(correlation_id) else {
            debug!(correlation_id, "dropping uncorrelated response");
            return false;
        };

        let waited = entry.registered_at.elapsed();
        // The waiter may have just timed out and dropped its receiver; that
        // race loses here and the response is dropped like any stray one.
        match entry.tx.send(response) {
            Ok(()) => {
                trace!(correlation_id, ?waited, "resolved pending request");
                true
            }
            Err(_) => {
                debug!(correlation_id, ?waited, "waiter gone before response");
                false
            }
        }
    }

    /// Remove a pending entry without delivering anything.
    ///
    /// No-op when the entry is already gone.
    pub fn abandon(&self, correlation_id: &str) {
        if self.pending.remove(correlation_id).is_some() {
            trace!(correlation_id, "abandoned pending request");
        }
    }

    /// Number of requests currently awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop every pending entry whose deadline has passed.
    ///
    /// Returns the number of entries expired. Waiters observe expiry through
    /// their own timed wait; this sweep exists so registrations abandoned
    /// without awaiting cannot accumulate.
    pub fn expire_overdue(&self) -> usize {
        let now = Instant::now();
        let before = self.pending.len();
        self.pending.retain(|_, entry| entry.deadline > now);
        let expired = before.saturating_sub(self.pending.len());
        if expired > 0 {
            warn!(expired, "expired overdue pending requests");
        }
        expired
    }

    /// Spawn a background task sweeping overdue entries every `interval`.
    ///
    /// The task runs until the returned handle is aborted or the runtime
    /// shuts down.
    pub fn spawn_expiry_sweep(&self, interval: Duration) -> tokio::task::JoinHandle<()>
    where
        R: Send + 'static,
    {
        let correlator = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                correlator.expire_overdue();
            }
        })
    }
}

/// Waitable handle for one registered request.
///
/// Exactly one of response delivery and deadline expiry resolves it.
pub struct ResponseHandle<R> {
    correlation_id: String,
    timeout: Duration,
    deadline: Instant,
    rx: oneshot::Receiver<R>,
    correlator: ResponseCorrelator<R>,
}

impl<R> ResponseHandle<R> {
    /// The correlation id this handle waits on.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Suspend until the correlated response arrives or the deadline passes.
    ///
    /// On timeout the pending entry is removed, so a late completion for
    /// this id becomes a safe no-op on the correlator side.
    ///
    /// # Errors
    ///
    /// [`CorrelationError::ResponseTimeout`] when the deadline elapses first
    /// (or the background sweep expired the entry).
    pub async fn wait(self) -> Result<R, CorrelationError> {
        let timeout_err = || CorrelationError::ResponseTimeout {
            correlation_id: self.correlation_id.clone(),
            timeout: self.timeout,
        };

        match timeout_at(self.deadline, self.rx).await {
            Ok(Ok(response)) => Ok(response),
            // Sender dropped without sending: the sweep expired the entry.
            Ok(Err(_)) => Err(timeout_err()),
            Err(_) => {
                self.correlator.abandon(&self.correlation_id);
                Err(timeout_err())
            }
        }
    }
}
