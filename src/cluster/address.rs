//! Broker network endpoints and their two orderings.

use std::cmp::Ordering;
use std::fmt;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single broker endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkAddress {
    host: String,
    port: u16,
}

impl NetworkAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Ord for NetworkAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.host
            .cmp(&other.host)
            .then_with(|| self.port.cmp(&other.port))
    }
}

impl PartialOrd for NetworkAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Non-empty set of broker endpoints with two derived orderings.
///
/// The *canonical* ordering is sorted by host then port and is deterministic
/// across processes; it feeds the cluster description string and descriptor
/// equality. The *dispatch* ordering is a per-instance uniform random
/// permutation of the canonical set and is the order connection attempts
/// should try, spreading load across broker nodes.
#[derive(Debug, Clone)]
pub struct AddressSet {
    canonical: Vec<NetworkAddress>,
    dispatch: Vec<NetworkAddress>,
}

impl AddressSet {
    /// Build an address set from any collection of endpoints.
    ///
    /// Duplicates collapse into one entry. Fails when the input is empty or
    /// any endpoint carries an empty host.
    pub fn new(addresses: impl IntoIterator<Item = NetworkAddress>) -> Result<Self, ConfigError> {
        let mut canonical: Vec<NetworkAddress> = addresses.into_iter().collect();
        if canonical.is_empty() {
            return Err(ConfigError::MissingField { field: "addresses" });
        }
        for address in &canonical {
            if address.host.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "address.host",
                });
            }
        }
        canonical.sort();
        canonical.dedup();

        // Shuffle a copy; the canonical order stays available for the
        // description string and equality.
        let mut dispatch = canonical.clone();
        dispatch.shuffle(&mut rand::thread_rng());

        Ok(Self {
            canonical,
            dispatch,
        })
    }

    /// Build a one-element set; dispatch order is trivially canonical.
    pub fn single(address: NetworkAddress) -> Result<Self, ConfigError> {
        Self::new([address])
    }

    /// Deterministic sorted order, identical across processes.
    #[must_use]
    pub fn canonical(&self) -> &[NetworkAddress] {
        &self.canonical
    }

    /// Per-instance randomized order for connection attempts.
    #[must_use]
    pub fn dispatch(&self) -> &[NetworkAddress] {
        &self.dispatch
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}
