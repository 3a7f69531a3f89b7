//! Immutable broker connection profiles.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::address::{AddressSet, NetworkAddress};
use crate::error::ConfigError;

/// Deployment environment inferred from the virtual host name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Prod,
    Ci,
    Custom,
}

impl Environment {
    fn from_vhost(vhost: &str) -> Self {
        if vhost.contains("tradinggate") {
            Self::Prod
        } else if vhost.contains("integration") {
            Self::Ci
        } else {
            Self::Custom
        }
    }
}

/// Immutable connection profile for a broker cluster.
///
/// Constructed once at configuration time; safe to share read-only across
/// every connection attempt. The description string is a pure function of
/// the canonical address order and the vhost, so two descriptors pointing at
/// the same broker target always describe themselves identically regardless
/// of dispatch-order randomness.
#[derive(Debug, Clone)]
pub struct ClusterDescriptor {
    username: String,
    password: String,
    vhost: String,
    use_tls: bool,
    addresses: AddressSet,
    environment: Environment,
    owner_id: i64,
    description: String,
}

impl ClusterDescriptor {
    /// Build a descriptor for a single broker endpoint.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        vhost: impl Into<String>,
        use_tls: bool,
        address: NetworkAddress,
        owner_id: i64,
    ) -> Result<Self, ConfigError> {
        Self::with_addresses(username, password, vhost, use_tls, [address], owner_id)
    }

    /// Build a descriptor for a clustered broker.
    ///
    /// The address set is sorted canonically for the description, then a
    /// copy is shuffled once into the dispatch order connection attempts
    /// should follow.
    pub fn with_addresses(
        username: impl Into<String>,
        password: impl Into<String>,
        vhost: impl Into<String>,
        use_tls: bool,
        addresses: impl IntoIterator<Item = NetworkAddress>,
        owner_id: i64,
    ) -> Result<Self, ConfigError> {
        let username = username.into();
        if username.is_empty() {
            return Err(ConfigError::MissingField { field: "username" });
        }
        let password = password.into();
        if password.is_empty() {
            return Err(ConfigError::MissingField { field: "password" });
        }

        let vhost = clean_vhost(&vhost.into());
        let addresses = AddressSet::new(addresses)?;
        let description = compose_description(addresses.canonical(), &vhost);
        let environment = Environment::from_vhost(&vhost);

        Ok(Self {
            username,
            password,
            vhost,
            use_tls,
            addresses,
            environment,
            owner_id,
            description,
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn vhost(&self) -> &str {
        &self.vhost
    }

    #[must_use]
    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    /// Stable, reproducible identity string for logging.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

// Identity deliberately excludes the address set (dispatch order is random
// per instance), the vhost (folded into the description), the environment
// and the owner id.
impl PartialEq for ClusterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.use_tls == other.use_tls
            && self.username == other.username
            && self.password == other.password
            && self.description == other.description
    }
}

impl Eq for ClusterDescriptor {}

impl Hash for ClusterDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.username.hash(state);
        self.password.hash(state);
        self.use_tls.hash(state);
        self.description.hash(state);
    }
}

impl fmt::Display for ClusterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Normalize a vhost to exactly one leading slash; empty input becomes `/`.
pub(super) fn clean_vhost(vhost: &str) -> String {
    let trimmed = vhost.trim_start_matches('/');
    format!("/{trimmed}")
}

fn compose_description(canonical: &[NetworkAddress], vhost: &str) -> String {
    let joined = canonical
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("vhost: '{vhost}', address(es): '{joined}'")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn three_addresses() -> Vec<NetworkAddress> {
        vec![
            NetworkAddress::new("b.example.com", 5672),
            NetworkAddress::new("a.example.com", 5672),
            NetworkAddress::new("c.example.com", 5672),
        ]
    }

    #[test]
    fn vhost_is_normalized() {
        let d = ClusterDescriptor::new(
            "u",
            "p",
            "///tradinggate",
            false,
            NetworkAddress::new("h", 5672),
            7,
        )
        .unwrap();
        assert_eq!(d.vhost(), "/tradinggate");

        let d = ClusterDescriptor::new("u", "p", "", false, NetworkAddress::new("h", 5672), 7)
            .unwrap();
        assert_eq!(d.vhost(), "/");
    }

    #[test]
    fn environment_is_derived_from_vhost() {
        let mk = |vhost: &str| {
            ClusterDescriptor::new("u", "p", vhost, false, NetworkAddress::new("h", 5672), 0)
                .unwrap()
                .environment()
        };

        assert_eq!(mk("/tradinggate"), Environment::Prod);
        assert_eq!(mk("/integration"), Environment::Ci);
        assert_eq!(mk("/sandbox"), Environment::Custom);
    }

    #[test]
    fn description_uses_canonical_order() {
        let d = ClusterDescriptor::with_addresses("u", "p", "/vh", false, three_addresses(), 0)
            .unwrap();

        assert_eq!(
            d.description(),
            "vhost: '/vh', address(es): \
             'a.example.com:5672,b.example.com:5672,c.example.com:5672'"
        );
    }

    #[test]
    fn descriptors_with_same_target_are_equal() {
        let mut reversed = three_addresses();
        reversed.reverse();

        let a = ClusterDescriptor::with_addresses("u", "p", "/vh", true, three_addresses(), 1)
            .unwrap();
        let b = ClusterDescriptor::with_addresses("u", "p", "/vh", true, reversed, 99).unwrap();

        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn equality_respects_credentials_and_tls() {
        let base = ClusterDescriptor::with_addresses("u", "p", "/vh", false, three_addresses(), 0)
            .unwrap();
        let other_user =
            ClusterDescriptor::with_addresses("u2", "p", "/vh", false, three_addresses(), 0)
                .unwrap();
        let tls = ClusterDescriptor::with_addresses("u", "p", "/vh", true, three_addresses(), 0)
            .unwrap();

        assert_ne!(base, other_user);
        assert_ne!(base, tls);
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let err =
            ClusterDescriptor::new("", "p", "/vh", false, NetworkAddress::new("h", 5672), 0)
                .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "username" }));

        let err =
            ClusterDescriptor::new("u", "", "/vh", false, NetworkAddress::new("h", 5672), 0)
                .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "password" }));
    }
}
