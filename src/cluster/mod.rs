//! Broker cluster addressing: validated endpoints, connection profiles and
//! connection-string parsing.

mod address;
mod descriptor;
mod uri;

pub use address::{AddressSet, NetworkAddress};
pub use descriptor::{ClusterDescriptor, Environment};
