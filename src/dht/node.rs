use std::fmt;
use std::net::{IpAddr, SocketAddr};

use rand::Rng as _;

use super::error::DhtError;
use crate::constants::NODE_ID_LEN;

/// A 160-bit overlay node identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub [u8; NODE_ID_LEN]);

impl NodeId {
    /// Draws a uniformly random identifier.
    pub fn generate() -> Self {
        let mut id = [0u8; NODE_ID_LEN];
        rand::rng().fill(&mut id);
        Self(id)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DhtError> {
        if bytes.len() != NODE_ID_LEN {
            return Err(DhtError::InvalidNodeId);
        }
        let mut id = [0u8; NODE_ID_LEN];
        id.copy_from_slice(bytes);
        Ok(Self(id))
    }

    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }

    /// XOR distance to another identifier.
    pub fn distance(&self, other: &NodeId) -> [u8; NODE_ID_LEN] {
        let mut dist = [0u8; NODE_ID_LEN];
        for (i, d) in dist.iter_mut().enumerate() {
            *d = self.0[i] ^ other.0[i];
        }
        dist
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A node as carried in DHT packet node lists: identifier plus contact
/// address. Both IPv4 and IPv6 contacts appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub addr: SocketAddr,
}

impl NodeDescriptor {
    pub fn new(id: NodeId, addr: SocketAddr) -> Self {
        Self { id, addr }
    }

    /// Returns true if the contact address is IPv4.
    pub fn is_v4(&self) -> bool {
        matches!(self.addr.ip(), IpAddr::V4(_))
    }
}
