//! Overlay DHT wire codec.
//!
//! The pure packet codec for the companion Kademlia-style overlay: query,
//! response and error packets carrying transaction tags, 160-bit node
//! identifiers, store tokens and compact node lists. Owned here, next to
//! the torrent identity it is keyed by, because its testable contract is
//! the packet round-trip law; the routing table, socket handling and
//! lookup logic live with the DHT subsystem proper.
//!
//! Malformed input yields a single [`DhtError`] without partial state,
//! and one bad packet never taints the next.

mod error;
mod node;
mod packet;

pub use error::DhtError;
pub use node::{NodeDescriptor, NodeId};
pub use packet::{FindMode, Packet, QueryBody, ResponseBody};
