//! tindex - static torrent metadata services
//!
//! This library implements the static-information core of a BitTorrent
//! client: everything that can be derived once from a torrent's metainfo
//! and then served immutably to the rest of the application.
//!
//! # Modules
//!
//! - [`pieces`] - Piece-sets and byte-range coverage masks
//! - [`tree`] - File/directory tree with dense ids, offsets and masks
//! - [`info`] - The per-torrent info service, BEP-9 metadata blocks and
//!   the process-wide service registry
//! - [`dht`] - Wire codec for the companion overlay DHT packets
//!
//! # Overview
//!
//! Construction flows from a decoded metainfo: the file list becomes a
//! tree of nodes carrying byte offsets and piece masks, the raw
//! bencoded info-dict is sliced into 16 KiB metadata blocks, and the
//! resulting [`TorrentInfo`] is published in a [`ServiceRegistry`] for
//! concurrent, lock-free reads. The DHT packet codec is pure and lives
//! here because its contract (the encode/decode round-trip) is tied to
//! torrent identity rather than to socket handling.

pub mod constants;
pub mod dht;
pub mod info;
pub mod pieces;
pub mod tree;

pub use dht::{DhtError, FindMode, NodeDescriptor, NodeId, Packet, QueryBody, ResponseBody};
pub use info::{
    ChildSummary, InfoError, InfoHash, MetadataBlocks, PieceTracker, ServiceRegistry, TorrentId,
    TorrentInfo,
};
pub use pieces::{coverage, PieceSet};
pub use tree::{FileEntry, Node, NodeKind};
