//! Static torrent information service.
//!
//! [`TorrentInfo`] is built once from a decoded metainfo (piece length and
//! file list) plus the raw bencoded info-dict, and is immutable from then
//! on. It answers every static query the rest of the client needs: node
//! positions and sizes, per-node piece masks, tree navigation for UIs,
//! reverse piece-set lookups, and BEP-9 metadata blocks.
//!
//! Concurrency model: construction completes before anyone can observe
//! the service; afterwards readers share an `Arc<TorrentInfo>` without
//! locking. The [`ServiceRegistry`] is the process-wide directory of
//! running services, keyed by torrent id, with a bounded await for
//! consumers that race service startup.

mod error;
mod info_hash;
mod metadata;
mod registry;
mod service;

pub use error::InfoError;
pub use info_hash::InfoHash;
pub use metadata::MetadataBlocks;
pub use registry::ServiceRegistry;
pub use service::{ChildSummary, PieceTracker, TorrentId, TorrentInfo};

#[cfg(test)]
mod tests;
