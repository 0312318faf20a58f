//! Torrent file tree.
//!
//! Transforms the flat file list of a metainfo into a tree of file and
//! directory nodes. Nodes live in a dense ID-indexed arena; parent/child
//! links are integer ids, assigned by depth-first pre-order with the
//! synthetic root at id 0. Every node knows its byte offset within the
//! torrent's concatenated content, its size, and the set of pieces
//! covering it.

mod builder;
mod node;

pub use builder::{build, FileEntry};
pub use node::{Node, NodeKind};
