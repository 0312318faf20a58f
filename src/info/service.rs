use bytes::Bytes;
use tracing::debug;

use super::error::InfoError;
use super::info_hash::InfoHash;
use super::metadata::MetadataBlocks;
use crate::constants::CHUNK_SIZE;
use crate::pieces::{coverage, PieceSet};
use crate::tree::{self, FileEntry, Node};

/// Opaque key identifying a torrent within the application.
pub type TorrentId = u64;

/// Collaborator interface to the download controller.
///
/// The info service itself holds no download state; progress reporting
/// asks the controller which pieces have been fetched and verified.
pub trait PieceTracker {
    fn valid_pieces(&self, torrent: TorrentId) -> PieceSet;
}

/// One row of a UI file-tree listing.
#[derive(Debug, Clone)]
pub struct ChildSummary {
    pub id: usize,
    pub name: String,
    pub size: u64,
    /// Total nodes beneath this entry; zero for files.
    pub capacity: usize,
    pub is_leaf: bool,
    /// Fraction of the entry's pieces already verified, in `[0, 1]`.
    pub progress: f64,
}

/// The static-information service for one torrent.
///
/// Built once from the decoded metainfo and the raw bencoded info-dict,
/// then immutable: readers share it through an `Arc` without locking, and
/// an abandoned query can never corrupt it. All answers derive from the
/// ID-indexed node arena built by [`crate::tree::build`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use tindex::{FileEntry, TorrentInfo};
///
/// let files = [
///     FileEntry::new("album/track1.flac", 30_000),
///     FileEntry::new("album/track2.flac", 14_000),
/// ];
/// let info = TorrentInfo::build(1, 16_384, &files, Bytes::from_static(b"d4:name5:albume"));
///
/// assert_eq!(info.piece_count(), 3);
/// assert_eq!(info.size(0).unwrap(), 44_000);
/// ```
#[derive(Debug, PartialEq)]
pub struct TorrentInfo {
    torrent_id: TorrentId,
    piece_length: u64,
    total_length: u64,
    piece_count: usize,
    nodes: Vec<Node>,
    metadata: MetadataBlocks,
    info_hash: InfoHash,
}

impl TorrentInfo {
    /// Constructs the service from a decoded metainfo.
    ///
    /// `files` is the metainfo file list in declared order; `info_dict`
    /// is the raw bencoded info dictionary, kept verbatim for metadata
    /// exchange and identity.
    ///
    /// # Panics
    ///
    /// Panics on inconsistent layout input (zero piece length, file list
    /// whose aggregation disagrees with itself). A service is either
    /// fully built or not built at all.
    pub fn build(
        torrent_id: TorrentId,
        piece_length: u64,
        files: &[FileEntry],
        info_dict: Bytes,
    ) -> Self {
        let nodes = tree::build(piece_length, files);
        let total_length = nodes[0].size;
        let piece_count = total_length.div_ceil(piece_length) as usize;
        let info_hash = InfoHash::from_info_bytes(&info_dict);

        debug!(
            torrent_id,
            nodes = nodes.len(),
            pieces = piece_count,
            total_length,
            "torrent info built"
        );

        Self {
            torrent_id,
            piece_length,
            total_length,
            piece_count,
            nodes,
            metadata: MetadataBlocks::new(info_dict),
            info_hash,
        }
    }

    pub fn torrent_id(&self) -> TorrentId {
        self.torrent_id
    }

    /// Piece length declared by the metainfo.
    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    /// Size of the chunks pieces are requested in.
    pub fn chunk_size(&self) -> u32 {
        CHUNK_SIZE
    }

    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// SHA1 identity of the info-dict.
    pub fn info_hash(&self) -> &InfoHash {
        &self.info_hash
    }

    /// Byte offset of node `id` within the torrent content.
    pub fn position(&self, id: usize) -> Result<u64, InfoError> {
        Ok(self.node(id)?.offset)
    }

    /// Byte size of node `id` (aggregate size for directories).
    pub fn size(&self, id: usize) -> Result<u64, InfoError> {
        Ok(self.node(id)?.size)
    }

    /// Relative path of node `id`; empty for the root.
    pub fn file_path(&self, id: usize) -> Result<&str, InfoError> {
        Ok(&self.node(id)?.path)
    }

    /// Relative paths of `ids` joined with `", "`, the display form used
    /// by interfaces listing a selection.
    pub fn long_name(&self, ids: &[usize]) -> Result<String, InfoError> {
        let mut parts = Vec::with_capacity(ids.len());
        for &id in ids {
            parts.push(self.node(id)?.path.as_str());
        }
        Ok(parts.join(", "))
    }

    /// Direct children of node `id`, with download progress computed
    /// against the controller's verified pieces.
    pub fn tree_children(
        &self,
        id: usize,
        tracker: &dyn PieceTracker,
    ) -> Result<Vec<ChildSummary>, InfoError> {
        let node = self.node(id)?;
        let valid = tracker.valid_pieces(self.torrent_id);

        Ok(node
            .children
            .iter()
            .map(|&child_id| {
                let child = &self.nodes[child_id];
                let wanted = child.pieces.count();
                let progress = if wanted == 0 {
                    1.0
                } else {
                    child.pieces.intersect(&valid).count() as f64 / wanted as f64
                };
                ChildSummary {
                    id: child_id,
                    name: child.name.clone(),
                    size: child.size,
                    capacity: child.descendants,
                    is_leaf: child.is_file(),
                    progress,
                }
            })
            .collect())
    }

    /// The piece mask of node `id`.
    pub fn mask(&self, id: usize) -> Result<PieceSet, InfoError> {
        Ok(self.node(id)?.pieces.clone())
    }

    /// Union of the masks of `ids`; the empty selection yields the empty
    /// mask at full width.
    pub fn mask_union(&self, ids: &[usize]) -> Result<PieceSet, InfoError> {
        let mut union = PieceSet::new(self.piece_count);
        for &id in ids {
            union = union.union(&self.node(id)?.pieces);
        }
        Ok(union)
    }

    /// Pieces covering bytes `[part_start, part_start + part_len)` of
    /// file `id`. The range must lie inside the file.
    pub fn range_mask(
        &self,
        id: usize,
        part_start: u64,
        part_len: u64,
    ) -> Result<PieceSet, InfoError> {
        let node = self.node(id)?;
        if part_start + part_len > node.size {
            return Err(InfoError::BadRange {
                start: part_start,
                len: part_len,
                size: node.size,
            });
        }
        Ok(coverage(
            node.offset + part_start,
            part_len,
            self.piece_length,
            self.total_length,
        ))
    }

    /// The minimal set of tree nodes whose masks cover `mask`.
    ///
    /// Descends from the root, emitting a node (and pruning its subtree)
    /// as soon as its non-empty mask is contained in the request. Output
    /// is in depth-first order; no emitted node is an ancestor of
    /// another. A request equal to the root's mask collapses to the root.
    pub fn mask_to_files(&self, mask: &PieceSet) -> Vec<usize> {
        let root = &self.nodes[0];
        if root.pieces == *mask {
            return vec![0];
        }
        let mut cover = Vec::new();
        self.cover_into(&root.children, mask, &mut cover);
        cover
    }

    fn cover_into(&self, children: &[usize], mask: &PieceSet, out: &mut Vec<usize>) {
        for &child_id in children {
            let child = &self.nodes[child_id];
            if !child.pieces.is_empty() && mask.contains(&child.pieces) {
                out.push(child_id);
            } else {
                self.cover_into(&child.children, mask, out);
            }
        }
    }

    /// Drops every listed node already covered by an earlier listed
    /// ancestor, preserving the union of piece masks.
    ///
    /// Ids are brought into tree (pre-order) order first, so ancestors
    /// subsume their descendants regardless of how the caller ordered
    /// the selection. Idempotent.
    pub fn minimize_files(&self, ids: &[usize]) -> Result<Vec<usize>, InfoError> {
        let mut sorted = ids.to_vec();
        for &id in &sorted {
            self.node(id)?;
        }
        sorted.sort_unstable();
        sorted.dedup();

        let mut kept: Vec<usize> = Vec::new();
        for id in sorted {
            let node = &self.nodes[id];
            let covered = kept.last().is_some_and(|&prev| {
                let prev = &self.nodes[prev];
                node.offset >= prev.offset && node.offset < prev.end()
            });
            if !covered {
                kept.push(id);
            }
        }
        Ok(kept)
    }

    /// Byte size of the bencoded info-dict.
    pub fn metadata_size(&self) -> usize {
        self.metadata.size()
    }

    /// Number of 16 KiB metadata blocks.
    pub fn metadata_block_count(&self) -> usize {
        self.metadata.block_count()
    }

    /// Metadata block `index` for BEP-9 exchange.
    pub fn metadata_block(&self, index: usize) -> Result<Bytes, InfoError> {
        self.metadata.block(index)
    }

    /// Read-only access to the node arena.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn node(&self, id: usize) -> Result<&Node, InfoError> {
        self.nodes.get(id).ok_or(InfoError::BadId(id))
    }
}
