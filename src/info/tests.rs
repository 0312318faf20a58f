use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::*;
use crate::pieces::PieceSet;
use crate::tree::FileEntry;

/// The reference layout: 8 bytes over four files, three directories.
fn sample_info(piece_length: u64) -> TorrentInfo {
    let files = [
        FileEntry::new("test/t1.txt", 3),
        FileEntry::new("t2.txt", 2),
        FileEntry::new("dir1/dir/x.x", 1),
        FileEntry::new("dir1/dir/x.y", 2),
    ];
    TorrentInfo::build(42, piece_length, &files, Bytes::from_static(b"d3:foo3:bare"))
}

fn id_of(info: &TorrentInfo, path: &str) -> usize {
    info.nodes()
        .iter()
        .find(|n| n.path == path)
        .unwrap_or_else(|| panic!("no node {path:?}"))
        .id
}

struct StubTracker(PieceSet);

impl PieceTracker for StubTracker {
    fn valid_pieces(&self, _torrent: TorrentId) -> PieceSet {
        self.0.clone()
    }
}

#[test]
fn test_geometry_getters() {
    let info = sample_info(3);
    assert_eq!(info.torrent_id(), 42);
    assert_eq!(info.piece_length(), 3);
    assert_eq!(info.piece_count(), 3);
    assert_eq!(info.total_length(), 8);
    assert_eq!(info.chunk_size(), 16384);
    assert_eq!(info.node_count(), 8);
}

#[test]
fn test_position_and_size() {
    let info = sample_info(8);
    let t2 = id_of(&info, "t2.txt");
    assert_eq!(info.position(t2).unwrap(), 3);
    assert_eq!(info.size(t2).unwrap(), 2);

    let dir1 = id_of(&info, "dir1");
    assert_eq!(info.position(dir1).unwrap(), 5);
    assert_eq!(info.size(dir1).unwrap(), 3);

    assert_eq!(info.position(99), Err(InfoError::BadId(99)));
    assert_eq!(info.size(8), Err(InfoError::BadId(8)));
}

#[test]
fn test_file_path_and_long_name() {
    let info = sample_info(8);
    let x = id_of(&info, "dir1/dir/x.x");
    assert_eq!(info.file_path(x).unwrap(), "dir1/dir/x.x");

    let t2 = id_of(&info, "t2.txt");
    assert_eq!(
        info.long_name(&[x, t2]).unwrap(),
        "dir1/dir/x.x, t2.txt"
    );
    assert_eq!(info.long_name(&[]).unwrap(), "");
    assert_eq!(info.long_name(&[x, 99]), Err(InfoError::BadId(99)));
}

#[test]
fn test_mask_queries() {
    let info = sample_info(3);
    // Pieces: 0 covers bytes [0,3), 1 covers [3,6), 2 covers [6,8).
    let t1 = id_of(&info, "test/t1.txt");
    assert_eq!(info.mask(t1).unwrap().iter_set().collect::<Vec<_>>(), vec![0]);

    let t2 = id_of(&info, "t2.txt");
    assert_eq!(info.mask(t2).unwrap().iter_set().collect::<Vec<_>>(), vec![1]);

    let xy = id_of(&info, "dir1/dir/x.y");
    assert_eq!(info.mask(xy).unwrap().iter_set().collect::<Vec<_>>(), vec![2]);

    let union = info.mask_union(&[t1, xy]).unwrap();
    assert_eq!(union.iter_set().collect::<Vec<_>>(), vec![0, 2]);

    let empty = info.mask_union(&[]).unwrap();
    assert_eq!(empty.len(), 3);
    assert!(empty.is_empty());

    assert_eq!(info.mask(8), Err(InfoError::BadId(8)));
}

#[test]
fn test_range_mask() {
    let info = sample_info(3);
    let t1 = id_of(&info, "test/t1.txt");

    // First byte of t1 only.
    let head = info.range_mask(t1, 0, 1).unwrap();
    assert_eq!(head.iter_set().collect::<Vec<_>>(), vec![0]);

    // Empty sub-range claims nothing.
    let none = info.range_mask(t1, 1, 0).unwrap();
    assert!(none.is_empty());

    // Sub-ranges past the file end are rejected.
    assert_eq!(
        info.range_mask(t1, 2, 2),
        Err(InfoError::BadRange {
            start: 2,
            len: 2,
            size: 3
        })
    );
}

#[test]
fn test_range_mask_crosses_piece_boundary() {
    let info = sample_info(2);
    // t2.txt spans bytes [3,5): pieces 1 and 2 of four 2-byte pieces.
    let t2 = id_of(&info, "t2.txt");
    assert_eq!(
        info.range_mask(t2, 0, 2).unwrap().iter_set().collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(
        info.range_mask(t2, 1, 1).unwrap().iter_set().collect::<Vec<_>>(),
        vec![2]
    );
}

#[test]
fn test_tree_children_progress() {
    let info = sample_info(3);
    let mut valid = PieceSet::new(3);
    valid.set(0);

    let rows = info.tree_children(0, &StubTracker(valid)).unwrap();
    assert_eq!(rows.len(), 3);

    let test_row = &rows[0];
    assert_eq!(test_row.name, "test");
    assert!(!test_row.is_leaf);
    assert_eq!(test_row.capacity, 1);
    assert!((test_row.progress - 1.0).abs() < f64::EPSILON);

    let t2_row = &rows[1];
    assert_eq!(t2_row.name, "t2.txt");
    assert!(t2_row.is_leaf);
    assert_eq!(t2_row.capacity, 0);
    assert!((t2_row.progress - 0.0).abs() < f64::EPSILON);

    // dir1 owns pieces {1, 2}, neither of which is valid.
    let dir1_row = &rows[2];
    assert_eq!(dir1_row.size, 3);
    assert!((dir1_row.progress - 0.0).abs() < f64::EPSILON);
}

#[test]
fn test_tree_children_zero_size_child_reports_done() {
    let files = [FileEntry::new("data", 4), FileEntry::new("empty", 0)];
    let info = TorrentInfo::build(7, 4, &files, Bytes::new());

    let rows = info
        .tree_children(0, &StubTracker(PieceSet::new(1)))
        .unwrap();
    let empty_row = rows.iter().find(|r| r.name == "empty").unwrap();
    assert!((empty_row.progress - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_tree_children_bad_id() {
    let info = sample_info(8);
    assert!(matches!(
        info.tree_children(100, &StubTracker(PieceSet::new(1))),
        Err(InfoError::BadId(100))
    ));
}

#[test]
fn test_minimize_collapses_complete_directories() {
    let info = sample_info(8);
    let all: Vec<usize> = (1..info.node_count()).collect();
    let kept = info.minimize_files(&all).unwrap();

    let paths: Vec<&str> = kept
        .iter()
        .map(|&id| info.file_path(id).unwrap())
        .collect();
    assert_eq!(paths, vec!["test", "t2.txt", "dir1"]);
}

#[test]
fn test_minimize_leaves_only_selection_untouched() {
    let info = sample_info(8);
    let leaves = vec![
        id_of(&info, "test/t1.txt"),
        id_of(&info, "t2.txt"),
        id_of(&info, "dir1/dir/x.x"),
    ];
    assert_eq!(info.minimize_files(&leaves).unwrap(), leaves);
}

#[test]
fn test_minimize_is_idempotent_and_preserves_union() {
    let info = sample_info(3);
    let all: Vec<usize> = (1..info.node_count()).collect();

    let once = info.minimize_files(&all).unwrap();
    let twice = info.minimize_files(&once).unwrap();
    assert_eq!(once, twice);

    assert_eq!(
        info.mask_union(&all).unwrap(),
        info.mask_union(&once).unwrap()
    );
}

#[test]
fn test_minimize_ignores_caller_order() {
    let info = sample_info(8);
    let dir1 = id_of(&info, "dir1");
    let xx = id_of(&info, "dir1/dir/x.x");
    // Descendant listed first still collapses into the ancestor.
    assert_eq!(info.minimize_files(&[xx, dir1]).unwrap(), vec![dir1]);
}

#[test]
fn test_minimize_rejects_unknown_id() {
    let info = sample_info(8);
    assert_eq!(info.minimize_files(&[1, 50]), Err(InfoError::BadId(50)));
}

#[test]
fn test_mask_to_files_root_exact() {
    let info = sample_info(3);
    let universal = PieceSet::full(3);
    assert_eq!(info.mask_to_files(&universal), vec![0]);
}

#[test]
fn test_mask_to_files_sibling_union() {
    // One-byte pieces: no boundary sharing between files.
    let info = sample_info(1);
    let t1 = id_of(&info, "test/t1.txt");
    let t2 = id_of(&info, "t2.txt");

    // Pieces {0..5}: exactly t1 ∪ t2. "test" has the same mask as its
    // only file and is emitted in its place; dir1's subtree doesn't fit.
    let request = info.mask_union(&[t1, t2]).unwrap();
    let cover = info.mask_to_files(&request);
    let paths: Vec<&str> = cover
        .iter()
        .map(|&id| info.file_path(id).unwrap())
        .collect();
    assert_eq!(paths, vec!["test", "t2.txt"]);
}

#[test]
fn test_mask_to_files_parent_when_union_matches() {
    let info = sample_info(1);
    let dir1 = id_of(&info, "dir1");

    // dir1's mask equals the union of its two files' masks, so the
    // parent is returned rather than the files.
    let request = info.mask(dir1).unwrap();
    assert_eq!(info.mask_to_files(&request), vec![dir1]);
}

#[test]
fn test_mask_to_files_shared_boundary_sweeps_contained_files() {
    // With 3-byte pieces, t2.txt shares piece 1 with dir1's files; a
    // request for pieces {1, 2} therefore covers t2.txt entirely and it
    // is emitted alongside dir1.
    let info = sample_info(3);
    let dir1 = id_of(&info, "dir1");
    let t2 = id_of(&info, "t2.txt");

    let request = info.mask(dir1).unwrap();
    assert_eq!(info.mask_to_files(&request), vec![t2, dir1]);
}

#[test]
fn test_mask_to_files_is_sound_and_minimal() {
    let info = sample_info(2);
    let xx = id_of(&info, "dir1/dir/x.x");
    let t1 = id_of(&info, "test/t1.txt");
    let request = info.mask_union(&[t1, xx]).unwrap();

    let cover = info.mask_to_files(&request);
    let covered = info.mask_union(&cover).unwrap();
    assert!(covered.contains(&request));

    // No emitted node is an ancestor of another: pre-order ids plus
    // descendant counts give each node's subtree range.
    for (i, &a) in cover.iter().enumerate() {
        for &b in &cover[i + 1..] {
            let subtree = a + 1..=a + info.nodes()[a].descendants;
            assert!(!subtree.contains(&b), "{a} is an ancestor of {b}");
        }
    }
}

#[test]
fn test_mask_to_files_skips_zero_size_files() {
    let files = [
        FileEntry::new("a", 4),
        FileEntry::new("empty", 0),
        FileEntry::new("b", 4),
    ];
    let info = TorrentInfo::build(9, 4, &files, Bytes::new());

    let a = id_of(&info, "a");
    let cover = info.mask_to_files(&info.mask(a).unwrap());
    assert_eq!(cover, vec![a]);
}

#[test]
fn test_metadata_access() {
    let info = sample_info(8);
    assert_eq!(info.metadata_size(), 12);
    assert_eq!(info.metadata_block_count(), 1);
    assert_eq!(info.metadata_block(0).unwrap(), Bytes::from_static(b"d3:foo3:bare"));
    assert_eq!(info.metadata_block(1), Err(InfoError::BadBlock(1)));
}

#[test]
fn test_info_hash_identity() {
    let info = sample_info(8);
    assert_eq!(
        *info.info_hash(),
        InfoHash::from_info_bytes(b"d3:foo3:bare")
    );
}

#[tokio::test]
async fn test_registry_register_and_lookup() {
    let registry = ServiceRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.lookup(42).is_none());

    registry.register(Arc::new(sample_info(8))).unwrap();
    assert_eq!(registry.len(), 1);

    let info = registry.lookup(42).expect("registered");
    assert_eq!(info.torrent_id(), 42);
}

#[tokio::test]
async fn test_registry_collision() {
    let registry = ServiceRegistry::new();
    registry.register(Arc::new(sample_info(8))).unwrap();
    assert_eq!(
        registry.register(Arc::new(sample_info(8))),
        Err(InfoError::AlreadyRegistered(42))
    );
}

#[tokio::test]
async fn test_registry_await_sees_later_registration() {
    let registry = Arc::new(ServiceRegistry::new());

    let waiter = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.await_torrent(42).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    registry.register(Arc::new(sample_info(8))).unwrap();

    let info = waiter.await.unwrap().unwrap();
    assert_eq!(info.torrent_id(), 42);
}

#[tokio::test]
async fn test_registry_await_times_out() {
    let registry = ServiceRegistry::new();
    let err = registry
        .await_torrent_for(7, Duration::from_millis(30))
        .await;
    assert_eq!(err, Err(InfoError::AwaitTimeout(7)));
}

#[tokio::test]
async fn test_registry_deregister() {
    let registry = ServiceRegistry::new();
    registry.register(Arc::new(sample_info(8))).unwrap();

    let removed = registry.deregister(42).expect("was registered");
    assert_eq!(removed.torrent_id(), 42);
    assert!(registry.lookup(42).is_none());
    assert!(registry.deregister(42).is_none());

    // The id is free again after deregistration.
    registry.register(Arc::new(sample_info(8))).unwrap();
}
