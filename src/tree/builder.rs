use super::node::{Node, NodeKind};
use crate::pieces::coverage;

/// One file of the metainfo, in declared order.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path relative to the torrent root, `/`-separated.
    pub path: String,
    /// File length in bytes.
    pub length: u64,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        Self {
            path: path.into(),
            length,
        }
    }
}

/// Scratch node used while the tree shape is still being discovered.
struct Pending {
    kind: NodeKind,
    path: String,
    name: String,
    offset: u64,
    size: u64,
    children: Vec<usize>,
}

/// Builds the file tree arena from the metainfo's flat file list.
///
/// Files keep their declared order, so siblings are contiguous in offset.
/// Directory nodes are created the moment the first file inside them is
/// reached and take that file's offset. The synthetic root gets id 0 and
/// every node its pre-order id, offset, aggregate size and piece mask.
///
/// # Panics
///
/// Panics if directory aggregation disagrees with the declared file
/// lengths, or on an invalid piece geometry. Construction must not
/// produce a half-built tree.
pub fn build(piece_length: u64, files: &[FileEntry]) -> Vec<Node> {
    assert!(piece_length >= 1, "piece length must be positive");

    let mut arena = vec![Pending {
        kind: NodeKind::Directory,
        path: String::new(),
        name: String::new(),
        offset: 0,
        size: 0,
        children: Vec::new(),
    }];
    // Stack of currently open directories; the root never pops.
    let mut stack = vec![0usize];
    let mut offset = 0u64;

    for file in files {
        let dir = dir_of(&file.path);

        while !within(dir, &arena[*stack.last().expect("root popped")].path) {
            stack.pop();
        }

        // Descend component by component, opening directories as needed.
        loop {
            let top = *stack.last().expect("root popped");
            if arena[top].path == dir {
                break;
            }
            let opened = arena[top].path.len();
            let rest = if opened == 0 { dir } else { &dir[opened + 1..] };
            let component = rest.split('/').next().expect("empty path component");
            let path = join(&arena[top].path, component);

            let idx = arena.len();
            arena.push(Pending {
                kind: NodeKind::Directory,
                path,
                name: component.to_string(),
                offset,
                size: 0,
                children: Vec::new(),
            });
            arena[top].children.push(idx);
            stack.push(idx);
        }

        let top = *stack.last().expect("root popped");
        let idx = arena.len();
        arena.push(Pending {
            kind: NodeKind::File,
            path: file.path.clone(),
            name: base_of(&file.path).to_string(),
            offset,
            size: file.length,
            children: Vec::new(),
        });
        arena[top].children.push(idx);
        offset += file.length;
    }

    let total_length = offset;
    let aggregated = fill_sizes(&mut arena, 0);
    assert_eq!(
        aggregated, total_length,
        "directory aggregation disagrees with declared file lengths"
    );

    let mut nodes = Vec::with_capacity(arena.len());
    flatten(&arena, 0, piece_length, total_length, &mut nodes);
    nodes
}

/// Sums file lengths up the tree, filling directory sizes bottom-up.
fn fill_sizes(arena: &mut [Pending], idx: usize) -> u64 {
    if arena[idx].kind == NodeKind::File {
        return arena[idx].size;
    }
    let children = arena[idx].children.clone();
    let size = children.into_iter().map(|c| fill_sizes(arena, c)).sum();
    arena[idx].size = size;
    size
}

/// Pre-order walk assigning dense ids and computing piece masks.
fn flatten(
    arena: &[Pending],
    idx: usize,
    piece_length: u64,
    total_length: u64,
    out: &mut Vec<Node>,
) -> usize {
    let pending = &arena[idx];
    let id = out.len();
    out.push(Node {
        id,
        kind: pending.kind,
        path: pending.path.clone(),
        name: pending.name.clone(),
        offset: pending.offset,
        size: pending.size,
        children: Vec::new(),
        descendants: 0,
        pieces: coverage(pending.offset, pending.size, piece_length, total_length),
    });

    let mut child_ids = Vec::with_capacity(pending.children.len());
    for &child in &pending.children {
        child_ids.push(flatten(arena, child, piece_length, total_length, out));
    }

    let descendants = out.len() - id - 1;
    out[id].children = child_ids;
    out[id].descendants = descendants;
    id
}

/// Returns true if `dir` equals `open` or lies beneath it. The root
/// (empty path) contains everything.
fn within(dir: &str, open: &str) -> bool {
    if open.is_empty() || dir == open {
        return true;
    }
    dir.len() > open.len() && dir.starts_with(open) && dir.as_bytes()[open.len()] == b'/'
}

/// The directory part of a relative path: `dir_of("a/b") == "a"`,
/// `dir_of("a") == ""`.
fn dir_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// The final component: `base_of("a/b") == "b"`, `base_of("a") == "a"`.
fn base_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, base)| base)
}

/// Joining with the empty base yields the tail verbatim.
fn join(base: &str, component: &str) -> String {
    if base.is_empty() {
        component.to_string()
    } else {
        format!("{base}/{component}")
    }
}
