use super::service::TorrentId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfoError {
    #[error("unknown node id {0}")]
    BadId(usize),

    #[error("metadata block {0} out of range")]
    BadBlock(usize),

    #[error("byte range {start}+{len} exceeds file size {size}")]
    BadRange { start: u64, len: u64, size: u64 },

    #[error("torrent {0} already registered")]
    AlreadyRegistered(TorrentId),

    #[error("timed out waiting for torrent {0}")]
    AwaitTimeout(TorrentId),
}
