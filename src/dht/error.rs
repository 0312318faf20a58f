use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DhtError {
    #[error("truncated packet")]
    Truncated,

    #[error("unknown packet kind: {0:#04x}")]
    UnknownPacketKind(u8),

    #[error("unknown operation: {0:#04x}")]
    UnknownOp(u8),

    #[error("unknown find mode: {0:#04x}")]
    UnknownFindMode(u8),

    #[error("unknown address family: {0:#04x}")]
    UnknownAddressFamily(u8),

    #[error("integer field overflows")]
    IntegerOverflow,

    #[error("trailing bytes after packet")]
    TrailingBytes,

    #[error("invalid node id length")]
    InvalidNodeId,
}
