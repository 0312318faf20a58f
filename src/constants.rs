//! Protocol constants and tuning parameters.

use std::time::Duration;

// ============================================================================
// Block and piece sizes
// ============================================================================

/// Download chunk size (16KB), the unit consumers request piece data in.
pub const CHUNK_SIZE: u32 = 16384;

/// Metadata block size for info-dict exchange (BEP-9).
pub const METADATA_BLOCK_SIZE: usize = 16384;

// ============================================================================
// Service registry
// ============================================================================

/// How long a consumer waits for a torrent's info service to appear
/// in the registry before giving up.
pub const AWAIT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// DHT constants
// ============================================================================

/// Node identifier width in bytes (160 bits).
pub const NODE_ID_LEN: usize = 20;
