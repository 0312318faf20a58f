use bytes::Bytes;

use super::error::InfoError;
use crate::constants::METADATA_BLOCK_SIZE;

/// The bencoded info-dict sliced into metadata-exchange blocks (BEP-9).
///
/// Block `i` is bytes `[i * 16384, min((i + 1) * 16384, size))` of the
/// info-dict; every block except possibly the last is exactly 16384 bytes
/// and the blocks concatenate back to the original bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataBlocks {
    raw: Bytes,
}

impl MetadataBlocks {
    pub fn new(info_dict: Bytes) -> Self {
        Self { raw: info_dict }
    }

    /// Byte size of the bencoded info-dict.
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    /// Number of blocks the info-dict slices into.
    pub fn block_count(&self) -> usize {
        self.raw.len().div_ceil(METADATA_BLOCK_SIZE)
    }

    /// Returns block `index`, zero-copy.
    pub fn block(&self, index: usize) -> Result<Bytes, InfoError> {
        if index >= self.block_count() {
            return Err(InfoError::BadBlock(index));
        }
        let start = index * METADATA_BLOCK_SIZE;
        let end = (start + METADATA_BLOCK_SIZE).min(self.raw.len());
        Ok(self.raw.slice(start..end))
    }

    /// The whole info-dict.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}
