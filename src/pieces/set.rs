use std::fmt;

use bytes::Bytes;

/// A fixed-width bitset over a torrent's pieces.
///
/// Each bit records membership of one piece. Bits are numbered from the
/// high bit of the first byte, matching the on-wire bitfield layout.
/// Every set carries its declared width; binary operations require both
/// operands to share it, and the result keeps it.
#[derive(Clone, PartialEq, Eq)]
pub struct PieceSet {
    bits: Vec<u8>,
    piece_count: usize,
}

impl PieceSet {
    /// Creates an empty set over `piece_count` pieces.
    pub fn new(piece_count: usize) -> Self {
        Self {
            bits: vec![0; piece_count.div_ceil(8)],
            piece_count,
        }
    }

    /// Creates a set containing every piece.
    pub fn full(piece_count: usize) -> Self {
        let mut set = Self {
            bits: vec![0xFF; piece_count.div_ceil(8)],
            piece_count,
        };
        set.clear_spare_bits();
        set
    }

    /// Creates a set from a serialized bitstring.
    ///
    /// Short input is zero-extended; bits past `piece_count` are dropped.
    pub fn from_bytes(bytes: &[u8], piece_count: usize) -> Self {
        let mut bits = bytes.to_vec();
        bits.resize(piece_count.div_ceil(8), 0);

        let mut set = Self { bits, piece_count };
        set.clear_spare_bits();
        set
    }

    /// Returns true if piece `index` is in the set.
    pub fn has(&self, index: usize) -> bool {
        if index >= self.piece_count {
            return false;
        }
        (self.bits[index / 8] >> (7 - (index % 8))) & 1 == 1
    }

    /// Adds piece `index` to the set.
    pub fn set(&mut self, index: usize) {
        if index >= self.piece_count {
            return;
        }
        self.bits[index / 8] |= 1 << (7 - (index % 8));
    }

    /// Removes piece `index` from the set.
    pub fn unset(&mut self, index: usize) {
        if index >= self.piece_count {
            return;
        }
        self.bits[index / 8] &= !(1 << (7 - (index % 8)));
    }

    /// Adds every piece in `[start, end)`, filling whole bytes at a time.
    pub fn set_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.piece_count);
        if start >= end {
            return;
        }

        let first_full = start.div_ceil(8);
        let last_full = end / 8;

        if first_full > last_full {
            // Range falls inside a single byte.
            for index in start..end {
                self.bits[index / 8] |= 1 << (7 - (index % 8));
            }
            return;
        }

        if start % 8 != 0 {
            self.bits[start / 8] |= 0xFF >> (start % 8);
        }
        for byte in &mut self.bits[first_full..last_full] {
            *byte = 0xFF;
        }
        if end % 8 != 0 {
            self.bits[last_full] |= 0xFF << (8 - end % 8);
        }
    }

    /// Number of pieces in the set.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Declared width of the set.
    pub fn len(&self) -> usize {
        self.piece_count
    }

    /// Returns true if no piece is in the set.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Returns true if every piece is in the set.
    pub fn is_full(&self) -> bool {
        self.count() == self.piece_count
    }

    /// Pieces in either set. Both operands must share a width.
    pub fn union(&self, other: &PieceSet) -> PieceSet {
        self.zip_with(other, |a, b| a | b)
    }

    /// Pieces in both sets. Both operands must share a width.
    pub fn intersect(&self, other: &PieceSet) -> PieceSet {
        self.zip_with(other, |a, b| a & b)
    }

    /// Pieces in `self` but not in `other`. Both operands must share a width.
    pub fn difference(&self, other: &PieceSet) -> PieceSet {
        self.zip_with(other, |a, b| a & !b)
    }

    /// Returns true if every piece of `other` is also in `self`.
    pub fn contains(&self, other: &PieceSet) -> bool {
        other.difference(self).is_empty()
    }

    /// The raw MSB-first bitstring.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Serializes the set to an owned bitstring.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bits)
    }

    /// Indices of all pieces in the set.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.piece_count).filter(|&i| self.has(i))
    }

    fn zip_with(&self, other: &PieceSet, op: impl Fn(u8, u8) -> u8) -> PieceSet {
        assert_eq!(
            self.piece_count, other.piece_count,
            "piece set width mismatch"
        );
        PieceSet {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| op(a, b))
                .collect(),
            piece_count: self.piece_count,
        }
    }

    /// Zeroes bits in the last byte that don't correspond to pieces.
    fn clear_spare_bits(&mut self) {
        let spare = self.bits.len() * 8 - self.piece_count;
        if spare > 0 {
            if let Some(last) = self.bits.last_mut() {
                *last &= 0xFF << spare;
            }
        }
    }
}

impl fmt::Debug for PieceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PieceSet({}/{})", self.count(), self.piece_count)
    }
}
