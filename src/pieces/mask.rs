//! Byte-range to piece-set coverage.

use super::set::PieceSet;

/// Computes the set of pieces touching any byte of `[from, from + size)`
/// within a torrent of `total_length` bytes cut into `piece_length`-byte
/// pieces.
///
/// The result width is `ceil(total_length / piece_length)`. A range that
/// ends mid-piece claims that piece; the next range starting inside the
/// same piece claims it too, so boundary pieces are shared between
/// adjacent files. A zero-size range claims nothing.
///
/// # Panics
///
/// Panics if `piece_length` is zero, exceeds a nonzero `total_length`, or
/// if the range overruns the torrent. These are construction-time layout
/// errors and must not survive into a running service.
pub fn coverage(from: u64, size: u64, piece_length: u64, total_length: u64) -> PieceSet {
    assert!(piece_length >= 1, "piece length must be positive");
    assert!(
        total_length == 0 || piece_length <= total_length,
        "piece length {piece_length} exceeds total length {total_length}"
    );
    assert!(
        from + size <= total_length,
        "range {from}+{size} overruns total length {total_length}"
    );

    let piece_count = total_length.div_ceil(piece_length) as usize;
    let mut mask = PieceSet::new(piece_count);
    if size == 0 {
        return mask;
    }

    let before = (from / piece_length) as usize;
    let to = from + size;

    // Split the range into a partial leading piece, whole middle pieces,
    // and a partial trailing piece. `middle` goes negative when the range
    // sits inside a single piece without touching either boundary.
    let left = (piece_length - from % piece_length) % piece_length;
    let right = to % piece_length;
    let middle = size as i64 - left as i64 - right as i64;
    assert_eq!(
        middle.rem_euclid(piece_length as i64),
        0,
        "piece decomposition of range {from}+{size} is not aligned"
    );

    let covered = middle.div_euclid(piece_length as i64)
        + i64::from(left > 0)
        + i64::from(right > 0);
    let covered = usize::try_from(covered).expect("negative piece span");
    assert!(
        before + covered <= piece_count,
        "range {from}+{size} covers pieces past the end"
    );

    mask.set_range(before, before + covered);
    mask
}
