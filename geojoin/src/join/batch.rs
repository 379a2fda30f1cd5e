//! Batch planning for the spatial join.

use std::ops::Range;

/// Default number of concurrent queries per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Smallest allowed batch size.
pub const MIN_BATCH_SIZE: usize = 1;

/// Largest allowed batch size.
pub const MAX_BATCH_SIZE: usize = 100;

/// Clamps a requested batch size to the allowed range, logging when clamped.
pub fn clamp_batch_size(requested: usize) -> usize {
    if requested < MIN_BATCH_SIZE {
        tracing::warn!(
            requested,
            min = MIN_BATCH_SIZE,
            "batch_size below minimum, clamping to {}",
            MIN_BATCH_SIZE
        );
        MIN_BATCH_SIZE
    } else if requested > MAX_BATCH_SIZE {
        tracing::warn!(
            requested,
            max = MAX_BATCH_SIZE,
            "batch_size above maximum, clamping to {} (protects the query service)",
            MAX_BATCH_SIZE
        );
        MAX_BATCH_SIZE
    } else {
        requested
    }
}

/// Number of batches needed for `len` probes: ⌈len / batch_size⌉.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

/// Consecutive index ranges covering `0..len`, each at most `batch_size`
/// long. Batch `k` covers `k * batch_size .. min((k + 1) * batch_size, len)`.
pub fn batch_ranges(len: usize, batch_size: usize) -> impl Iterator<Item = Range<usize>> {
    let size = batch_size.max(1);
    (0..len).step_by(size).map(move |start| start..(start + size).min(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_cover_remainder() {
        let ranges: Vec<_> = batch_ranges(23, 10).collect();
        assert_eq!(ranges, vec![0..10, 10..20, 20..23]);
        assert_eq!(batch_count(23, 10), 3);
    }

    #[test]
    fn test_exact_multiple() {
        let ranges: Vec<_> = batch_ranges(20, 10).collect();
        assert_eq!(ranges, vec![0..10, 10..20]);
    }

    #[test]
    fn test_empty_probe_set() {
        assert_eq!(batch_ranges(0, 10).count(), 0);
        assert_eq!(batch_count(0, 10), 0);
    }

    #[test]
    fn test_ranges_match_count_for_many_sizes() {
        for len in 0..60 {
            for size in 1..12 {
                let ranges: Vec<_> = batch_ranges(len, size).collect();
                assert_eq!(ranges.len(), batch_count(len, size));
                for (k, range) in ranges.iter().enumerate() {
                    assert_eq!(range.start, k * size);
                    assert_eq!(range.end, ((k + 1) * size).min(len));
                }
            }
        }
    }

    #[test]
    fn test_clamp_batch_size() {
        assert_eq!(clamp_batch_size(0), MIN_BATCH_SIZE);
        assert_eq!(clamp_batch_size(10), 10);
        assert_eq!(clamp_batch_size(1_000), MAX_BATCH_SIZE);
    }
}
