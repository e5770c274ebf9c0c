//! Bandwidth classification.
//!
//! Rating tables are split by the occupied bandwidth of the cell they rate:
//! a narrow carrier and a wide carrier on the same channel couple into
//! different display harmonics.

use crate::config::NARROW_BANDWIDTH_MAX_KHZ;

/// Bucket of narrow carriers (`<= 10 MHz`).
pub const NARROW_BUCKET: usize = 0;
/// Bucket of wide carriers (`> 10 MHz`).
pub const WIDE_BUCKET: usize = 1;

/// Bucket index for `bandwidth_khz` using the production threshold.
#[must_use]
pub const fn classify_bandwidth(bandwidth_khz: u32) -> usize {
    classify_with_threshold(bandwidth_khz, NARROW_BANDWIDTH_MAX_KHZ)
}

/// Bucket index for `bandwidth_khz`; the threshold itself is narrow.
#[must_use]
pub const fn classify_with_threshold(bandwidth_khz: u32, narrow_max_khz: u32) -> usize {
    if bandwidth_khz <= narrow_max_khz {
        NARROW_BUCKET
    } else {
        WIDE_BUCKET
    }
}

/// Bucket index, or `None` when the table has no such bucket.
///
/// A table configured with only a narrow bucket classifies every wide
/// carrier to `None`.
#[must_use]
pub const fn bucket_for(bandwidth_khz: u32, narrow_max_khz: u32, bucket_count: usize) -> Option<usize> {
    let bucket = classify_with_threshold(bandwidth_khz, narrow_max_khz);
    if bucket < bucket_count {
        Some(bucket)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_narrow() {
        assert_eq!(classify_bandwidth(10_000), NARROW_BUCKET);
        assert_eq!(classify_bandwidth(10_001), WIDE_BUCKET);
        assert_eq!(classify_bandwidth(0), NARROW_BUCKET);
        assert_eq!(classify_bandwidth(u32::MAX), WIDE_BUCKET);
    }

    #[test]
    fn missing_bucket_is_none() {
        assert_eq!(bucket_for(20_000, 10_000, 1), None);
        assert_eq!(bucket_for(5_000, 10_000, 1), Some(0));
        assert_eq!(bucket_for(20_000, 10_000, 2), Some(1));
        assert_eq!(bucket_for(5_000, 10_000, 0), None);
    }
}
