// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::CreationError;

/// The purely geometric parameters of a [`crate::Histogram`], derived once from
/// `(lowest_trackable_value, highest_trackable_value, significant_figures)`.
///
/// Kept as a free-standing calculator so that the derivation can be unit tested in isolation
/// from the atomics and allocation concerns that live in [`crate::Histogram`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BucketConfig {
    pub(crate) lowest_trackable_value: i64,
    pub(crate) highest_trackable_value: i64,
    pub(crate) significant_figures: u8,
    pub(crate) unit_magnitude: u32,
    pub(crate) sub_bucket_half_count_magnitude: u32,
    pub(crate) sub_bucket_half_count: i64,
    pub(crate) sub_bucket_count: i64,
    pub(crate) sub_bucket_mask: i64,
    pub(crate) bucket_count: u32,
    pub(crate) counts_len: usize,
}

impl BucketConfig {
    pub(crate) fn new(
        lowest_trackable_value: i64,
        highest_trackable_value: i64,
        significant_figures: u8,
    ) -> Result<Self, CreationError> {
        if lowest_trackable_value < 1 {
            return Err(CreationError::LowIsZero);
        }
        if highest_trackable_value < 2 * lowest_trackable_value {
            return Err(CreationError::HighLessThanTwiceLow);
        }
        if !(1..=5).contains(&significant_figures) {
            return Err(CreationError::SigFigsOutOfRange);
        }

        let largest_value_with_single_unit_resolution =
            2 * 10_i64.pow(significant_figures as u32);

        // smallest power of two covering `largest_value_with_single_unit_resolution`
        let sub_bucket_count_magnitude =
            (largest_value_with_single_unit_resolution as f64).log2().ceil() as u32;
        let sub_bucket_half_count_magnitude = sub_bucket_count_magnitude.max(1) - 1;

        let unit_magnitude = 63 - (lowest_trackable_value as u64).leading_zeros();

        if unit_magnitude + sub_bucket_half_count_magnitude > 62 {
            return Err(CreationError::CannotRepresentSigFigBeyondLow);
        }

        let sub_bucket_count = 1_i64 << (sub_bucket_half_count_magnitude + 1);
        let sub_bucket_half_count = sub_bucket_count / 2;
        let sub_bucket_mask = (sub_bucket_count - 1) << unit_magnitude;

        let bucket_count =
            buckets_needed_to_cover(highest_trackable_value, sub_bucket_count, unit_magnitude);

        let counts_len = (bucket_count as usize + 1) * sub_bucket_half_count as usize;

        Ok(BucketConfig {
            lowest_trackable_value,
            highest_trackable_value,
            significant_figures,
            unit_magnitude,
            sub_bucket_half_count_magnitude,
            sub_bucket_half_count,
            sub_bucket_count,
            sub_bucket_mask,
            bucket_count,
            counts_len,
        })
    }
}

/// Doubles `sub_bucket_count << unit_magnitude` until it covers `value`, returning the number
/// of doublings performed (i.e. the number of buckets beyond the first needed to trace `value`).
fn buckets_needed_to_cover(value: i64, sub_bucket_count: i64, unit_magnitude: u32) -> u32 {
    let mut smallest_untrackable_value = sub_bucket_count << unit_magnitude;
    let mut buckets_needed = 1;
    while smallest_untrackable_value <= value {
        if smallest_untrackable_value > i64::MAX / 2 {
            return buckets_needed + 1;
        }
        smallest_untrackable_value <<= 1;
        buckets_needed += 1;
    }
    buckets_needed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_low_below_one() {
        assert_eq!(
            CreationError::LowIsZero,
            BucketConfig::new(0, 100, 3).unwrap_err()
        );
    }

    #[test]
    fn rejects_high_less_than_twice_low() {
        assert_eq!(
            CreationError::HighLessThanTwiceLow,
            BucketConfig::new(100, 150, 3).unwrap_err()
        );
    }

    #[test]
    fn rejects_sig_figs_out_of_range() {
        assert_eq!(
            CreationError::SigFigsOutOfRange,
            BucketConfig::new(1, 100, 0).unwrap_err()
        );
        assert_eq!(
            CreationError::SigFigsOutOfRange,
            BucketConfig::new(1, 100, 6).unwrap_err()
        );
    }

    #[test]
    fn rejects_unrepresentable_combination() {
        assert_eq!(
            CreationError::CannotRepresentSigFigBeyondLow,
            BucketConfig::new((1_u64 as i64) << 53, i64::MAX, 3).unwrap_err()
        );
    }

    #[test]
    fn unit_magnitude_0() {
        let cfg = BucketConfig::new(1, 1_i64 << 32, 3).unwrap();
        assert_eq!(0, cfg.unit_magnitude);
        assert_eq!(2048, cfg.sub_bucket_count);
        assert_eq!(23, cfg.bucket_count);
    }

    #[test]
    fn unit_magnitude_12() {
        let cfg = BucketConfig::new(1_i64 << 12, 1_i64 << 32, 3).unwrap();
        assert_eq!(12, cfg.unit_magnitude);
        assert_eq!(2048, cfg.sub_bucket_count);
        assert_eq!(11, cfg.bucket_count);
    }

    #[test]
    fn counts_len_matches_reference_example() {
        // 7 buckets total, 2048 sub-buckets per bucket-pair -> 8 * 1024 slots
        let cfg = BucketConfig::new(1, 100_000, 3).unwrap();
        assert_eq!(7, cfg.bucket_count);
        assert_eq!(8 * 1024, cfg.counts_len);
    }
}
