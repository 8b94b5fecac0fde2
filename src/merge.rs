// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Histogram;

impl Histogram {
    /// Adds every count recorded in `src` into `self`. Source values that fall outside
    /// `self`'s trackable range are dropped rather than recorded; the return value is the
    /// number of dropped sample *occurrences* (a source index with count 5 that is entirely
    /// out of range contributes 5, not 1).
    ///
    /// Not an atomic snapshot across the whole operation: concurrent recorders on either
    /// histogram may interleave with individual bucket updates.
    pub fn add(&self, src: &Histogram) -> i64 {
        let mut dropped = 0i64;

        for index in 0..src.counts_len() {
            let count = src.count_at_index(index);
            if count == 0 {
                continue;
            }
            let value = src.value_at_index(index);
            if !self.record_values(value, count) {
                dropped += count;
            }
        }

        if dropped > 0 {
            log::debug!("add: dropped {} sample(s) outside destination range", dropped);
        }

        dropped
    }

    /// As [`Histogram::add`], but each source sample is re-recorded through
    /// [`Histogram::record_corrected_values`], backfilling coordinated-omission samples as it
    /// goes.
    pub fn add_while_correcting_for_coordinated_omission(
        &self,
        src: &Histogram,
        expected_interval: i64,
    ) -> i64 {
        let mut dropped = 0i64;

        for index in 0..src.counts_len() {
            let count = src.count_at_index(index);
            if count == 0 {
                continue;
            }
            let value = src.value_at_index(index);
            if !self.record_corrected_values(value, count, expected_interval) {
                dropped += count;
            }
        }

        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_preserves_total_count_for_identical_geometry() {
        let src = Histogram::new(1, 100_000, 3).unwrap();
        for v in 1..1000 {
            src.record_value(v);
        }
        let dst = Histogram::new(1, 100_000, 3).unwrap();
        let dropped = dst.add(&src);
        assert_eq!(0, dropped);
        assert_eq!(src.total_count(), dst.total_count());
    }

    #[test]
    fn merge_drops_out_of_range_occurrences() {
        let src = Histogram::new(1, 10_000, 3).unwrap();
        src.record_values(5_000, 7);
        let dst = Histogram::new(1, 1_000, 3).unwrap();
        let dropped = dst.add(&src);
        assert_eq!(7, dropped);
        assert_eq!(0, dst.total_count());
    }

    #[test]
    fn merge_with_coordinated_omission_correction_expands_samples() {
        let src = Histogram::new(1, 100_000_000, 3).unwrap();
        src.record_value(10_000);
        let dst = Histogram::new(1, 100_000_000, 3).unwrap();
        dst.add_while_correcting_for_coordinated_omission(&src, 1_000);
        assert_eq!(10, dst.total_count());
    }
}
