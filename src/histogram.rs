// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::sync::atomic::{AtomicI64, Ordering};

use crate::config::BucketConfig;
use crate::CreationError;

/// A lock-free, fixed-memory histogram that records 64-bit integer samples across a wide
/// dynamic range while bounding the relative error at every magnitude to `10^-significant_figures`.
///
/// The geometry (the fields derived from `lowest_trackable_value`, `highest_trackable_value`
/// and `significant_figures`) is fixed for the lifetime of the histogram. The counters are
/// mutable and may be updated concurrently from multiple producer threads via shared references;
/// see the module documentation for the memory-ordering guarantees this relies on.
///
/// Laid out across three cache-line-sized groups — write-once geometry, the running total, and
/// the min/max extrema — with explicit padding between them so that a recorder hammering the
/// counts array doesn't also invalidate a reader's cached copy of `min_value`/`max_value`.
#[derive(Debug)]
#[repr(C)]
pub struct Histogram {
    lowest_trackable_value: i64,
    highest_trackable_value: i64,
    unit_magnitude: u32,
    significant_figures: u8,
    sub_bucket_half_count_magnitude: u32,
    sub_bucket_half_count: i64,
    sub_bucket_mask: i64,
    sub_bucket_count: i64,
    bucket_count: u32,
    normalizing_index_offset: i64,
    counts_len: usize,
    counts: Box<[AtomicI64]>,

    _cache_line_padding_0: [u8; 48],

    conversion_ratio: f64,
    total_count: AtomicI64,

    _cache_line_padding_1: [u8; 48],

    min_value: AtomicI64,
    max_value: AtomicI64,
}

impl Histogram {
    /// Constructs a new histogram able to record values in `lowest_trackable_value
    /// ..= highest_trackable_value` while preserving `significant_figures` decimal digits of
    /// resolution (1 through 5 inclusive).
    pub fn new(
        lowest_trackable_value: i64,
        highest_trackable_value: i64,
        significant_figures: u8,
    ) -> Result<Self, CreationError> {
        let cfg =
            BucketConfig::new(lowest_trackable_value, highest_trackable_value, significant_figures)?;

        let mut counts = Vec::with_capacity(cfg.counts_len);
        counts.resize_with(cfg.counts_len, || AtomicI64::new(0));

        log::debug!(
            "new histogram: range=[{}, {}] sig_figs={} counts_len={}",
            cfg.lowest_trackable_value,
            cfg.highest_trackable_value,
            cfg.significant_figures,
            cfg.counts_len
        );

        Ok(Histogram {
            lowest_trackable_value: cfg.lowest_trackable_value,
            highest_trackable_value: cfg.highest_trackable_value,
            unit_magnitude: cfg.unit_magnitude,
            significant_figures: cfg.significant_figures,
            sub_bucket_half_count_magnitude: cfg.sub_bucket_half_count_magnitude,
            sub_bucket_half_count: cfg.sub_bucket_half_count,
            sub_bucket_mask: cfg.sub_bucket_mask,
            sub_bucket_count: cfg.sub_bucket_count,
            bucket_count: cfg.bucket_count,
            normalizing_index_offset: 0,
            counts_len: cfg.counts_len,
            counts: counts.into_boxed_slice(),
            _cache_line_padding_0: [0; 48],
            conversion_ratio: 1.0,
            total_count: AtomicI64::new(0),
            _cache_line_padding_1: [0; 48],
            min_value: AtomicI64::new(i64::MAX),
            max_value: AtomicI64::new(0),
        })
    }

    // ---- geometry accessors ----

    /// The smallest value this histogram is configured to track precisely.
    pub fn lowest_trackable_value(&self) -> i64 {
        self.lowest_trackable_value
    }

    /// The largest value this histogram is configured to track.
    pub fn highest_trackable_value(&self) -> i64 {
        self.highest_trackable_value
    }

    /// The number of significant decimal digits preserved by this histogram.
    pub fn significant_figures(&self) -> u8 {
        self.significant_figures
    }

    /// The number of counters backing this histogram.
    pub fn counts_len(&self) -> usize {
        self.counts_len
    }

    /// The number of buckets (each covering a doubling of the resolvable range) this
    /// histogram's geometry was built with.
    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    /// The scalar applied to recorded values at print time. Defaults to `1.0`; the core itself
    /// never applies this multiplier, it is read by an external formatter.
    pub fn conversion_ratio(&self) -> f64 {
        self.conversion_ratio
    }

    /// Sets the scalar returned by [`Histogram::conversion_ratio`].
    pub fn set_conversion_ratio(&mut self, ratio: f64) {
        self.conversion_ratio = ratio;
    }

    /// An estimate of the number of bytes occupied by this histogram, including its counts
    /// array.
    pub fn memory_size(&self) -> usize {
        core::mem::size_of::<Self>() + self.counts_len * core::mem::size_of::<AtomicI64>()
    }

    // ---- codec: component B ----

    fn bucket_index_of(&self, value: i64) -> i64 {
        let pow2_ceiling = 64 - (value | self.sub_bucket_mask).leading_zeros() as i64;
        (pow2_ceiling - self.unit_magnitude as i64 - (self.sub_bucket_half_count_magnitude as i64 + 1))
            .max(0)
    }

    fn sub_bucket_index_of(&self, value: i64, bucket_index: i64) -> i64 {
        value >> (bucket_index as u32 + self.unit_magnitude)
    }

    fn counts_index_for(&self, bucket_index: i64, sub_bucket_index: i64) -> i64 {
        let bucket_base_index = (bucket_index + 1) << self.sub_bucket_half_count_magnitude;
        let offset_in_bucket = sub_bucket_index - self.sub_bucket_half_count;
        bucket_base_index + offset_in_bucket
    }

    fn value_from_index(&self, bucket_index: i64, sub_bucket_index: i64) -> i64 {
        sub_bucket_index << (bucket_index as u32 + self.unit_magnitude)
    }

    fn normalize_index(&self, raw_index: i64) -> usize {
        if self.normalizing_index_offset == 0 {
            return raw_index as usize;
        }
        let len = self.counts_len as i64;
        (((raw_index + self.normalizing_index_offset) % len + len) % len) as usize
    }

    fn denormalize_index(&self, index: usize) -> i64 {
        if self.normalizing_index_offset == 0 {
            return index as i64;
        }
        let len = self.counts_len as i64;
        (((index as i64 - self.normalizing_index_offset) % len) + len) % len
    }

    /// The counts-array index that `value` maps into, assuming `value` is within the
    /// histogram's trackable range. Callers on the recording path must bounds-check against
    /// `highest_trackable_value` themselves; this function does not.
    pub(crate) fn index_for_value(&self, value: i64) -> usize {
        let bucket_index = self.bucket_index_of(value);
        let sub_bucket_index = self.sub_bucket_index_of(value, bucket_index);
        let raw = self.counts_index_for(bucket_index, sub_bucket_index);
        self.normalize_index(raw)
    }

    /// The representative value stored at a given counts-array index.
    pub fn value_at_index(&self, index: usize) -> i64 {
        let idx = self.denormalize_index(index);
        let mut bucket_index = (idx >> self.sub_bucket_half_count_magnitude) - 1;
        let mut sub_bucket_index =
            (idx & (self.sub_bucket_half_count - 1)) + self.sub_bucket_half_count;

        if bucket_index < 0 {
            sub_bucket_index -= self.sub_bucket_half_count;
            bucket_index = 0;
        }

        self.value_from_index(bucket_index, sub_bucket_index)
    }

    /// The width of the equivalence range containing `value`: the set of values that map to
    /// the same counts-array index as `value` does.
    pub fn size_of_equivalent_range(&self, value: i64) -> i64 {
        let bucket_index = self.bucket_index_of(value);
        let sub_bucket_index = self.sub_bucket_index_of(value, bucket_index);
        let adjusted_bucket_index = if sub_bucket_index >= self.sub_bucket_count {
            bucket_index + 1
        } else {
            bucket_index
        };
        1_i64 << (self.unit_magnitude as i64 + adjusted_bucket_index)
    }

    /// The lowest value equivalent to `value` — the smallest value that maps to the same
    /// counts-array index.
    pub fn lowest_equivalent(&self, value: i64) -> i64 {
        let bucket_index = self.bucket_index_of(value);
        let sub_bucket_index = self.sub_bucket_index_of(value, bucket_index);
        self.value_from_index(bucket_index, sub_bucket_index)
    }

    /// The smallest value that is *not* equivalent to `value` (i.e. one past the end of
    /// `value`'s equivalence range).
    pub fn next_non_equivalent(&self, value: i64) -> i64 {
        self.lowest_equivalent(value) + self.size_of_equivalent_range(value)
    }

    /// The highest value equivalent to `value`.
    pub fn highest_equivalent(&self, value: i64) -> i64 {
        self.next_non_equivalent(value) - 1
    }

    /// The midpoint of `value`'s equivalence range, used for mean/stddev weighting.
    pub fn median_equivalent(&self, value: i64) -> i64 {
        self.lowest_equivalent(value) + (self.size_of_equivalent_range(value) >> 1)
    }

    /// Whether `a` and `b` fall into the same equivalence range (and therefore the same
    /// counts-array index).
    pub fn values_are_equivalent(&self, a: i64, b: i64) -> bool {
        self.lowest_equivalent(a) == self.lowest_equivalent(b)
    }

    // ---- recorder: component C ----

    /// Records a single occurrence of `value`. Returns `false` without modifying the histogram
    /// if `value` is negative or exceeds `highest_trackable_value`.
    pub fn record_value(&self, value: i64) -> bool {
        self.record_values(value, 1)
    }

    /// Records `count` occurrences of `value`. Returns `false` without modifying the histogram
    /// if `value` or `count` is negative, or if `value` exceeds `highest_trackable_value`.
    pub fn record_values(&self, value: i64, count: i64) -> bool {
        if value < 0 || count < 0 || value > self.highest_trackable_value {
            return false;
        }

        let index = self.index_for_value(value);
        self.counts[index].fetch_add(count, Ordering::Relaxed);
        self.total_count.fetch_add(count, Ordering::Relaxed);
        self.update_min(value);
        self.update_max(value);
        true
    }

    /// Records `value`, then backfills the samples that would have been recorded had the
    /// producer not stalled: if `value` exceeds `expected_interval`, synthesises additional
    /// samples at `value - expected_interval`, `value - 2*expected_interval`, ... down to the
    /// last multiple still `>= expected_interval`. Corrects for coordinated omission in latency
    /// measurements taken by a blocking client.
    pub fn record_corrected_value(&self, value: i64, expected_interval: i64) -> bool {
        self.record_corrected_values(value, 1, expected_interval)
    }

    /// As [`Histogram::record_corrected_value`], but records `count` copies of `value` (and
    /// backfills `count` copies of each synthesised sample).
    pub fn record_corrected_values(
        &self,
        value: i64,
        count: i64,
        expected_interval: i64,
    ) -> bool {
        if !self.record_values(value, count) {
            return false;
        }

        if expected_interval <= 0 || value <= expected_interval {
            return true;
        }

        let mut missing_value = value - expected_interval;
        while missing_value >= expected_interval {
            self.record_values(missing_value, count);
            missing_value -= expected_interval;
        }
        true
    }

    fn update_min(&self, value: i64) {
        if value == 0 {
            return;
        }
        let mut observed = self.min_value.load(Ordering::Relaxed);
        while value < observed {
            match self.min_value.compare_exchange_weak(
                observed,
                value,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => observed = current,
            }
        }
    }

    fn update_max(&self, value: i64) {
        let mut observed = self.max_value.load(Ordering::Relaxed);
        while value > observed {
            match self.max_value.compare_exchange_weak(
                observed,
                value,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => observed = current,
            }
        }
    }

    /// Zeroes every counter, the running total, and the min/max extrema. Not safe to call
    /// concurrently with `record_*` on another thread.
    pub fn reset(&self) {
        for counter in self.counts.iter() {
            counter.store(0, Ordering::Relaxed);
        }
        self.total_count.store(0, Ordering::Relaxed);
        self.min_value.store(i64::MAX, Ordering::Relaxed);
        self.max_value.store(0, Ordering::Relaxed);
    }

    /// Recomputes `total_count`, `min`, and `max` by walking the counts array. Intended for use
    /// after counts have been populated by means other than `record_*` (bulk import, manual
    /// deserialisation) and so takes `&mut self` to make that single-owner expectation explicit.
    pub fn reset_internal_counters(&mut self) {
        let mut total = 0i64;
        let mut min = i64::MAX;
        let mut max = 0i64;

        for index in 0..self.counts_len {
            let count = self.counts[index].load(Ordering::Relaxed);
            if count == 0 {
                continue;
            }
            total += count;
            let value = self.value_at_index(index);
            if value != 0 && value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }

        self.total_count.store(total, Ordering::Relaxed);
        self.min_value.store(min, Ordering::Relaxed);
        self.max_value.store(max, Ordering::Relaxed);
    }

    // ---- queries: component D ----

    /// The smallest non-zero recorded value, or `i64::MAX` if nothing has been recorded.
    pub fn min(&self) -> i64 {
        self.min_value.load(Ordering::Relaxed)
    }

    /// The largest recorded value, or `0` if nothing has been recorded.
    pub fn max(&self) -> i64 {
        self.max_value.load(Ordering::Relaxed)
    }

    /// The total number of samples recorded (a relaxed snapshot under concurrent recording).
    pub fn total_count(&self) -> i64 {
        self.total_count.load(Ordering::Relaxed)
    }

    /// The raw count stored at a counts-array index, or `0` if the index is out of bounds.
    pub fn count_at_index(&self, index: usize) -> i64 {
        self.counts
            .get(index)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// The count of samples recorded within `value`'s equivalence range, or `0` if `value` is
    /// out of the trackable range.
    pub fn count_at_value(&self, value: i64) -> i64 {
        if value < 0 || value > self.highest_trackable_value {
            return 0;
        }
        self.count_at_index(self.index_for_value(value))
    }

    /// The value at or below which `percentile` percent of recorded samples fall, clamped to
    /// `[0, 100]`. Returns `0` if the histogram is empty.
    pub fn value_at_percentile(&self, percentile: f64) -> i64 {
        let percentile = percentile.clamp(0.0, 100.0);
        let total = self.total_count();
        if total == 0 {
            return 0;
        }

        let target = Self::target_count_for_percentile(percentile, total);
        let mut cumulative = 0i64;

        for index in 0..self.counts_len {
            cumulative += self.count_at_index(index);
            if cumulative >= target {
                let value = self.value_at_index(index);
                return if percentile > 0.0 {
                    self.highest_equivalent(value)
                } else {
                    self.lowest_equivalent(value)
                };
            }
        }

        self.highest_equivalent(self.max())
    }

    pub(crate) fn target_count_for_percentile(percentile: f64, total: i64) -> i64 {
        let raw = (percentile / 100.0) * total as f64 + 0.5;
        (raw.floor() as i64).max(1)
    }

    /// The arithmetic mean of all recorded samples, weighted by each bucket's median
    /// equivalent value. Returns `0.0` if the histogram is empty.
    pub fn mean(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }

        let mut sum = 0.0_f64;
        for index in 0..self.counts_len {
            let count = self.count_at_index(index);
            if count == 0 {
                continue;
            }
            let value = self.value_at_index(index);
            sum += count as f64 * self.median_equivalent(value) as f64;
        }
        sum / total as f64
    }

    /// The population standard deviation of recorded samples, weighted by each bucket's median
    /// equivalent value. Returns `0.0` if the histogram is empty.
    pub fn stddev(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }

        let mean = self.mean();
        let mut geometric_sum = 0.0_f64;
        for index in 0..self.counts_len {
            let count = self.count_at_index(index);
            if count == 0 {
                continue;
            }
            let value = self.value_at_index(index);
            let deviation = self.median_equivalent(value) as f64 - mean;
            geometric_sum += count as f64 * deviation * deviation;
        }
        (geometric_sum / total as f64).sqrt()
    }
}

impl Clone for Histogram {
    fn clone(&self) -> Self {
        let counts: Vec<AtomicI64> = self
            .counts
            .iter()
            .map(|c| AtomicI64::new(c.load(Ordering::Relaxed)))
            .collect();

        Histogram {
            lowest_trackable_value: self.lowest_trackable_value,
            highest_trackable_value: self.highest_trackable_value,
            unit_magnitude: self.unit_magnitude,
            significant_figures: self.significant_figures,
            sub_bucket_half_count_magnitude: self.sub_bucket_half_count_magnitude,
            sub_bucket_half_count: self.sub_bucket_half_count,
            sub_bucket_mask: self.sub_bucket_mask,
            sub_bucket_count: self.sub_bucket_count,
            bucket_count: self.bucket_count,
            normalizing_index_offset: self.normalizing_index_offset,
            counts_len: self.counts_len,
            counts: counts.into_boxed_slice(),
            _cache_line_padding_0: [0; 48],
            conversion_ratio: self.conversion_ratio,
            total_count: AtomicI64::new(self.total_count.load(Ordering::Relaxed)),
            _cache_line_padding_1: [0; 48],
            min_value: AtomicI64::new(self.min_value.load(Ordering::Relaxed)),
            max_value: AtomicI64::new(self.max_value.load(Ordering::Relaxed)),
        }
    }
}
