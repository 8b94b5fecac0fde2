// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Iteration strategies for walking a [`Histogram`]'s counts array.
//!
//! All five iterators here share the same output shape ([`IterationValue`]) so a downstream
//! consumer (a printer, a percentile-distribution plotter) can be written against whichever
//! variant its caller chooses without knowing which one it got. None of the iterators are
//! live against concurrent writers: each snapshots `total_count` at construction and walks a
//! relaxed read of the counts array from there.

use crate::Histogram;

/// A single reporting point emitted by one of the iterators in this module.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationValue {
    /// The highest value equivalent to the bucket this step reports on.
    pub value_iterated_to: i64,
    /// `value_iterated_to` of the previous step (or `0` for the first step).
    pub value_iterated_from: i64,
    /// The count folded into `cumulative_count` since the previous step. Zero when a single
    /// wide bucket satisfies more than one reporting level in a row.
    pub count_since_last_iteration: i64,
    /// The running total of counts folded in up to and including this step.
    pub cumulative_count: i64,
    /// `100 * cumulative_count / total_count` at the time this step was produced.
    pub percentile: f64,
}

impl Histogram {
    /// Iterates every counts-array index in order, including empty ones.
    pub fn iter_all(&self) -> AllValuesIter<'_> {
        AllValuesIter::new(self)
    }

    /// Iterates only the counts-array indices that recorded at least one sample.
    pub fn iter_recorded(&self) -> RecordedValuesIter<'_> {
        RecordedValuesIter::new(self)
    }

    /// Iterates in fixed-size linear steps of `value_units_per_bucket`. A counts-array bucket
    /// wider than the step is reported multiple times in a row, the first time carrying its
    /// accumulated count and the rest carrying zero.
    pub fn iter_linear(&self, value_units_per_bucket: i64) -> LinearValuesIter<'_> {
        LinearValuesIter::new(self, value_units_per_bucket)
    }

    /// Iterates in geometrically growing steps: the first step covers
    /// `value_units_first_bucket`, each subsequent step multiplies the reporting level by
    /// `log_base` (which must be greater than `1.0`).
    pub fn iter_log(&self, value_units_first_bucket: i64, log_base: f64) -> LogValuesIter<'_> {
        LogValuesIter::new(self, value_units_first_bucket, log_base)
    }

    /// Iterates percentile checkpoints, each step halving the remaining distance to 100% by
    /// `ticks_per_half_distance` increments. Guarantees a single, final step at exactly the
    /// 100th percentile.
    pub fn iter_percentiles(&self, ticks_per_half_distance: u32) -> PercentileValuesIter<'_> {
        PercentileValuesIter::new(self, ticks_per_half_distance)
    }
}

/// Iterates every counts-array index, in order, whether or not it recorded any samples.
pub struct AllValuesIter<'h> {
    histogram: &'h Histogram,
    index: usize,
    cumulative_count: i64,
    total_count: i64,
    prev_value_iterated_to: i64,
}

impl<'h> AllValuesIter<'h> {
    fn new(histogram: &'h Histogram) -> Self {
        AllValuesIter {
            histogram,
            index: 0,
            cumulative_count: 0,
            total_count: histogram.total_count(),
            prev_value_iterated_to: 0,
        }
    }
}

impl<'h> Iterator for AllValuesIter<'h> {
    type Item = IterationValue;

    fn next(&mut self) -> Option<IterationValue> {
        if self.index >= self.histogram.counts_len() {
            return None;
        }

        let count = self.histogram.count_at_index(self.index);
        self.cumulative_count += count;
        let value = self.histogram.value_at_index(self.index);
        let value_iterated_to = self.histogram.highest_equivalent(value);

        let result = IterationValue {
            value_iterated_to,
            value_iterated_from: self.prev_value_iterated_to,
            count_since_last_iteration: count,
            cumulative_count: self.cumulative_count,
            percentile: percentile_of(self.cumulative_count, self.total_count),
        };

        self.prev_value_iterated_to = value_iterated_to;
        self.index += 1;
        Some(result)
    }
}

/// Iterates only the counts-array indices that recorded at least one sample.
pub struct RecordedValuesIter<'h> {
    histogram: &'h Histogram,
    index: usize,
    cumulative_count: i64,
    total_count: i64,
    prev_value_iterated_to: i64,
}

impl<'h> RecordedValuesIter<'h> {
    fn new(histogram: &'h Histogram) -> Self {
        RecordedValuesIter {
            histogram,
            index: 0,
            cumulative_count: 0,
            total_count: histogram.total_count(),
            prev_value_iterated_to: 0,
        }
    }
}

impl<'h> Iterator for RecordedValuesIter<'h> {
    type Item = IterationValue;

    fn next(&mut self) -> Option<IterationValue> {
        let counts_len = self.histogram.counts_len();
        while self.index < counts_len {
            let count = self.histogram.count_at_index(self.index);
            let index = self.index;
            self.index += 1;

            if count == 0 {
                continue;
            }

            self.cumulative_count += count;
            let value = self.histogram.value_at_index(index);
            let value_iterated_to = self.histogram.highest_equivalent(value);

            let result = IterationValue {
                value_iterated_to,
                value_iterated_from: self.prev_value_iterated_to,
                count_since_last_iteration: count,
                cumulative_count: self.cumulative_count,
                percentile: percentile_of(self.cumulative_count, self.total_count),
            };

            self.prev_value_iterated_to = value_iterated_to;
            return Some(result);
        }
        None
    }
}

/// Iterates in fixed-size linear steps. See [`Histogram::iter_linear`].
pub struct LinearValuesIter<'h> {
    histogram: &'h Histogram,
    step: i64,
    level: i64,
    index: usize,
    cumulative_count: i64,
    previous_cumulative_count: i64,
    prev_value_iterated_to: i64,
    total_count: i64,
    done: bool,
}

impl<'h> LinearValuesIter<'h> {
    fn new(histogram: &'h Histogram, value_units_per_bucket: i64) -> Self {
        debug_assert!(value_units_per_bucket >= 1, "value_units_per_bucket must be >= 1");
        LinearValuesIter {
            histogram,
            step: value_units_per_bucket,
            level: value_units_per_bucket,
            index: 0,
            cumulative_count: 0,
            previous_cumulative_count: 0,
            prev_value_iterated_to: 0,
            total_count: histogram.total_count(),
            done: false,
        }
    }
}

impl<'h> Iterator for LinearValuesIter<'h> {
    type Item = IterationValue;

    fn next(&mut self) -> Option<IterationValue> {
        if self.done {
            return None;
        }

        if self.cumulative_count >= self.total_count && self.level > self.histogram.max() {
            self.done = true;
            return None;
        }

        let counts_len = self.histogram.counts_len();
        while self.index < counts_len {
            let value = self.histogram.value_at_index(self.index);
            if self.histogram.lowest_equivalent(value) > self.level {
                break;
            }
            self.cumulative_count += self.histogram.count_at_index(self.index);
            self.index += 1;
        }

        let value_iterated_to = self.histogram.highest_equivalent(self.level);
        let count_since_last = self.cumulative_count - self.previous_cumulative_count;

        let result = IterationValue {
            value_iterated_to,
            value_iterated_from: self.prev_value_iterated_to,
            count_since_last_iteration: count_since_last,
            cumulative_count: self.cumulative_count,
            percentile: percentile_of(self.cumulative_count, self.total_count),
        };

        self.prev_value_iterated_to = value_iterated_to;
        self.previous_cumulative_count = self.cumulative_count;
        self.level += self.step;
        Some(result)
    }
}

/// Iterates in geometrically growing steps. See [`Histogram::iter_log`].
pub struct LogValuesIter<'h> {
    histogram: &'h Histogram,
    log_base: f64,
    level_f64: f64,
    index: usize,
    cumulative_count: i64,
    previous_cumulative_count: i64,
    prev_value_iterated_to: i64,
    total_count: i64,
    done: bool,
}

impl<'h> LogValuesIter<'h> {
    fn new(histogram: &'h Histogram, value_units_first_bucket: i64, log_base: f64) -> Self {
        debug_assert!(value_units_first_bucket >= 1, "value_units_first_bucket must be >= 1");
        debug_assert!(log_base > 1.0, "log_base must be greater than 1.0");
        LogValuesIter {
            histogram,
            log_base,
            level_f64: value_units_first_bucket as f64,
            index: 0,
            cumulative_count: 0,
            previous_cumulative_count: 0,
            prev_value_iterated_to: 0,
            total_count: histogram.total_count(),
            done: false,
        }
    }
}

impl<'h> Iterator for LogValuesIter<'h> {
    type Item = IterationValue;

    fn next(&mut self) -> Option<IterationValue> {
        if self.done {
            return None;
        }

        let level = self.level_f64.round() as i64;
        if self.cumulative_count >= self.total_count && level > self.histogram.max() {
            self.done = true;
            return None;
        }

        let counts_len = self.histogram.counts_len();
        while self.index < counts_len {
            let value = self.histogram.value_at_index(self.index);
            if self.histogram.lowest_equivalent(value) > level {
                break;
            }
            self.cumulative_count += self.histogram.count_at_index(self.index);
            self.index += 1;
        }

        let value_iterated_to = self.histogram.highest_equivalent(level);
        let count_since_last = self.cumulative_count - self.previous_cumulative_count;

        let result = IterationValue {
            value_iterated_to,
            value_iterated_from: self.prev_value_iterated_to,
            count_since_last_iteration: count_since_last,
            cumulative_count: self.cumulative_count,
            percentile: percentile_of(self.cumulative_count, self.total_count),
        };

        self.prev_value_iterated_to = value_iterated_to;
        self.previous_cumulative_count = self.cumulative_count;
        self.level_f64 *= self.log_base;
        Some(result)
    }
}

/// Iterates percentile checkpoints. See [`Histogram::iter_percentiles`].
pub struct PercentileValuesIter<'h> {
    histogram: &'h Histogram,
    ticks_per_half_distance: u32,
    percentile: f64,
    index: usize,
    last_value_index: usize,
    cumulative_count: i64,
    previous_cumulative_count: i64,
    prev_value_iterated_to: i64,
    total_count: i64,
    seen_last_value: bool,
    done: bool,
}

impl<'h> PercentileValuesIter<'h> {
    fn new(histogram: &'h Histogram, ticks_per_half_distance: u32) -> Self {
        debug_assert!(ticks_per_half_distance >= 1, "ticks_per_half_distance must be >= 1");
        PercentileValuesIter {
            histogram,
            ticks_per_half_distance,
            percentile: next_percentile_checkpoint(0.0, ticks_per_half_distance),
            index: 0,
            last_value_index: 0,
            cumulative_count: 0,
            previous_cumulative_count: 0,
            prev_value_iterated_to: 0,
            total_count: histogram.total_count(),
            seen_last_value: false,
            done: false,
        }
    }
}

impl<'h> Iterator for PercentileValuesIter<'h> {
    type Item = IterationValue;

    fn next(&mut self) -> Option<IterationValue> {
        if self.done || self.seen_last_value || self.total_count == 0 {
            self.done = true;
            return None;
        }

        let target = Histogram::target_count_for_percentile(self.percentile, self.total_count);
        let counts_len = self.histogram.counts_len();

        while self.cumulative_count < target && self.index < counts_len {
            self.cumulative_count += self.histogram.count_at_index(self.index);
            self.last_value_index = self.index;
            self.index += 1;
        }

        if self.cumulative_count >= self.total_count {
            self.percentile = 100.0;
        }

        let value = self.histogram.value_at_index(self.last_value_index);
        let value_iterated_to = self.histogram.highest_equivalent(value);
        let count_since_last = self.cumulative_count - self.previous_cumulative_count;

        let result = IterationValue {
            value_iterated_to,
            value_iterated_from: self.prev_value_iterated_to,
            count_since_last_iteration: count_since_last,
            cumulative_count: self.cumulative_count,
            percentile: self.percentile,
        };

        self.prev_value_iterated_to = value_iterated_to;
        self.previous_cumulative_count = self.cumulative_count;

        if self.percentile >= 100.0 {
            self.seen_last_value = true;
        } else {
            self.percentile = next_percentile_checkpoint(self.percentile, self.ticks_per_half_distance);
        }

        Some(result)
    }
}

fn next_percentile_checkpoint(current: f64, ticks_per_half_distance: u32) -> f64 {
    if current >= 100.0 {
        return 100.0;
    }
    let halving_exponent = (100.0 / (100.0 - current)).log2().floor();
    let percentile_reporting_ticks = ticks_per_half_distance as f64 * 2f64.powi(halving_exponent as i32 + 1);
    let next = current + 100.0 / percentile_reporting_ticks;
    if next > 100.0 {
        100.0
    } else {
        next
    }
}

fn percentile_of(cumulative_count: i64, total_count: i64) -> f64 {
    if total_count == 0 {
        0.0
    } else {
        100.0 * cumulative_count as f64 / total_count as f64
    }
}
