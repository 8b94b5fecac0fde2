// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use hdrhistogram_core::Histogram;

#[test]
fn basic_precision() {
    let histogram = Histogram::new(1, 3_600_000_000, 3).unwrap();
    for _ in 0..1_000_000 {
        histogram.record_value(1_000_000);
    }

    let v = histogram.value_at_percentile(50.0);
    assert!(v >= histogram.lowest_equivalent(1_000_000));
    assert!(v <= histogram.highest_equivalent(1_000_000));

    let relative_error = (v - 1_000_000).unsigned_abs() as f64 / 1_000_000.0;
    assert!(relative_error <= 0.001);
}

#[test]
fn percentile_distribution() {
    let histogram = Histogram::new(1, 3_600_000_000, 3).unwrap();
    for v in 1..10_000 {
        histogram.record_value(v);
    }

    let p50 = histogram.value_at_percentile(50.0);
    assert!((p50 - 5_000).abs() <= histogram.size_of_equivalent_range(5_000));

    let p99 = histogram.value_at_percentile(99.0);
    assert!((p99 - 9_900).abs() <= histogram.size_of_equivalent_range(9_900) * 2);

    assert_eq!(histogram.highest_equivalent(9_999), histogram.value_at_percentile(100.0));
}

#[test]
fn out_of_range_is_rejected_without_side_effects() {
    let histogram = Histogram::new(1, 100, 3).unwrap();
    assert!(!histogram.record_value(101));
    assert_eq!(0, histogram.total_count());
}

#[test]
fn coordinated_omission_backfills_missed_samples() {
    let histogram = Histogram::new(1, 100_000_000, 3).unwrap();
    histogram.record_corrected_value(10_000, 1_000);

    assert_eq!(10, histogram.total_count());
    for multiple in 1..=10 {
        let value = multiple * 1_000;
        assert_eq!(1, histogram.count_at_value(value));
    }
}

#[test]
fn merge_truncates_out_of_range_source_values() {
    let src = Histogram::new(1, 10_000, 3).unwrap();
    src.record_value(5_000);

    let dst = Histogram::new(1, 1_000, 3).unwrap();
    let dropped = dst.add(&src);

    assert_eq!(1, dropped);
    assert_eq!(0, dst.total_count());
}

#[test]
fn linear_iterator_reports_fixed_width_steps() {
    let histogram = Histogram::new(1, 1000, 3).unwrap();
    for v in 1..=1000 {
        histogram.record_value(v);
    }

    let steps: Vec<_> = histogram.iter_linear(100).collect();
    assert_eq!(10, steps.len());
    for step in steps {
        assert_eq!(100, step.count_since_last_iteration);
    }
}
