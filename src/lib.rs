// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A high dynamic range (HDR) histogram: a fixed-memory data structure that records 64-bit
//! integer samples across a wide value range while bounding the relative error at any
//! magnitude to `10^-significant_figures`.
//!
//! Recording is lock-free and safe to call concurrently from multiple threads against a
//! shared `&Histogram`. Reads (queries, iteration, merge) observe a relaxed snapshot and are
//! not guaranteed to be consistent with writers still in flight.
//!
//! ```
//! use hdrhistogram_core::Histogram;
//!
//! let histogram = Histogram::new(1, 3_600_000_000, 3).unwrap();
//! histogram.record_value(1_234);
//! histogram.record_value(5_678);
//! assert_eq!(2, histogram.total_count());
//! assert!(histogram.value_at_percentile(50.0) >= 1_234);
//! ```

mod config;
mod error;
mod histogram;
mod iterator;
mod merge;

pub use error::CreationError;
pub use histogram::Histogram;
pub use iterator::{
    AllValuesIter, IterationValue, LinearValuesIter, LogValuesIter, PercentileValuesIter,
    RecordedValuesIter,
};
