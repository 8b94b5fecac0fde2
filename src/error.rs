// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use thiserror::Error;

/// Possible errors returned when constructing a [`crate::Histogram`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationError {
    #[error("lowest trackable value must be at least 1")]
    /// `lowest_trackable_value` was less than 1.
    LowIsZero,
    #[error("highest trackable value must be at least 2x the lowest trackable value")]
    /// `highest_trackable_value` was less than twice `lowest_trackable_value`.
    HighLessThanTwiceLow,
    #[error("significant figures must be between 1 and 5 inclusive")]
    /// `significant_figures` was outside of `1..=5`.
    SigFigsOutOfRange,
    #[error("lowest trackable value and significant figures combination cannot be represented")]
    /// The combination of `lowest_trackable_value` and `significant_figures` would require a
    /// sub-bucket mask wider than a 64-bit index can represent.
    CannotRepresentSigFigBeyondLow,
}
