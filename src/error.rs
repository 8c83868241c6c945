//! Error types for sumar operations.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sumar operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input columns have different lengths.
    #[error("Shape mismatch: counts has {counts_len} elements, durations has {durations_len} elements")]
    ShapeMismatch {
        /// Length of the play-count column.
        counts_len: usize,
        /// Length of the duration column.
        durations_len: usize,
    },

    /// Input length is not a multiple of the SIMD lane width.
    #[error("Input length {len} is not a multiple of the lane width {lane_width}")]
    NotLaneAligned {
        /// Length of the input columns.
        len: usize,
        /// Detected SIMD lane width.
        lane_width: usize,
    },

    /// A reduction strategy disagreed with the scalar baseline.
    ///
    /// The strategies are alternative schedules of the same integer
    /// reduction, so any disagreement is a hard failure.
    #[error("Strategy '{strategy}' returned {got}, scalar baseline returned {expected}")]
    StrategyMismatch {
        /// Name of the disagreeing strategy.
        strategy: &'static str,
        /// Value the strategy produced.
        got: i64,
        /// Value the scalar baseline produced.
        expected: i64,
    },

    /// No usable GPU adapter or device was found.
    #[error("GPU device unavailable: {0}")]
    DeviceUnavailable(String),

    /// GPU execution or readback failure.
    #[error("GPU execution error: {0}")]
    Gpu(String),

    /// The GPU kernel emulates 64-bit products from unsigned limbs and
    /// requires non-negative operands.
    #[error("GPU path requires non-negative inputs, found {value} at index {index}")]
    NegativeInput {
        /// Index of the offending element.
        index: usize,
        /// The negative value.
        value: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = Error::ShapeMismatch {
            counts_len: 8,
            durations_len: 12,
        };
        assert!(err.to_string().contains('8'));
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn test_not_lane_aligned_display() {
        let err = Error::NotLaneAligned {
            len: 7,
            lane_width: 4,
        };
        assert!(err.to_string().contains("not a multiple"));
    }

    #[test]
    fn test_strategy_mismatch_display() {
        let err = Error::StrategyMismatch {
            strategy: "lane-reduce",
            got: 19,
            expected: 20,
        };
        assert!(err.to_string().contains("lane-reduce"));
        assert!(err.to_string().contains("20"));
    }
}
