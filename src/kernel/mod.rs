//! The reduction kernel: `Σ counts[i] * durations[i]` as a 64-bit sum.
//!
//! Four interchangeable strategies compute the same commutative, associative
//! integer reduction under different accumulation schedules. They must agree
//! bit-for-bit; the harness treats any disagreement as a hard failure.
//!
//! Inputs are validated up front: unequal lengths or a length that is not a
//! multiple of the detected lane width return an explicit error instead of
//! silently degrading. Pad with [`crate::library::PlaybackColumns`] first.

mod portable;
mod scalar;
#[cfg(target_arch = "x86_64")]
mod x86;

use crate::error::{Error, Result};
use crate::simd::detect_simd_level;
#[cfg(target_arch = "x86_64")]
use crate::simd::SimdLevel;

/// Accumulation schedule for the product-sum reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Sequential 64-bit accumulation, no explicit SIMD.
    Scalar,
    /// Horizontal reduction per block, added to the accumulator immediately.
    LaneReduce,
    /// Persistent lane accumulator vector, one horizontal reduction at the end.
    DeferredAcc,
    /// Per-block product vectors stored in an `n / L` array, reduced afterwards.
    DeferredArray,
}

impl Strategy {
    /// Every strategy, scalar baseline first.
    pub const ALL: [Strategy; 4] = [
        Strategy::Scalar,
        Strategy::LaneReduce,
        Strategy::DeferredAcc,
        Strategy::DeferredArray,
    ];

    /// Short name used in reports and error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Scalar => "scalar",
            Strategy::LaneReduce => "lane-reduce",
            Strategy::DeferredAcc => "deferred-acc",
            Strategy::DeferredArray => "deferred-array",
        }
    }
}

/// Compute `Σ counts[i] * durations[i]` with the given strategy.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] when the columns differ in length.
/// - [`Error::NotLaneAligned`] when the length is not a multiple of the
///   detected lane width (`n == 0` is valid and returns `0`).
pub fn reduce(strategy: Strategy, counts: &[i32], durations: &[i32]) -> Result<i64> {
    validate(counts, durations)?;
    if counts.is_empty() {
        return Ok(0);
    }
    Ok(match strategy {
        Strategy::Scalar => scalar::reduce(counts, durations),
        _ => reduce_simd(strategy, counts, durations),
    })
}

fn validate(counts: &[i32], durations: &[i32]) -> Result<()> {
    if counts.len() != durations.len() {
        return Err(Error::ShapeMismatch {
            counts_len: counts.len(),
            durations_len: durations.len(),
        });
    }
    let lane_width = detect_simd_level().lanes();
    if counts.len() % lane_width != 0 {
        return Err(Error::NotLaneAligned {
            len: counts.len(),
            lane_width,
        });
    }
    Ok(())
}

#[cfg(target_arch = "x86_64")]
fn reduce_simd(strategy: Strategy, counts: &[i32], durations: &[i32]) -> i64 {
    match detect_simd_level() {
        // SAFETY: feature availability was just checked; lengths are
        // validated lane-aligned by the caller.
        SimdLevel::Avx2 => unsafe {
            match strategy {
                Strategy::LaneReduce => x86::lane_reduce_avx2(counts, durations),
                Strategy::DeferredAcc => x86::deferred_acc_avx2(counts, durations),
                Strategy::DeferredArray => x86::deferred_array_avx2(counts, durations),
                Strategy::Scalar => scalar::reduce(counts, durations),
            }
        },
        SimdLevel::Sse41 => unsafe {
            match strategy {
                Strategy::LaneReduce => x86::lane_reduce_sse41(counts, durations),
                Strategy::DeferredAcc => x86::deferred_acc_sse41(counts, durations),
                Strategy::DeferredArray => x86::deferred_array_sse41(counts, durations),
                Strategy::Scalar => scalar::reduce(counts, durations),
            }
        },
        SimdLevel::Scalar => reduce_portable(strategy, counts, durations),
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn reduce_simd(strategy: Strategy, counts: &[i32], durations: &[i32]) -> i64 {
    reduce_portable(strategy, counts, durations)
}

fn reduce_portable(strategy: Strategy, counts: &[i32], durations: &[i32]) -> i64 {
    match strategy {
        Strategy::LaneReduce => portable::lane_reduce(counts, durations),
        Strategy::DeferredAcc => portable::deferred_acc(counts, durations),
        Strategy::DeferredArray => portable::deferred_array(counts, durations),
        Strategy::Scalar => scalar::reduce(counts, durations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::lane_width;

    fn padded(mut counts: Vec<i32>, mut durations: Vec<i32>) -> (Vec<i32>, Vec<i32>) {
        let lanes = lane_width();
        let target = counts.len().div_ceil(lanes) * lanes;
        counts.resize(target, 0);
        durations.resize(target, 0);
        (counts, durations)
    }

    #[test]
    fn test_all_strategies_agree_on_known_input() {
        let (counts, durations) = padded(vec![1, 2, 3, 4], vec![4, 3, 2, 1]);
        for strategy in Strategy::ALL {
            assert_eq!(reduce(strategy, &counts, &durations).unwrap(), 20);
        }
    }

    #[test]
    fn test_empty_input_is_zero() {
        for strategy in Strategy::ALL {
            assert_eq!(reduce(strategy, &[], &[]).unwrap(), 0);
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let err = reduce(Strategy::Scalar, &[1, 2, 3, 4], &[1, 2]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_unaligned_length_is_rejected() {
        let lanes = lane_width();
        let counts = vec![1; lanes + 1];
        let durations = vec![1; lanes + 1];
        let err = reduce(Strategy::LaneReduce, &counts, &durations).unwrap_err();
        assert!(matches!(err, Error::NotLaneAligned { .. }));
    }

    #[test]
    fn test_reduction_is_idempotent() {
        let (counts, durations) = padded((1..=100).collect(), (1..=100).rev().collect());
        for strategy in Strategy::ALL {
            let first = reduce(strategy, &counts, &durations).unwrap();
            let second = reduce(strategy, &counts, &durations).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_strategy_names_are_unique() {
        let names: Vec<_> = Strategy::ALL.iter().map(Strategy::name).collect();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
    }
}
