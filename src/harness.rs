//! Timing harness for the reduction strategies.
//!
//! Runs every strategy over the same columns, records elapsed wall time,
//! and verifies that all totals agree with the scalar baseline. The
//! strategies are mathematically equivalent schedules, so disagreement is
//! a hard error, not a warning. The harness performs no I/O; rendering
//! lives in [`crate::report`].

use std::hint::black_box;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::kernel::{self, Strategy};
use crate::library::PlaybackColumns;

/// One timed strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Strategy name (see [`Strategy::name`]).
    pub strategy: &'static str,
    /// Wall time of one timed invocation.
    pub elapsed: Duration,
    /// The 64-bit reduction result.
    pub total: i64,
}

/// Time every CPU strategy over the columns and check agreement.
///
/// Each strategy gets one untimed warmup invocation before the timed one.
///
/// # Errors
///
/// Propagates kernel validation errors, and returns
/// [`Error::StrategyMismatch`] if any strategy disagrees with the scalar
/// baseline.
pub fn run_all(columns: &PlaybackColumns) -> Result<Vec<Measurement>> {
    let counts = columns.counts();
    let durations = columns.durations();

    let mut measurements = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        black_box(kernel::reduce(strategy, counts, durations)?);

        let start = Instant::now();
        let total = black_box(kernel::reduce(strategy, counts, durations)?);
        let elapsed = start.elapsed();

        measurements.push(Measurement {
            strategy: strategy.name(),
            elapsed,
            total,
        });
    }
    verify_agreement(&measurements)?;
    Ok(measurements)
}

/// Time every CPU strategy plus the GPU kernel.
///
/// The GPU result participates in the same agreement check as the CPU
/// strategies.
#[cfg(feature = "gpu")]
pub fn run_all_with_gpu(
    context: &crate::gpu::GpuContext,
    columns: &PlaybackColumns,
) -> Result<Vec<Measurement>> {
    let mut measurements = run_all(columns)?;

    let start = Instant::now();
    let total = black_box(context.reduce(columns.counts(), columns.durations())?);
    let elapsed = start.elapsed();

    measurements.push(Measurement {
        strategy: "gpu",
        elapsed,
        total,
    });
    verify_agreement(&measurements)?;
    Ok(measurements)
}

fn verify_agreement(measurements: &[Measurement]) -> Result<()> {
    let Some(baseline) = measurements.first() else {
        return Ok(());
    };
    for measurement in &measurements[1..] {
        if measurement.total != baseline.total {
            return Err(Error::StrategyMismatch {
                strategy: measurement.strategy,
                got: measurement.total,
                expected: baseline.total,
            });
        }
    }
    Ok(())
}
