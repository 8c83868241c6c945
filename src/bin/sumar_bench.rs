//! Demo shell for the play-time reduction benchmark.
//!
//! Builds a deterministic synthetic library, collects the play-count and
//! duration columns, runs every reduction strategy through the harness,
//! and prints the rendered report. This binary is the only place that
//! performs I/O.

use sumar::harness;
use sumar::library::{PlaybackColumns, SyntheticLibrary, TrackSource};
use sumar::report;
use sumar::simd::detect_simd_level;

const TRACK_LIMIT: usize = 100_000;

fn main() -> sumar::Result<()> {
    #[cfg(feature = "gpu")]
    env_logger::init();

    let mut library = SyntheticLibrary::new(TRACK_LIMIT);
    println!("{} tracks, querying...", library.track_count());
    let columns = PlaybackColumns::collect(&mut library, TRACK_LIMIT);
    drop(library);

    println!("Calculating...");
    let measurements = run(&columns)?;

    print!(
        "{}",
        report::render(detect_simd_level().name(), columns.track_count(), &measurements)
    );
    Ok(())
}

#[cfg(not(feature = "gpu"))]
fn run(columns: &PlaybackColumns) -> sumar::Result<Vec<harness::Measurement>> {
    harness::run_all(columns)
}

#[cfg(feature = "gpu")]
fn run(columns: &PlaybackColumns) -> sumar::Result<Vec<harness::Measurement>> {
    let context = sumar::gpu::GpuContext::new_blocking()?;
    harness::run_all_with_gpu(&context, columns)
}
