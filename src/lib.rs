//! # Sumar
//!
//! SIMD/GPU-accelerated micro-benchmark for the play-time reduction
//! `Σ playCount[i] * duration[i]` over media library track metadata.
//!
//! Four interchangeable CPU strategies (scalar baseline plus three SIMD
//! accumulation schedules) and an optional GPU compute kernel compute the
//! same 64-bit product-sum; the harness times them and fails hard if any
//! two disagree. The experimental question is whether deferring the
//! horizontal reduction to the end of the loop, versus performing it per
//! block, changes measured throughput.
//!
//! ## Quick Start
//!
//! ```rust
//! use sumar::harness;
//! use sumar::library::{PlaybackColumns, SyntheticLibrary};
//!
//! let mut library = SyntheticLibrary::new(1000);
//! let columns = PlaybackColumns::collect(&mut library, 1000);
//! let measurements = harness::run_all(&columns)?;
//! assert!(measurements.windows(2).all(|w| w[0].total == w[1].total));
//! # Ok::<(), sumar::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `gpu`: Enable the wgpu compute reduction path

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Runtime CPU capability detection and lane widths.
pub mod simd;

/// The reduction kernel and its accumulation strategies.
pub mod kernel;

// ============================================================================
// Data and Measurement Modules
// ============================================================================

/// Track metadata sources and padded column collection.
pub mod library;

/// Timing harness with inter-strategy agreement checking.
pub mod harness;

/// Text rendering of harness results.
pub mod report;

/// GPU compute reduction path.
#[cfg(feature = "gpu")]
#[cfg_attr(docsrs, doc(cfg(feature = "gpu")))]
pub mod gpu;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for sumar operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::harness::{run_all, Measurement};
    pub use crate::kernel::{reduce, Strategy};
    pub use crate::library::{PlaybackColumns, SyntheticLibrary, Track, TrackSource};
    pub use crate::simd::{detect_simd_level, lane_width, SimdLevel};

    #[cfg(feature = "gpu")]
    pub use crate::gpu::GpuContext;
    #[cfg(feature = "gpu")]
    pub use crate::harness::run_all_with_gpu;
}
