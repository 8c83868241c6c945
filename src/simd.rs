//! Runtime CPU capability detection.
//!
//! The reduction kernel dispatches on the detected level: AVX2 processes
//! 8 lanes of `i32` per block, SSE4.1 processes 4, and the portable
//! fallback emulates 4-lane blocks so the lane-alignment contract holds
//! on every target.

use std::sync::OnceLock;

/// CPU feature level detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// No usable SIMD, portable block fallback.
    Scalar,
    /// SSE4.1 available (128-bit vectors, 4 x i32 per block).
    Sse41,
    /// AVX2 available (256-bit vectors, 8 x i32 per block).
    Avx2,
}

impl SimdLevel {
    /// Human-readable name for reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SimdLevel::Scalar => "portable (no SIMD)",
            SimdLevel::Sse41 => "SSE4.1 (128-bit)",
            SimdLevel::Avx2 => "AVX2 (256-bit)",
        }
    }

    /// Number of `i32` lanes processed per block at this level.
    #[must_use]
    pub const fn lanes(&self) -> usize {
        match self {
            SimdLevel::Scalar | SimdLevel::Sse41 => 4,
            SimdLevel::Avx2 => 8,
        }
    }
}

/// Cached CPU feature level (detected once, safe from any thread).
static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Detect CPU SIMD capabilities at runtime.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn detect_simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(|| {
        if is_x86_feature_detected!("avx2") {
            SimdLevel::Avx2
        } else if is_x86_feature_detected!("sse4.1") {
            SimdLevel::Sse41
        } else {
            SimdLevel::Scalar
        }
    })
}

/// Fallback detection for non-x86 architectures.
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub fn detect_simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(|| SimdLevel::Scalar)
}

/// Lane width `L` for the current machine.
///
/// Input columns handed to the kernel must have a length that is a
/// multiple of this value; [`crate::library::PlaybackColumns`] pads to it.
#[must_use]
pub fn lane_width() -> usize {
    detect_simd_level().lanes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_is_stable() {
        assert_eq!(detect_simd_level(), detect_simd_level());
    }

    #[test]
    fn test_lane_width_matches_level() {
        assert_eq!(lane_width(), detect_simd_level().lanes());
    }

    #[test]
    fn test_lanes_are_powers_of_two() {
        for level in [SimdLevel::Scalar, SimdLevel::Sse41, SimdLevel::Avx2] {
            assert!(level.lanes().is_power_of_two());
            assert!(!level.name().is_empty());
        }
    }
}
