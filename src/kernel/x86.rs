//! SSE4.1 and AVX2 implementations of the three SIMD schedules.
//!
//! Each block of `L` consecutive `i32` elements is multiplied elementwise
//! with 64-bit widening: `mul_epi32` produces the even-lane products and a
//! 32-bit right shift of each 64-bit lane exposes the odd elements for a
//! second `mul_epi32`, yielding `L / 2` packed `i64` partials per block.
//! Accumulation then differs per schedule: horizontal reduction per block,
//! a persistent `i64`-lane accumulator, or a per-block slot array.
//!
//! # Safety
//!
//! Callers must ensure the corresponding CPU feature is available (checked
//! by the dispatcher in `kernel::reduce`) and that both slices have equal,
//! lane-aligned lengths (checked by `kernel::validate`).

#![cfg(target_arch = "x86_64")]

use std::arch::x86_64::*;

// ---------------------------------------------------------------------------
// SSE4.1: 4 x i32 per block, 2 x i64 partials
// ---------------------------------------------------------------------------

/// Widening elementwise multiply of one 4-lane block.
///
/// Returns `[c0*d0 + c1*d1, c2*d2 + c3*d3]` as two packed `i64` lanes.
#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn mul_widen_sse41(va: __m128i, vb: __m128i) -> __m128i {
    unsafe {
        // Products of lanes 0 and 2 (low dword of each qword, sign-extended).
        let even = _mm_mul_epi32(va, vb);
        // Byte-shift lanes 1 and 3 into the even positions.
        let odd = _mm_mul_epi32(_mm_srli_si128::<4>(va), _mm_srli_si128::<4>(vb));
        _mm_add_epi64(even, odd)
    }
}

/// Horizontal sum of two packed `i64` lanes.
#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn hsum_sse41(v: __m128i) -> i64 {
    unsafe { _mm_cvtsi128_si64(v).wrapping_add(_mm_extract_epi64::<1>(v)) }
}

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn lane_reduce_sse41(counts: &[i32], durations: &[i32]) -> i64 {
    let cp = counts.as_ptr();
    let dp = durations.as_ptr();
    let mut acc = 0i64;
    let mut i = 0;
    while i < counts.len() {
        unsafe {
            let va = _mm_loadu_si128(cp.add(i).cast());
            let vb = _mm_loadu_si128(dp.add(i).cast());
            acc = acc.wrapping_add(hsum_sse41(mul_widen_sse41(va, vb)));
        }
        i += 4;
    }
    acc
}

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn deferred_acc_sse41(counts: &[i32], durations: &[i32]) -> i64 {
    let cp = counts.as_ptr();
    let dp = durations.as_ptr();
    let mut acc = _mm_setzero_si128();
    let mut i = 0;
    while i < counts.len() {
        unsafe {
            let va = _mm_loadu_si128(cp.add(i).cast());
            let vb = _mm_loadu_si128(dp.add(i).cast());
            acc = _mm_add_epi64(acc, mul_widen_sse41(va, vb));
        }
        i += 4;
    }
    unsafe { hsum_sse41(acc) }
}

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn deferred_array_sse41(counts: &[i32], durations: &[i32]) -> i64 {
    let blocks = counts.len() / 4;
    // Two i64 partials per block slot.
    let mut slots = vec![0i64; blocks * 2];
    let cp = counts.as_ptr();
    let dp = durations.as_ptr();
    for block in 0..blocks {
        unsafe {
            let va = _mm_loadu_si128(cp.add(block * 4).cast());
            let vb = _mm_loadu_si128(dp.add(block * 4).cast());
            _mm_storeu_si128(
                slots.as_mut_ptr().add(block * 2).cast(),
                mul_widen_sse41(va, vb),
            );
        }
    }
    slots
        .chunks_exact(2)
        .map(|slot| slot[0].wrapping_add(slot[1]))
        .fold(0i64, i64::wrapping_add)
}

// ---------------------------------------------------------------------------
// AVX2: 8 x i32 per block, 4 x i64 partials
// ---------------------------------------------------------------------------

/// Widening elementwise multiply of one 8-lane block into 4 packed `i64`.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn mul_widen_avx2(va: __m256i, vb: __m256i) -> __m256i {
    unsafe {
        let even = _mm256_mul_epi32(va, vb);
        // Shift each qword right by 32 so odd elements land in the low dwords.
        let odd = _mm256_mul_epi32(_mm256_srli_epi64::<32>(va), _mm256_srli_epi64::<32>(vb));
        _mm256_add_epi64(even, odd)
    }
}

/// Horizontal sum of four packed `i64` lanes.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn hsum_avx2(v: __m256i) -> i64 {
    unsafe {
        let folded = _mm_add_epi64(_mm256_castsi256_si128(v), _mm256_extracti128_si256::<1>(v));
        _mm_cvtsi128_si64(folded).wrapping_add(_mm_extract_epi64::<1>(folded))
    }
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn lane_reduce_avx2(counts: &[i32], durations: &[i32]) -> i64 {
    let cp = counts.as_ptr();
    let dp = durations.as_ptr();
    let mut acc = 0i64;
    let mut i = 0;
    while i < counts.len() {
        unsafe {
            let va = _mm256_loadu_si256(cp.add(i).cast());
            let vb = _mm256_loadu_si256(dp.add(i).cast());
            acc = acc.wrapping_add(hsum_avx2(mul_widen_avx2(va, vb)));
        }
        i += 8;
    }
    acc
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn deferred_acc_avx2(counts: &[i32], durations: &[i32]) -> i64 {
    let cp = counts.as_ptr();
    let dp = durations.as_ptr();
    let mut acc = _mm256_setzero_si256();
    let mut i = 0;
    while i < counts.len() {
        unsafe {
            let va = _mm256_loadu_si256(cp.add(i).cast());
            let vb = _mm256_loadu_si256(dp.add(i).cast());
            acc = _mm256_add_epi64(acc, mul_widen_avx2(va, vb));
        }
        i += 8;
    }
    unsafe { hsum_avx2(acc) }
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn deferred_array_avx2(counts: &[i32], durations: &[i32]) -> i64 {
    let blocks = counts.len() / 8;
    // Four i64 partials per block slot.
    let mut slots = vec![0i64; blocks * 4];
    let cp = counts.as_ptr();
    let dp = durations.as_ptr();
    for block in 0..blocks {
        unsafe {
            let va = _mm256_loadu_si256(cp.add(block * 8).cast());
            let vb = _mm256_loadu_si256(dp.add(block * 8).cast());
            _mm256_storeu_si256(
                slots.as_mut_ptr().add(block * 4).cast(),
                mul_widen_avx2(va, vb),
            );
        }
    }
    slots
        .chunks_exact(4)
        .map(|slot| {
            slot[0]
                .wrapping_add(slot[1])
                .wrapping_add(slot[2])
                .wrapping_add(slot[3])
        })
        .fold(0i64, i64::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::scalar;

    fn inputs() -> (Vec<i32>, Vec<i32>) {
        let counts: Vec<i32> = (0..64).map(|i| i * 7 - 100).collect();
        let durations: Vec<i32> = (0..64).map(|i| 300 - i * 11).collect();
        (counts, durations)
    }

    #[test]
    fn test_sse41_strategies_match_scalar() {
        if !is_x86_feature_detected!("sse4.1") {
            return;
        }
        let (counts, durations) = inputs();
        let expected = scalar::reduce(&counts, &durations);
        unsafe {
            assert_eq!(lane_reduce_sse41(&counts, &durations), expected);
            assert_eq!(deferred_acc_sse41(&counts, &durations), expected);
            assert_eq!(deferred_array_sse41(&counts, &durations), expected);
        }
    }

    #[test]
    fn test_avx2_strategies_match_scalar() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let (counts, durations) = inputs();
        let expected = scalar::reduce(&counts, &durations);
        unsafe {
            assert_eq!(lane_reduce_avx2(&counts, &durations), expected);
            assert_eq!(deferred_acc_avx2(&counts, &durations), expected);
            assert_eq!(deferred_array_avx2(&counts, &durations), expected);
        }
    }

    #[test]
    fn test_widening_handles_large_magnitudes() {
        if !is_x86_feature_detected!("sse4.1") {
            return;
        }
        // Individual products approach 2^62 in magnitude; each fits i64.
        let counts = vec![i32::MAX, i32::MIN, 1, -1];
        let durations = vec![2, 2, i32::MAX, i32::MIN];
        let expected = scalar::reduce(&counts, &durations);
        unsafe {
            assert_eq!(lane_reduce_sse41(&counts, &durations), expected);
            assert_eq!(deferred_acc_sse41(&counts, &durations), expected);
        }
    }
}
