//! Scalar baseline for the product-sum reduction.

/// Sequential baseline: `acc += counts[i] * durations[i]` in index order.
///
/// `#[inline(never)]` prevents LLVM from auto-vectorizing this loop, so the
/// benchmark honestly compares scalar vs explicit SIMD.
#[inline(never)]
pub(crate) fn reduce(counts: &[i32], durations: &[i32]) -> i64 {
    let mut acc = 0i64;
    for (&c, &d) in counts.iter().zip(durations.iter()) {
        acc += i64::from(c) * i64::from(d);
    }
    acc
}
