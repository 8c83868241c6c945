//! Portable block-structured fallback for targets without SSE4.1/AVX2.
//!
//! Keeps the three SIMD schedules distinct on fixed `[i64; 4]` lanes so
//! the strategies remain comparable even where no vector unit is used.

/// Lanes per block in the fallback path. Must match the lane count the
/// `Scalar` SIMD level reports.
pub(crate) const LANES: usize = 4;

#[inline(always)]
fn mul_block(counts: &[i32], durations: &[i32]) -> [i64; LANES] {
    let mut lanes = [0i64; LANES];
    for (lane, (&c, &d)) in lanes.iter_mut().zip(counts.iter().zip(durations.iter())) {
        *lane = i64::from(c) * i64::from(d);
    }
    lanes
}

#[inline(always)]
fn horizontal_sum(lanes: [i64; LANES]) -> i64 {
    lanes.iter().sum()
}

/// One horizontal reduction per block, added to the accumulator immediately.
pub(crate) fn lane_reduce(counts: &[i32], durations: &[i32]) -> i64 {
    let mut acc = 0i64;
    for (c, d) in counts.chunks_exact(LANES).zip(durations.chunks_exact(LANES)) {
        acc += horizontal_sum(mul_block(c, d));
    }
    acc
}

/// Persistent lane accumulator, one horizontal reduction at the end.
pub(crate) fn deferred_acc(counts: &[i32], durations: &[i32]) -> i64 {
    let mut acc = [0i64; LANES];
    for (c, d) in counts.chunks_exact(LANES).zip(durations.chunks_exact(LANES)) {
        let prod = mul_block(c, d);
        for (a, p) in acc.iter_mut().zip(prod) {
            *a += p;
        }
    }
    horizontal_sum(acc)
}

/// Per-block product vectors stored in an `n / L` array, reduced afterwards.
pub(crate) fn deferred_array(counts: &[i32], durations: &[i32]) -> i64 {
    let blocks = counts.len() / LANES;
    let mut slots = vec![[0i64; LANES]; blocks];
    for ((c, d), slot) in counts
        .chunks_exact(LANES)
        .zip(durations.chunks_exact(LANES))
        .zip(slots.iter_mut())
    {
        *slot = mul_block(c, d);
    }
    slots.into_iter().map(horizontal_sum).sum()
}
