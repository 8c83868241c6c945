//! Track metadata sources and column collection.
//!
//! The kernel only consumes two integer columns per track: play count and
//! duration. [`TrackSource`] is the seam for whatever enumerates the media
//! library; acquisition and release are RAII (dropping the source releases
//! it on every exit path). [`PlaybackColumns`] copies the columns into
//! parallel arrays zero-padded to the SIMD lane width, so the kernel's
//! alignment contract always holds for data collected here.

use crate::error::{Error, Result};
use crate::simd::lane_width;

/// One track's playback metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    /// Number of times the track was played.
    pub play_count: i32,
    /// Track duration in seconds.
    pub duration_secs: i32,
}

/// An ordered, finite sequence of track records.
///
/// Implementations own whatever handle backs the enumeration and release it
/// in `Drop`.
pub trait TrackSource {
    /// Total number of tracks the source can produce.
    fn track_count(&self) -> usize;

    /// Next track in order, or `None` when exhausted.
    fn next_track(&mut self) -> Option<Track>;
}

/// Deterministic synthetic library for tests, benches, and the demo binary.
///
/// Uses a fixed-seed LCG so every run sees identical data: play counts in
/// `0..500` and durations in `30..600` seconds, roughly the shape of real
/// library metadata.
#[derive(Debug, Clone)]
pub struct SyntheticLibrary {
    len: usize,
    cursor: usize,
    state: u64,
}

impl SyntheticLibrary {
    /// Create a library with `len` tracks.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            len,
            cursor: 0,
            state: 0x2545_F491_4F6C_DD1D,
        }
    }
}

impl TrackSource for SyntheticLibrary {
    fn track_count(&self) -> usize {
        self.len
    }

    fn next_track(&mut self) -> Option<Track> {
        if self.cursor >= self.len {
            return None;
        }
        self.cursor += 1;
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        Some(Track {
            play_count: ((self.state >> 33) % 500) as i32,
            duration_secs: 30 + ((self.state >> 13) % 570) as i32,
        })
    }
}

/// Two parallel `i32` columns, zero-padded to a lane-width multiple.
///
/// The zero tail is an additive identity for the product-sum, so padding
/// never changes the reduction result.
#[derive(Debug, Clone)]
pub struct PlaybackColumns {
    counts: Vec<i32>,
    durations: Vec<i32>,
    track_count: usize,
}

impl PlaybackColumns {
    /// Copy up to `limit` tracks from `source` into padded columns.
    ///
    /// Padding targets the detected lane width of this machine.
    pub fn collect<S: TrackSource>(source: &mut S, limit: usize) -> Self {
        let expected = source.track_count().min(limit);
        let lanes = lane_width();
        let padded = expected.div_ceil(lanes.max(1)) * lanes.max(1);

        let mut counts = vec![0i32; padded];
        let mut durations = vec![0i32; padded];
        let mut collected = 0;
        while collected < limit {
            let Some(track) = source.next_track() else {
                break;
            };
            // Sources may report a stale count; grow if they over-deliver.
            if collected >= counts.len() {
                counts.push(0);
                durations.push(0);
            }
            counts[collected] = track.play_count;
            durations[collected] = track.duration_secs;
            collected += 1;
        }
        let mut columns = Self {
            counts,
            durations,
            track_count: collected,
        };
        columns.repad(lanes);
        columns
    }

    /// Build columns from raw pairs, padding both to the detected lane width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] when the vectors differ in length.
    /// A missing value in either column is a caller bug the kernel cannot
    /// repair, so it is surfaced here rather than papered over with zeros.
    pub fn from_pairs(counts: Vec<i32>, durations: Vec<i32>) -> Result<Self> {
        if counts.len() != durations.len() {
            return Err(Error::ShapeMismatch {
                counts_len: counts.len(),
                durations_len: durations.len(),
            });
        }
        let track_count = counts.len();
        let mut columns = Self {
            counts,
            durations,
            track_count,
        };
        columns.repad(lane_width());
        Ok(columns)
    }

    fn repad(&mut self, lanes: usize) {
        let lanes = lanes.max(1);
        let used = self.track_count;
        let target = used.div_ceil(lanes) * lanes;
        self.counts.resize(target, 0);
        self.durations.resize(target, 0);
        // Anything past the live tracks must be the additive identity.
        for value in &mut self.counts[used..] {
            *value = 0;
        }
        for value in &mut self.durations[used..] {
            *value = 0;
        }
    }

    /// Play-count column, padded.
    #[must_use]
    pub fn counts(&self) -> &[i32] {
        &self.counts
    }

    /// Duration column, padded.
    #[must_use]
    pub fn durations(&self) -> &[i32] {
        &self.durations
    }

    /// Padded column length (a lane-width multiple).
    #[must_use]
    pub fn padded_len(&self) -> usize {
        self.counts.len()
    }

    /// Number of live (unpadded) tracks.
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// True when no tracks were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.track_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_library_is_deterministic() {
        let mut a = SyntheticLibrary::new(16);
        let mut b = SyntheticLibrary::new(16);
        for _ in 0..16 {
            assert_eq!(a.next_track(), b.next_track());
        }
        assert_eq!(a.next_track(), None);
    }

    #[test]
    fn test_synthetic_values_in_range() {
        let mut library = SyntheticLibrary::new(256);
        while let Some(track) = library.next_track() {
            assert!((0..500).contains(&track.play_count));
            assert!((30..600).contains(&track.duration_secs));
        }
    }

    #[test]
    fn test_collect_pads_to_lane_width() {
        let mut library = SyntheticLibrary::new(10);
        let columns = PlaybackColumns::collect(&mut library, 10);
        assert_eq!(columns.track_count(), 10);
        assert_eq!(columns.padded_len() % lane_width(), 0);
        assert!(columns.padded_len() >= 10);
        assert_eq!(columns.counts().len(), columns.durations().len());
    }

    #[test]
    fn test_collect_respects_limit() {
        let mut library = SyntheticLibrary::new(100);
        let columns = PlaybackColumns::collect(&mut library, 7);
        assert_eq!(columns.track_count(), 7);
    }

    #[test]
    fn test_padding_tail_is_zero() {
        let columns = PlaybackColumns::from_pairs(vec![1, 2, 3], vec![9, 8, 7]).unwrap();
        for &value in &columns.counts()[3..] {
            assert_eq!(value, 0);
        }
        for &value in &columns.durations()[3..] {
            assert_eq!(value, 0);
        }
    }

    #[test]
    fn test_from_pairs_rejects_unequal_lengths() {
        let err = PlaybackColumns::from_pairs(vec![2, 3, 4], vec![10]).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                counts_len: 3,
                durations_len: 1,
            }
        ));
    }

    #[test]
    fn test_empty_collection() {
        let mut library = SyntheticLibrary::new(0);
        let columns = PlaybackColumns::collect(&mut library, 1000);
        assert!(columns.is_empty());
        assert_eq!(columns.padded_len(), 0);
    }
}
