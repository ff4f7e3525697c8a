//! Elementary streams and buffered-range reporting.
//!
//! For MSE playback the host supplies already-demuxed frames per elementary
//! stream. This module keeps the time index of those frames and derives the
//! buffered ranges from it on demand; ranges are never cached between calls.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous range of buffered media time, in seconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferedRange {
    pub start: f64,
    pub end: f64,
}

impl BufferedRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for BufferedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// The largest gap, in seconds, between frames that still counts as part of
/// the same buffered range.
pub const MAX_GAP_SIZE: f64 = 0.15;

#[derive(Debug, Clone, Copy)]
struct FrameWindow {
    start: f64,
    end: f64,
}

/// A thread-safe time index over the demuxed frames of a single elementary
/// stream (audio-only or video-only).
///
/// Frames are kept sorted by start time. Appending a frame with the same
/// start time replaces the existing one; otherwise frames insert by start
/// time even when they overlap, matching MSE append semantics.
#[derive(Debug, Default)]
pub struct ElementaryStream {
    frames: RwLock<Vec<FrameWindow>>,
}

impl ElementaryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame spanning `[start, end)` seconds.
    pub fn add_frame(&self, start: f64, end: f64) {
        let mut frames = self.frames.write();
        match frames.binary_search_by(|f| f.start.partial_cmp(&start).expect("frame time is NaN"))
        {
            Ok(i) => frames[i] = FrameWindow { start, end },
            Err(i) => frames.insert(i, FrameWindow { start, end }),
        }
    }

    /// Number of frames that start strictly inside `(start, end)`.
    pub fn count_frames_between(&self, start: f64, end: f64) -> usize {
        self.frames
            .read()
            .iter()
            .filter(|f| f.start > start && f.start < end)
            .count()
    }

    /// Removes frames that start in `[start, end)`.
    pub fn remove(&self, start: f64, end: f64) {
        self.frames
            .write()
            .retain(|f| f.start < start || f.start >= end);
    }

    /// Removes all frames.
    pub fn clear(&self) {
        self.frames.write().clear();
    }

    /// Whether the stream holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }

    /// The disjoint, sorted time ranges with contiguous frames, computed
    /// fresh from the frame index. Frames closer than [`MAX_GAP_SIZE`] merge
    /// into one range.
    pub fn buffered_ranges(&self) -> Vec<BufferedRange> {
        let frames = self.frames.read();
        let mut ranges: Vec<BufferedRange> = Vec::new();
        for frame in frames.iter() {
            match ranges.last_mut() {
                Some(last) if frame.start - last.end <= MAX_GAP_SIZE => {
                    if frame.end > last.end {
                        last.end = frame.end;
                    }
                }
                _ => ranges.push(BufferedRange::new(frame.start, frame.end)),
            }
        }
        ranges
    }
}

/// Intersects several buffered-range lists.
///
/// The player-level buffered report for multi-buffer MSE playback: a time is
/// buffered only if every elementary stream has it. Each input list must be
/// sorted and disjoint, as produced by
/// [`ElementaryStream::buffered_ranges`]. An empty slice yields no ranges.
pub fn intersect_ranges(lists: &[Vec<BufferedRange>]) -> Vec<BufferedRange> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    rest.iter()
        .fold(first.clone(), |acc, list| intersect_pair(&acc, list))
}

fn intersect_pair(a: &[BufferedRange], b: &[BufferedRange]) -> Vec<BufferedRange> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            out.push(BufferedRange::new(start, end));
        }
        if a[i].end <= b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}
