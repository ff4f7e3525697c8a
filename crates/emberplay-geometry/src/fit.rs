//! Fitting decoded video frames onto a display region.
//!
//! [`fit_video_to_region`] computes two rectangles: `src`, the sub-region of
//! the decoded frame to sample, and `dest`, the region of the display to draw
//! into. Together they express letterboxing, cropping, or stretching for the
//! selected [`VideoFillMode`].

use std::fmt;

use crate::rational::Rational;

/// How video frames are resized to fill the drawing region. The frame is
/// always centered within the region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum VideoFillMode {
    /// Preserve the display aspect ratio and size the video to the smaller
    /// extent. Unused region area is left blank (letterbox/pillarbox).
    #[default]
    MaintainRatio,

    /// Stretch the video to completely fill the region, ignoring aspect
    /// ratio.
    Stretch,

    /// Preserve the display aspect ratio and size the video to the larger
    /// extent, cropping frame content that falls outside the region.
    Zoom,
}

impl fmt::Display for VideoFillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaintainRatio => write!(f, "maintain_ratio"),
            Self::Stretch => write!(f, "stretch"),
            Self::Zoom => write!(f, "zoom"),
        }
    }
}

/// A rectangle with integer precision, in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub w: T,
    pub h: T,
}

impl<T> Rect<T> {
    pub fn new(x: T, y: T, w: T, h: T) -> Self {
        Self { x, y, w, h }
    }
}

impl<T: fmt::Display> fmt::Display for Rect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{x={},y={},w={},h={}}}", self.x, self.y, self.w, self.h)
    }
}

/// Computes the source and destination rectangles to draw a video frame into
/// a display region with the given fill mode.
///
/// `sample_aspect_ratio` is the aspect ratio of a single pixel in the frame;
/// `(0, 0)` is treated as `(1, 1)` (square pixels). The frame's display
/// aspect ratio is `frame.w * sar / frame.h`, computed exactly in rational
/// arithmetic so repeated per-frame layout never drifts.
///
/// Scaled extents that do not divide evenly are truncated toward zero, and
/// centering offsets are computed by integer halving of the leftover extent.
/// Degenerate inputs (a frame or bounds with a zero extent) produce empty
/// rectangles.
///
/// Returns `(src, dest)`: `src` is the sub-rectangle of `frame` to sample and
/// `dest` the rectangle within `bounds` to draw to.
pub fn fit_video_to_region(
    frame: Rect<u32>,
    bounds: Rect<u32>,
    sample_aspect_ratio: Rational<u32>,
    mode: VideoFillMode,
) -> (Rect<u32>, Rect<u32>) {
    let sar = if sample_aspect_ratio.is_valid() {
        sample_aspect_ratio
    } else {
        Rational::new(1, 1)
    };
    let frame_aspect = Rational::new(frame.w, frame.h) * sar;
    let bounds_aspect = Rational::new(bounds.w, bounds.h);

    match mode {
        VideoFillMode::Stretch => (frame, bounds),
        VideoFillMode::MaintainRatio => {
            // Largest display-aspect rectangle inside the bounds.
            let dest = inscribe(frame_aspect, bounds);
            (frame, dest)
        }
        VideoFillMode::Zoom => {
            // The crop is the largest bounds-aspect rectangle inside the
            // frame. It is expressed in frame pixels, so the bounds aspect
            // has to be corrected back through the SAR.
            let src = inscribe(bounds_aspect / sar, frame);
            (src, bounds)
        }
    }
}

/// Produces the largest rectangle with aspect ratio `aspect` that fits inside
/// `region`, centered within it.
fn inscribe(aspect: Rational<u32>, region: Rect<u32>) -> Rect<u32> {
    if !aspect.is_valid() || region.w == 0 || region.h == 0 {
        return Rect::new(region.x, region.y, 0, 0);
    }

    let region_aspect = Rational::new(region.w, region.h);
    // ratio > 1 means the region is wider than the target aspect, so the
    // height is the limiting extent.
    let ratio = region_aspect / aspect;
    let width_limited = ratio.numerator <= ratio.denominator;

    let (w, h) = if width_limited {
        let h = (aspect.inverse() * region.w).truncate();
        (region.w, h)
    } else {
        let w = (aspect * region.h).truncate();
        (w, region.h)
    };

    Rect::new(
        region.x + (region.w - w) / 2,
        region.y + (region.h - h) / 2,
        w,
        h,
    )
}
