//! Emberplay-Geometry: exact rational arithmetic and video fitting
//!
//! This crate provides the pure-computation geometry layer for emberplay.
//! Video frames rarely match the region they are drawn into: pixels may be
//! non-square (anamorphic content) and the display region can have any aspect
//! ratio. Repeated per-frame layout with floating point accumulates drift, so
//! all aspect-ratio math here is done with reduced integer fractions.
//!
//! # Modules
//!
//! - `rational` - Reduced fraction type with overflow-checked composition
//! - `fit` - Mapping a decoded frame onto a display region per fill mode
//!
//! Everything in this crate is stateless and safe for unsynchronized
//! concurrent use.

pub mod fit;
pub mod rational;

pub use fit::{fit_video_to_region, Rect, VideoFillMode};
pub use rational::Rational;
