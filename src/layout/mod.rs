//! Layout - Document geometry via Taffy.
//!
//! Placeholders need real bounding rectangles before the viewport detector
//! can tell whether they are on screen. [`compute_layout`] produces them for
//! everything connected under `body`.

mod taffy_bridge;

pub use taffy_bridge::compute_layout;
