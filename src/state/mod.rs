//! State Module - Per-placeholder runtime state.
//!
//! - **Viewport** - One-shot visibility latch with debounced scroll/touch checks

mod viewport;

pub use viewport::*;
