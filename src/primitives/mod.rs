//! Primitives - Placeholder components.
//!
//! - [`ImgWrap`] - Lazily loaded image placeholder backed by the clone pool
//!
//! # Architecture
//!
//! A placeholder never owns an image node. It owns a clone *handle* from its
//! source, and the node behind the handle can be swapped by the pool when the
//! source switches to a loading or error image:
//!
//! 1. Assigning a source checks a clone out with the current attributes
//! 2. Mounting appends the clone and attaches the viewport detector
//! 3. The first fully visible check calls the source's `schedule_load`
//! 4. Change events re-insert the (possibly swapped) clone and notify
//! 5. Teardown releases the handle before the placeholder goes away

mod img_wrap;
mod types;

pub use img_wrap::*;
pub use types::*;
