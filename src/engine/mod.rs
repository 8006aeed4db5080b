//! Engine - Clone pool and its counters.
//!
//! - ClonePool: Templates, free lists and tracked-attribute metadata per clone
//! - Counters: Diagnostic counters shared with the source registry
//!
//! # Architecture
//!
//! Clones are not objects. They are node indices in the document, plus a
//! metadata record in the pool:
//!
//! ```text
//! Node 7:  img src=a.png  (key=a.png, tracked=[alt, width], checked out)
//! Node 9:  img src=a.png  (key=a.png, tracked=[],           free)
//! Node 12: img            (key=<empty>, tracked=[title],    checked out)
//! ```
//!
//! Free clones are parked in one detached container node. A checkout pops a
//! clone off its key's free list; a release strips it and pushes it back.

mod pool;
mod stats;

pub use pool::*;
pub use stats::*;
