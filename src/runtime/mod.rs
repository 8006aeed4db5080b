//! Runtime - The host environment a placeholder lives in.
//!
//! - **Document** - Element tree and viewport geometry
//! - **EventHub** - Global scroll/touchmove sources
//! - **Scheduler** - After-render tasks and virtual-clock timers
//!
//! Everything here is single-threaded and cooperative. Hosts drive it:
//! scroll with [`Runtime::scroll_to`], finish render passes with
//! [`Runtime::render`], and let time pass with [`Scheduler::advance`].

mod events;
mod scheduler;

pub use events::*;
pub use scheduler::*;

use taffy::geometry::Size;

use crate::dom::Document;
use crate::error::Result;
use crate::layout::compute_layout;

/// Handles to the host environment. Cloning shares the same environment.
#[derive(Clone)]
pub struct Runtime {
    pub document: Document,
    pub events: EventHub,
    pub scheduler: Scheduler,
}

impl Runtime {
    /// Create an environment with an empty document of the given viewport size.
    pub fn new(viewport: Size<f32>) -> Self {
        Self {
            document: Document::new(viewport),
            events: EventHub::new(),
            scheduler: Scheduler::new(),
        }
    }

    /// Complete a render pass: lay out the document, then flush after-render tasks.
    pub fn render(&self) -> Result<usize> {
        compute_layout(&self.document)?;
        Ok(self.scheduler.render())
    }

    /// Scroll the window and emit a scroll event.
    pub fn scroll_to(&self, x: f32, y: f32) {
        self.document.scroll_to(x, y);
        self.events.emit(GlobalEvent::Scroll);
    }

    /// Emit a touchmove event.
    pub fn touch_move(&self) {
        self.events.emit(GlobalEvent::TouchMove);
    }
}
