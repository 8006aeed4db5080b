//! Viewport detection - One-shot visibility latch.
//!
//! A detector starts `Hidden` and flips to `Visible` once, the first time its
//! node's bounding rect lies fully inside the viewport. It never flips back.
//!
//! While hidden and attached it holds a scroll/touchmove subscription; every
//! event restarts a debounce timer, and the check runs when the timer fires.
//! Attaching also schedules one check after the next render pass. The
//! subscription and every pending task are dropped on the transition and on
//! detach, so a detector never calls back after either.
//!
//! # Example
//!
//! ```ignore
//! let detector = ViewportDetector::new(&runtime, Duration::from_millis(100), move || {
//!     source.schedule_load();
//! });
//!
//! detector.attach(element);
//! runtime.render()?;           // after-render check
//! runtime.scroll_to(0.0, 900.0);
//! runtime.scheduler.advance(Duration::from_millis(100)); // debounced check
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use taffy::geometry::{Rect, Size};

use crate::dom::{Document, NodeId};
use crate::runtime::{EventKinds, EventHub, Runtime, Scheduler, Subscription, TaskHandle};

// =============================================================================
// Types
// =============================================================================

/// Visibility latch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// Callback run once on the Hidden to Visible transition.
pub type EnterCallback = Rc<dyn Fn()>;

/// Check if `rect` lies fully inside a viewport of `size`.
pub fn is_fully_visible(rect: Rect<f32>, size: Size<f32>) -> bool {
    rect.top >= 0.0 && rect.left >= 0.0 && rect.bottom <= size.height && rect.right <= size.width
}

#[derive(Default)]
struct DetectorState {
    visibility: Visibility,
    node: Option<NodeId>,
    attached: bool,
    destroyed: bool,
    delay: Duration,
    subscription: Option<Subscription>,
    pending_check: Option<TaskHandle>,
    debounce: Option<TaskHandle>,
    on_enter: Option<EnterCallback>,
}

impl DetectorState {
    fn is_live(&self) -> bool {
        self.attached && !self.destroyed
    }

    /// Drop the subscription and cancel every pending task.
    fn stop_watching(&mut self) {
        self.subscription = None;
        self.pending_check = None;
        self.debounce = None;
    }
}

// =============================================================================
// Viewport Detector
// =============================================================================

pub struct ViewportDetector {
    state: Rc<RefCell<DetectorState>>,
    document: Document,
    events: EventHub,
    scheduler: Scheduler,
}

impl ViewportDetector {
    pub fn new(runtime: &Runtime, delay: Duration, on_enter: impl Fn() + 'static) -> Self {
        let state = DetectorState {
            delay,
            on_enter: Some(Rc::new(on_enter)),
            ..DetectorState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            document: runtime.document.clone(),
            events: runtime.events.clone(),
            scheduler: runtime.scheduler.clone(),
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.state.borrow().visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility() == Visibility::Visible
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    /// Whether a scroll/touchmove subscription is held.
    pub fn is_watching(&self) -> bool {
        self.state.borrow().subscription.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.state.borrow().delay
    }

    /// Change the debounce window. Applies to the next event.
    pub fn set_delay(&self, delay: Duration) {
        self.state.borrow_mut().delay = delay;
    }

    /// Start watching `node`.
    pub fn attach(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        if state.destroyed {
            return;
        }
        state.node = Some(node);
        state.attached = true;
        if state.visibility == Visibility::Visible {
            return;
        }

        let weak = Rc::downgrade(&self.state);
        let document = self.document.clone();
        let scheduler = self.scheduler.clone();
        state.subscription = Some(self.events.subscribe(
            EventKinds::SCROLL | EventKinds::TOUCH_MOVE,
            move |_| debounce(&weak, &document, &scheduler),
        ));

        let weak = Rc::downgrade(&self.state);
        let document = self.document.clone();
        state.pending_check = Some(self.scheduler.schedule_after_render(move || check(&weak, &document)));
        tracing::trace!(?node, "viewport detector attached");
    }

    /// Stop watching. Pending checks are cancelled.
    pub fn detach(&self) {
        let mut state = self.state.borrow_mut();
        state.attached = false;
        state.stop_watching();
    }

    /// Detach for good. Later calls to `attach` are ignored.
    pub fn destroy(&self) {
        let mut state = self.state.borrow_mut();
        state.destroyed = true;
        state.attached = false;
        state.stop_watching();
        state.on_enter = None;
    }

    /// Flip to `Visible` without a rect check. Returns whether it flipped.
    ///
    /// The enter callback is not run.
    pub fn force_visible(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.visibility == Visibility::Visible {
            return false;
        }
        state.visibility = Visibility::Visible;
        state.stop_watching();
        true
    }

    /// Run a visibility check now.
    pub fn check_now(&self) {
        check(&Rc::downgrade(&self.state), &self.document);
    }
}

// =============================================================================
// Deferred Checks
// =============================================================================

/// Restart the debounce timer.
fn debounce(weak: &Weak<RefCell<DetectorState>>, document: &Document, scheduler: &Scheduler) {
    let Some(state) = weak.upgrade() else { return };
    let mut state = state.borrow_mut();
    if !state.is_live() || state.visibility == Visibility::Visible {
        return;
    }

    state.debounce = None;
    let check_weak = weak.clone();
    let document = document.clone();
    state.debounce = Some(scheduler.schedule_timer(state.delay, move || check(&check_weak, &document)));
}

fn check(weak: &Weak<RefCell<DetectorState>>, document: &Document) {
    let Some(state) = weak.upgrade() else { return };

    let on_enter = {
        let mut state = state.borrow_mut();
        if !state.is_live() || state.visibility == Visibility::Visible {
            return;
        }
        let Some(node) = state.node else { return };
        let Some(rect) = document.bounding_client_rect(node) else { return };
        if !is_fully_visible(rect, document.viewport()) {
            return;
        }

        state.visibility = Visibility::Visible;
        state.stop_watching();
        tracing::debug!(?node, "entered viewport");
        state.on_enter.clone()
    };

    if let Some(on_enter) = on_enter {
        on_enter();
    }
}
