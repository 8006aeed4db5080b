//! Sources - Per-image load state.
//!
//! One [`LoadState`] exists per source key for the whole life of the manager.
//! It owns the tri-state load status and hands out clone handles: a handle
//! pairs the source's bookkeeping with the physical clone checked out of the
//! pool.
//!
//! - [`ImgSource`] - Default load state, backed by a [`Fetcher`]
//! - [`SourceRegistry`] - Append-only map from source key to load state
//! - [`RuleSet`] - First-match policy lookup

mod img_source;
mod registry;
mod rules;

pub use img_source::*;
pub use registry::*;
pub use rules::*;

use std::cell::Cell;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::engine::ClonePool;
use crate::error::PoolError;
use crate::types::{AttributeMap, LoadStatus, SourceKey};

// =============================================================================
// Clone Handles
// =============================================================================

/// Events a load state reports to clone holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneEvent {
    /// The status changed; the node passed along is the handle's current clone.
    Change,
}

/// Callback receiving clone events.
pub type ChangeHandler = Rc<dyn Fn(CloneEvent, NodeId)>;

/// Shared handle to one checked-out clone.
pub type CloneHandle = Rc<CloneHolder>;

/// A source's record of one checked-out clone.
///
/// The node can change under the holder when the source switches the clone
/// to a placeholder source; always read it through [`CloneHolder::node`].
pub struct CloneHolder {
    id: u64,
    node: Cell<NodeId>,
    on_change: ChangeHandler,
}

impl CloneHolder {
    pub fn new(id: u64, node: NodeId, on_change: ChangeHandler) -> Self {
        Self {
            id,
            node: Cell::new(node),
            on_change,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The clone currently held.
    pub fn node(&self) -> NodeId {
        self.node.get()
    }

    pub(crate) fn set_node(&self, node: NodeId) {
        self.node.set(node);
    }

    /// Invoke the change handler with the current clone.
    pub fn notify(&self, event: CloneEvent) {
        (self.on_change)(event, self.node());
    }
}

impl std::fmt::Debug for CloneHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneHolder")
            .field("id", &self.id)
            .field("node", &self.node.get())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Load State
// =============================================================================

/// Load state of one source.
pub trait LoadState {
    fn key(&self) -> &SourceKey;

    fn src(&self) -> Option<&str>;

    fn status(&self) -> LoadStatus;

    fn is_loading(&self) -> bool {
        self.status().is_loading()
    }

    fn is_error(&self) -> bool {
        self.status().is_error()
    }

    fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Load progress, 0 to 100.
    fn progress(&self) -> u8;

    /// Whether placeholders should wait for the viewport before loading.
    fn lazy_load(&self) -> bool;

    /// Start loading. No-op when already loading or resolved.
    fn schedule_load(&self);

    /// Check out a clone carrying `attributes`.
    fn create_clone(&self, attributes: &AttributeMap, on_change: ChangeHandler) -> Result<CloneHandle, PoolError>;

    /// Give a handle's clone back to the pool.
    fn release_clone(&self, handle: &CloneHandle) -> Result<(), PoolError>;

    /// Forget every handle without touching the pool. Called after the pool
    /// destroyed the clones behind them.
    fn discard_clones(&self) {}

    /// Register a callback for the first failure of this source.
    fn on_first_failure(&self, callback: Box<dyn FnOnce()>);
}

/// Builds the load state for a newly seen source.
pub trait LoadStateFactory {
    fn create(&self, src: Option<&str>, rule: &Rule, pool: &Rc<ClonePool>) -> Rc<dyn LoadState>;
}
