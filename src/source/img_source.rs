//! ImgSource - Default load state backed by a fetcher.
//!
//! Status and progress live in signals so a consumer can bind to them. Each
//! fetch attempt gets a fresh attempt number; a responder for an older
//! attempt is ignored, so late callbacks can never resurrect a settled load.
//!
//! While the image is not loaded, clones are checked out for the rule's
//! `loading_src`. When the load settles, every live handle is switched to the
//! real source (success) or to `error_src` (failure), then notified.
//!
//! # Example
//!
//! ```ignore
//! let source = ImgSource::new(Some("cat.png"), &rule, pool, fetcher);
//! let handle = source.create_clone(&attributes, on_change)?;
//!
//! source.schedule_load();   // fetcher receives a FetchRequest
//! // ... fetcher later calls request.responder.succeed()
//! assert!(source.is_success());
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::engine::{AttributeSource, ClonePool};
use crate::error::PoolError;
use crate::types::{AttributeMap, LoadStatus, SourceKey};

use super::{ChangeHandler, CloneEvent, CloneHandle, CloneHolder, LoadState, LoadStateFactory, Rule};

// =============================================================================
// Fetcher
// =============================================================================

/// Performs the network side of a load.
pub trait Fetcher {
    /// Begin fetching. Report back through `request.responder`, now or later.
    fn fetch(&self, request: FetchRequest);
}

/// One fetch attempt.
pub struct FetchRequest {
    /// Source to fetch (`""` for an absent source).
    pub src: String,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    pub responder: FetchResponder,
}

/// Reports the outcome of one attempt back to its source.
///
/// Cloning is allowed. Only the first settling call of the current attempt
/// has an effect.
#[derive(Clone)]
pub struct FetchResponder {
    source: Weak<ImgSource>,
    attempt: u64,
}

impl FetchResponder {
    /// Report progress, clamped to 100.
    pub fn progress(&self, percent: u8) {
        if let Some(source) = self.source.upgrade() {
            source.report_progress(self.attempt, percent.min(100));
        }
    }

    pub fn succeed(&self) {
        if let Some(source) = self.source.upgrade() {
            source.settle(self.attempt, true);
        }
    }

    pub fn fail(&self) {
        if let Some(source) = self.source.upgrade() {
            source.settle(self.attempt, false);
        }
    }
}

// =============================================================================
// ImgSource
// =============================================================================

#[derive(Default)]
struct SourceState {
    tries: u32,
    attempt: u64,
    next_handle: u64,
    handles: Vec<CloneHandle>,
    failure_callbacks: Vec<Box<dyn FnOnce()>>,
    failed: bool,
}

/// Load state for one source.
pub struct ImgSource {
    src: Option<String>,
    key: SourceKey,
    max_tries: u32,
    lazy_load: bool,
    loading_src: Option<String>,
    error_src: Option<String>,
    pool: Rc<ClonePool>,
    fetcher: Rc<dyn Fetcher>,
    status: Signal<LoadStatus>,
    progress: Signal<u8>,
    state: RefCell<SourceState>,
    this: Weak<ImgSource>,
}

impl ImgSource {
    pub fn new(src: Option<&str>, rule: &Rule, pool: Rc<ClonePool>, fetcher: Rc<dyn Fetcher>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            src: src.map(str::to_string),
            key: SourceKey::for_src(src),
            max_tries: rule.max_tries.max(1),
            lazy_load: rule.lazy_load,
            loading_src: rule.loading_src.clone(),
            error_src: rule.error_src.clone(),
            pool,
            fetcher,
            status: signal(LoadStatus::Pending),
            progress: signal(0),
            state: RefCell::new(SourceState::default()),
            this: this.clone(),
        })
    }

    /// Signal carrying the status.
    pub fn status_signal(&self) -> Signal<LoadStatus> {
        self.status.clone()
    }

    /// Signal carrying the progress.
    pub fn progress_signal(&self) -> Signal<u8> {
        self.progress.clone()
    }

    /// Attempts started so far.
    pub fn tries(&self) -> u32 {
        self.state.borrow().tries
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Number of clone handles currently out.
    pub fn handle_count(&self) -> usize {
        self.state.borrow().handles.len()
    }

    /// Source clones are checked out for in the current status.
    pub fn display_src(&self) -> Option<&str> {
        let placeholder = match self.status.get() {
            LoadStatus::Success => None,
            LoadStatus::Error => self.error_src.as_deref(),
            LoadStatus::Pending | LoadStatus::Loading => self.loading_src.as_deref(),
        };
        placeholder.or(self.src.as_deref())
    }

    fn start_attempt(&self) {
        let (attempt, tries) = {
            let mut state = self.state.borrow_mut();
            state.tries += 1;
            state.attempt += 1;
            (state.attempt, state.tries)
        };
        self.progress.set(0);
        self.status.set(LoadStatus::Loading);

        tracing::debug!(key = %self.key, attempt = tries, max_tries = self.max_tries, "fetching source");
        self.fetcher.fetch(FetchRequest {
            src: self.src.clone().unwrap_or_default(),
            attempt: tries,
            responder: FetchResponder {
                source: self.this.clone(),
                attempt,
            },
        });
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.state.borrow().attempt == attempt && self.status.get() == LoadStatus::Loading
    }

    fn report_progress(&self, attempt: u64, percent: u8) {
        if self.is_current(attempt) {
            self.progress.set(percent);
        }
    }

    fn settle(&self, attempt: u64, success: bool) {
        if !self.is_current(attempt) {
            tracing::trace!(key = %self.key, attempt, "ignoring stale fetch response");
            return;
        }

        if success {
            self.progress.set(100);
            self.status.set(LoadStatus::Success);
            tracing::debug!(key = %self.key, "source loaded");
            self.resolve();
            return;
        }

        if self.tries() < self.max_tries {
            tracing::debug!(key = %self.key, tries = self.tries(), "fetch failed, retrying");
            self.start_attempt();
            return;
        }

        self.status.set(LoadStatus::Error);
        tracing::debug!(key = %self.key, tries = self.tries(), "source failed");

        let callbacks = {
            let mut state = self.state.borrow_mut();
            if state.failed {
                Vec::new()
            } else {
                state.failed = true;
                std::mem::take(&mut state.failure_callbacks)
            }
        };
        for callback in callbacks {
            callback();
        }
        self.resolve();
    }

    /// Move every handle to the display source, then notify each one.
    fn resolve(&self) {
        let target = self.display_src().map(str::to_string);
        let handles: Vec<CloneHandle> = self.state.borrow().handles.clone();

        for handle in &handles {
            match self.pool.switch_source(handle.node(), target.as_deref()) {
                Ok(node) => handle.set_node(node),
                Err(error) => tracing::warn!(key = %self.key, %error, "could not switch clone"),
            }
        }

        for handle in &handles {
            // A previous handler may have released this one
            if self.holds(handle) {
                handle.notify(CloneEvent::Change);
            }
        }
    }

    fn holds(&self, handle: &CloneHandle) -> bool {
        self.state.borrow().handles.iter().any(|h| Rc::ptr_eq(h, handle))
    }
}

impl LoadState for ImgSource {
    fn key(&self) -> &SourceKey {
        &self.key
    }

    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn status(&self) -> LoadStatus {
        self.status.get()
    }

    fn progress(&self) -> u8 {
        self.progress.get()
    }

    fn lazy_load(&self) -> bool {
        self.lazy_load
    }

    fn schedule_load(&self) {
        if self.status.get() != LoadStatus::Pending {
            return;
        }
        self.start_attempt();
    }

    fn create_clone(&self, attributes: &AttributeMap, on_change: ChangeHandler) -> Result<CloneHandle, PoolError> {
        let node = self.pool.clone_for(self.display_src(), AttributeSource::Map(attributes))?;
        let mut state = self.state.borrow_mut();
        let id = state.next_handle;
        state.next_handle += 1;
        let handle = Rc::new(CloneHolder::new(id, node, on_change));
        state.handles.push(handle.clone());
        Ok(handle)
    }

    fn release_clone(&self, handle: &CloneHandle) -> Result<(), PoolError> {
        {
            let mut state = self.state.borrow_mut();
            let index = state
                .handles
                .iter()
                .position(|h| Rc::ptr_eq(h, handle))
                .ok_or(PoolError::UnknownHandle(handle.id()))?;
            state.handles.remove(index);
        }
        self.pool.release(handle.node())
    }

    fn discard_clones(&self) {
        let discarded = std::mem::take(&mut self.state.borrow_mut().handles);
        if !discarded.is_empty() {
            tracing::debug!(key = %self.key, count = discarded.len(), "discarded clone handles");
        }
    }

    fn on_first_failure(&self, callback: Box<dyn FnOnce()>) {
        let mut state = self.state.borrow_mut();
        if !state.failed {
            state.failure_callbacks.push(callback);
        }
    }
}

/// Factory producing [`ImgSource`]s that share one fetcher.
pub struct ImgSourceFactory {
    fetcher: Rc<dyn Fetcher>,
}

impl ImgSourceFactory {
    pub fn new(fetcher: Rc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl LoadStateFactory for ImgSourceFactory {
    fn create(&self, src: Option<&str>, rule: &Rule, pool: &Rc<ClonePool>) -> Rc<dyn LoadState> {
        ImgSource::new(src, rule, pool.clone(), self.fetcher.clone())
    }
}
