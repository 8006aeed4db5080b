//! Clone Pool - Recycled image nodes keyed by source.
//!
//! Manages the lifecycle of image clones:
//! - One bare template node per source key, created on first miss
//! - Free list per source key for O(1) reuse
//! - Tracked-attribute metadata per clone
//! - Attribute transplant when a clone is redirected to another source
//!
//! A clone is either *free* (on its free list, parked in the off-screen
//! container) or *checked out* (owned by one caller). Its tracked names always
//! equal the non-`src` attributes applied to it, and release strips them, so
//! every checkout starts from a bare node.
//!
//! # Example
//!
//! ```ignore
//! let pool = ClonePool::new(document, Rc::new(Counters::new()));
//!
//! let mut attributes = AttributeMap::new();
//! attributes.insert("alt".into(), Some("cat".into()));
//!
//! let img = pool.clone_for(Some("cat.png"), AttributeSource::Map(&attributes))?;
//! pool.set_attribute(img, "title", Some("A cat"))?;
//! pool.release(img)?; // bare again, back on the free list
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::dom::{Document, NodeId};
use crate::error::PoolError;
use crate::types::{AttributeMap, SourceKey, SRC_ATTRIBUTE};

use super::stats::{Counters, PoolStats};

// =============================================================================
// Types
// =============================================================================

/// Where a checkout takes its attributes from.
#[derive(Debug, Clone, Copy)]
pub enum AttributeSource<'a> {
    /// Apply every non-`src`, non-`None` entry.
    Map(&'a AttributeMap),
    /// Move the tracked attribute nodes of another checked-out clone.
    TransplantFrom(NodeId),
}

#[derive(Debug, Clone)]
struct CloneMeta {
    key: SourceKey,
    attribute_names: Vec<String>,
    checked_out: bool,
}

#[derive(Default)]
struct PoolState {
    templates: HashMap<SourceKey, NodeId>,
    free_clones: HashMap<SourceKey, VecDeque<NodeId>>,
    meta: HashMap<NodeId, CloneMeta>,
}

impl PoolState {
    fn checked_out_meta(&self, clone: NodeId) -> Result<&CloneMeta, PoolError> {
        let meta = self.meta.get(&clone).ok_or(PoolError::UnknownClone(clone))?;
        if !meta.checked_out {
            return Err(PoolError::NotCheckedOut(clone));
        }
        Ok(meta)
    }
}

// =============================================================================
// Clone Pool
// =============================================================================

/// The clone pool. Construct once and share by `Rc`.
pub struct ClonePool {
    document: Document,
    container: Cell<NodeId>,
    state: RefCell<PoolState>,
    counters: Rc<Counters>,
}

impl ClonePool {
    /// Create a pool manufacturing clones into `document`.
    pub fn new(document: Document, counters: Rc<Counters>) -> Self {
        let container = document.create_element("div");
        Self {
            document,
            container: Cell::new(container),
            state: RefCell::new(PoolState::default()),
            counters,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The off-screen node free clones are parked in.
    pub fn container(&self) -> NodeId {
        self.container.get()
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Check out a clone for `src` and apply `attributes` to it.
    ///
    /// A free clone is reused when one exists, otherwise a new one is
    /// manufactured from the source's template.
    pub fn clone_for(
        &self,
        src: Option<&str>,
        attributes: AttributeSource<'_>,
    ) -> Result<NodeId, PoolError> {
        if let AttributeSource::TransplantFrom(from) = attributes {
            self.state.borrow().checked_out_meta(from)?;
        }

        let key = SourceKey::for_src(src);
        let clone = self.acquire(&key);

        match attributes {
            AttributeSource::Map(map) => self.apply_map(clone, map),
            AttributeSource::TransplantFrom(from) => self.transplant(from, clone),
        }

        if let Some(meta) = self.state.borrow_mut().meta.get_mut(&clone) {
            meta.checked_out = true;
        }
        self.counters.clone_checked_out();
        Ok(clone)
    }

    /// Pop a free clone or manufacture a bare one.
    fn acquire(&self, key: &SourceKey) -> NodeId {
        let mut state = self.state.borrow_mut();

        if let Some(clone) = state.free_clones.get_mut(key).and_then(VecDeque::pop_front) {
            self.counters.free_clone_taken();
            tracing::trace!(%key, ?clone, "reusing free clone");
            return clone;
        }

        let template = self.template(&mut state, key);
        let clone = self
            .document
            .clone_node(template)
            .unwrap_or_else(|| self.document.create_element("img"));
        state.meta.insert(
            clone,
            CloneMeta {
                key: key.clone(),
                attribute_names: Vec::new(),
                checked_out: false,
            },
        );
        self.document.append_child(self.container(), clone);
        tracing::trace!(%key, ?clone, "manufactured clone");
        clone
    }

    /// Get or create the bare template node for `key`.
    fn template(&self, state: &mut PoolState, key: &SourceKey) -> NodeId {
        if let Some(&node) = state.templates.get(key) {
            if self.document.exists(node) {
                return node;
            }
        }
        let node = self.document.create_element("img");
        if !key.is_empty_source() {
            self.document.set_attribute(node, SRC_ATTRIBUTE, key.src());
        }
        state.templates.insert(key.clone(), node);
        node
    }

    fn apply_map(&self, clone: NodeId, map: &AttributeMap) {
        let mut state = self.state.borrow_mut();
        let Some(meta) = state.meta.get_mut(&clone) else { return };
        for (name, value) in map {
            if name == SRC_ATTRIBUTE {
                continue;
            }
            let Some(value) = value else { continue };
            self.document.set_attribute(clone, name, value);
            if !meta.attribute_names.contains(name) {
                meta.attribute_names.push(name.clone());
            }
        }
    }

    /// Move every tracked attribute node of `from` onto `to`.
    fn transplant(&self, from: NodeId, to: NodeId) {
        let mut state = self.state.borrow_mut();
        let names = state
            .meta
            .get_mut(&from)
            .map(|meta| std::mem::take(&mut meta.attribute_names))
            .unwrap_or_default();

        let mut moved = Vec::with_capacity(names.len());
        for name in names {
            if let Some(attr) = self.document.remove_attribute_node(from, &name) {
                self.document.set_attribute_node(to, attr);
                moved.push(name);
            }
        }

        tracing::trace!(?from, ?to, attributes = ?moved, "transplanted attributes");
        if let Some(meta) = state.meta.get_mut(&to) {
            for name in moved {
                if !meta.attribute_names.contains(&name) {
                    meta.attribute_names.push(name);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Release
    // -------------------------------------------------------------------------

    /// Return a checked-out clone to its free list, stripped bare.
    pub fn release(&self, clone: NodeId) -> Result<(), PoolError> {
        let mut state = self.state.borrow_mut();
        state.checked_out_meta(clone)?;

        self.document.append_child(self.container(), clone);

        let Some(meta) = state.meta.get_mut(&clone) else {
            return Err(PoolError::UnknownClone(clone));
        };
        for name in meta.attribute_names.drain(..) {
            self.document.remove_attribute(clone, &name);
        }
        meta.checked_out = false;
        let key = meta.key.clone();

        state.free_clones.entry(key).or_default().push_back(clone);
        self.counters.clone_released();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Attribute Updates
    // -------------------------------------------------------------------------

    /// Update one attribute of a checked-out clone.
    ///
    /// Setting `src` switches the clone to another source; the returned node
    /// is the clone now in place, which differs from `clone` after a switch.
    pub fn set_attribute(
        &self,
        clone: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<NodeId, PoolError> {
        if name == SRC_ATTRIBUTE {
            return self.switch_source(clone, value);
        }

        let mut state = self.state.borrow_mut();
        state.checked_out_meta(clone)?;
        let Some(meta) = state.meta.get_mut(&clone) else {
            return Err(PoolError::UnknownClone(clone));
        };

        let index = meta.attribute_names.iter().position(|n| n == name);
        match (value, index) {
            (None, Some(index)) => {
                meta.attribute_names.remove(index);
                self.document.remove_attribute(clone, name);
            }
            (None, None) => {}
            (Some(value), index) => {
                self.document.set_attribute(clone, name, value);
                if index.is_none() {
                    meta.attribute_names.push(name.to_string());
                }
            }
        }
        Ok(clone)
    }

    /// Replace a checked-out clone by one for `new_src`, carrying its
    /// attributes over.
    ///
    /// No-op when the clone already belongs to `new_src`. Returns the clone
    /// now in place.
    pub fn switch_source(&self, clone: NodeId, new_src: Option<&str>) -> Result<NodeId, PoolError> {
        let current_key = self.state.borrow().checked_out_meta(clone)?.key.clone();
        if current_key == SourceKey::for_src(new_src) {
            return Ok(clone);
        }

        let replacement = self.clone_for(new_src, AttributeSource::TransplantFrom(clone))?;
        if let Some(parent) = self.document.parent(clone) {
            self.document.replace_child(parent, replacement, clone);
        }
        self.release(clone)?;

        tracing::debug!(from = %current_key, to = %SourceKey::for_src(new_src), "switched clone source");
        Ok(replacement)
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Source key a clone belongs to.
    pub fn source_key_of(&self, clone: NodeId) -> Option<SourceKey> {
        self.state.borrow().meta.get(&clone).map(|meta| meta.key.clone())
    }

    /// Tracked attribute names, in tracking order.
    pub fn tracked_attributes(&self, clone: NodeId) -> Vec<String> {
        self.state
            .borrow()
            .meta
            .get(&clone)
            .map(|meta| meta.attribute_names.clone())
            .unwrap_or_default()
    }

    pub fn is_clone(&self, node: NodeId) -> bool {
        self.state.borrow().meta.contains_key(&node)
    }

    pub fn is_checked_out(&self, clone: NodeId) -> bool {
        self.state.borrow().meta.get(&clone).is_some_and(|meta| meta.checked_out)
    }

    /// Number of free clones for `src`.
    pub fn free_count(&self, src: Option<&str>) -> usize {
        self.state
            .borrow()
            .free_clones
            .get(&SourceKey::for_src(src))
            .map_or(0, VecDeque::len)
    }

    /// Number of checked-out clones for `src`.
    pub fn checked_out_count(&self, src: Option<&str>) -> usize {
        let key = SourceKey::for_src(src);
        self.state
            .borrow()
            .meta
            .values()
            .filter(|meta| meta.checked_out && meta.key == key)
            .count()
    }

    /// The template node for `src`, if one was created.
    pub fn template_for(&self, src: Option<&str>) -> Option<NodeId> {
        self.state.borrow().templates.get(&SourceKey::for_src(src)).copied()
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Destroy every clone, template and the container. Checked-out clones are
    /// destroyed too; ids still held for them stop resolving.
    ///
    /// The pool stays usable afterwards with a fresh container.
    pub fn teardown(&self) {
        let mut state = std::mem::take(&mut *self.state.borrow_mut());
        for (clone, _) in state.meta.drain() {
            self.document.destroy_node(clone);
        }
        for (_, template) in state.templates.drain() {
            self.document.destroy_node(template);
        }
        let container = self.container.replace(self.document.create_element("div"));
        self.document.destroy_node(container);
        self.counters.clones_destroyed();
        tracing::debug!("clone pool torn down");
    }
}
