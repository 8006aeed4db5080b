//! Primitive types - Props, callbacks and lifecycle state.

use std::rc::Rc;
use std::time::Duration;

use crate::dom::NodeId;
use crate::types::ImgAttr;

// =============================================================================
// Callback Types
// =============================================================================

/// Load notification callback. Receives the clone node now displayed.
pub type LoadCallback = Rc<dyn Fn(NodeId)>;

// =============================================================================
// Lifecycle
// =============================================================================

/// Where a placeholder is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapState {
    /// Created, not in the document.
    #[default]
    PreRender,
    /// Mounted under a parent.
    InDom,
    /// Teardown in progress.
    Destroying,
    Destroyed,
}

impl WrapState {
    pub fn is_destroyed(self) -> bool {
        matches!(self, Self::Destroying | Self::Destroyed)
    }
}

// =============================================================================
// ImgWrap Props
// =============================================================================

/// Properties for an image placeholder.
///
/// Unset values fall back to the manager's config or the matching rule.
#[derive(Default, Clone)]
pub struct ImgWrapProps {
    pub src: Option<String>,
    /// Wait for the viewport before loading.
    pub lazy_load: Option<bool>,
    pub loading_class: Option<String>,
    pub error_class: Option<String>,
    pub success_class: Option<String>,
    /// Scroll debounce window.
    pub delay: Option<Duration>,
    /// Presentational attributes forwarded to the image.
    pub attributes: Vec<(ImgAttr, String)>,
    pub on_load_success: Option<LoadCallback>,
    pub on_load_error: Option<LoadCallback>,
}

impl ImgWrapProps {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    pub fn attr(mut self, attr: ImgAttr, value: impl Into<String>) -> Self {
        self.attributes.push((attr, value.into()));
        self
    }
}
