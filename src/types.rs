//! Core types for spark-img.
//!
//! These types are shared by the pool, the source registry and the
//! placeholder component. They carry no behavior beyond identity and naming.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

// =============================================================================
// Source Key
// =============================================================================

/// Prefix shared by every source key.
///
/// The absent source maps to the bare prefix, which no real URL can produce.
const KEY_PREFIX: &str = "$$img-manager$$";

/// Normalized identity of an image source.
///
/// Used as the sole identity for pooling, registry lookup and counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceKey(String);

impl SourceKey {
    /// Derive the key for a source string. `None` and `""` share one key.
    pub fn for_src(src: Option<&str>) -> Self {
        Self(format!("{KEY_PREFIX}{}", src.unwrap_or("")))
    }

    /// The reserved key for an absent source.
    pub fn empty() -> Self {
        Self::for_src(None)
    }

    /// Check if this is the reserved key for an absent source.
    pub fn is_empty_source(&self) -> bool {
        self.0.len() == KEY_PREFIX.len()
    }

    /// The source string this key was derived from (`""` for absent sources).
    pub fn src(&self) -> &str {
        &self.0[KEY_PREFIX.len()..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Ordered name → value map handed to a checkout.
///
/// `None` values are skipped when applied, so a snapshot of unset
/// attributes can be passed as-is.
pub type AttributeMap = IndexMap<String, Option<String>>;

/// The attribute carrying the image source. Never tracked on a clone.
pub const SRC_ATTRIBUTE: &str = "src";

/// Presentational attributes a placeholder forwards to its clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImgAttr {
    Id,
    Title,
    Align,
    Alt,
    Border,
    Height,
    Hspace,
    Ismap,
    Longdesc,
    Name,
    Width,
    Usemap,
    Vspace,
}

/// Every presentational attribute, in forwarding order.
pub const IMG_ATTRIBUTES: [ImgAttr; 13] = [
    ImgAttr::Id,
    ImgAttr::Title,
    ImgAttr::Align,
    ImgAttr::Alt,
    ImgAttr::Border,
    ImgAttr::Height,
    ImgAttr::Hspace,
    ImgAttr::Ismap,
    ImgAttr::Longdesc,
    ImgAttr::Name,
    ImgAttr::Width,
    ImgAttr::Usemap,
    ImgAttr::Vspace,
];

impl ImgAttr {
    /// The DOM attribute name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Align => "align",
            Self::Alt => "alt",
            Self::Border => "border",
            Self::Height => "height",
            Self::Hspace => "hspace",
            Self::Ismap => "ismap",
            Self::Longdesc => "longdesc",
            Self::Name => "name",
            Self::Width => "width",
            Self::Usemap => "usemap",
            Self::Vspace => "vspace",
        }
    }

    /// Position in [`IMG_ATTRIBUTES`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up an attribute by DOM name.
    pub fn from_name(name: &str) -> Option<Self> {
        IMG_ATTRIBUTES.iter().copied().find(|attr| attr.name() == name)
    }
}

impl fmt::Display for ImgAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Load Status
// =============================================================================

/// Tri-state load status plus the undetermined state before any load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LoadStatus {
    /// No load attempted yet. None of the three flags is set.
    #[default]
    Pending,
    Loading,
    Error,
    Success,
}

impl LoadStatus {
    pub fn is_loading(self) -> bool {
        self == Self::Loading
    }

    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Whether a load has finished, successfully or not.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Error | Self::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_key_absent_and_empty_match() {
        assert_eq!(SourceKey::for_src(None), SourceKey::for_src(Some("")));
        assert!(SourceKey::empty().is_empty_source());
    }

    #[test]
    fn test_source_key_distinct_from_urls() {
        let empty = SourceKey::empty();
        let real = SourceKey::for_src(Some("a.png"));
        assert_ne!(empty, real);
        assert!(!real.is_empty_source());
        assert_eq!(real.src(), "a.png");
    }

    #[test]
    fn test_attribute_table_round_trips_names() {
        for (i, attr) in IMG_ATTRIBUTES.iter().enumerate() {
            assert_eq!(attr.index(), i);
            assert_eq!(ImgAttr::from_name(attr.name()), Some(*attr));
        }
        assert_eq!(ImgAttr::from_name("src"), None);
    }

    #[test]
    fn test_load_status_flags_exclusive() {
        assert!(!LoadStatus::Pending.is_loading());
        assert!(!LoadStatus::Pending.is_resolved());
        assert!(LoadStatus::Error.is_resolved());
        assert!(LoadStatus::Success.is_success() && !LoadStatus::Success.is_error());
    }
}
