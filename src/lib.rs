//! # spark-img
//!
//! Lazy image loading for scrollable view hierarchies.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! reactive load status and [taffy](https://github.com/DioxusLabs/taffy) for
//! placeholder geometry.
//!
//! ## Architecture
//!
//! Image nodes are pooled per source. A placeholder borrows one clone from
//! the pool and gives it back when its source changes or it is torn down, so
//! the number of live image nodes tracks the number of placeholders, not
//! the number of renders. Fetching is deferred until the placeholder is
//! fully inside the viewport:
//!
//! ```text
//! ImgWrap → SourceRegistry → LoadState::create_clone → ClonePool checkout
//!        ↘ ViewportDetector ─(visible)→ LoadState::schedule_load → Fetcher
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Source keys, attribute table, load status
//! - [`dom`] - In-memory element tree with attribute nodes
//! - [`layout`] - Taffy layout for the element tree
//! - [`runtime`] - Scheduler, global events, host bundle
//! - [`engine`] - Clone pool and counters
//! - [`source`] - Load states, registry, rules
//! - [`state`] - Viewport detection
//! - [`primitives`] - The `ImgWrap` placeholder
//! - [`manager`] - The `ImgManager` service
//! - [`config`] - TOML configuration

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod layout;
pub mod manager;
pub mod primitives;
pub mod runtime;
pub mod source;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{Config, RuleConfig};
pub use dom::{Document, NodeId};
pub use engine::{AttributeSource, ClonePool, PoolStats};
pub use error::{ConfigError, Error, PoolError, Result};
pub use manager::ImgManager;
pub use primitives::{ImgWrap, ImgWrapProps, LoadCallback, WrapState};
pub use runtime::{EventHub, GlobalEvent, Runtime, Scheduler};
pub use source::{
    CloneEvent, CloneHandle, FetchRequest, FetchResponder, Fetcher, ImgSource, ImgSourceFactory,
    LoadState, LoadStateFactory, Rule, RuleSet, SourceRegistry,
};
pub use state::{ViewportDetector, Visibility};
