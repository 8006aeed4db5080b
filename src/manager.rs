//! ImgManager - The image manager service.
//!
//! Owns everything placeholders share: the configuration, the compiled rules,
//! the clone pool, the source registry and the counters. Create one per
//! document and hand it to placeholders by `Rc`.
//!
//! # Example
//!
//! ```ignore
//! let manager = Rc::new(ImgManager::from_file("img-manager.toml", runtime.document.clone(), fetcher)?);
//!
//! let source = manager.source_for_src(Some("cat.png"));
//! println!("{:?}", manager.stats());
//! ```

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crate::config::Config;
use crate::dom::Document;
use crate::engine::{ClonePool, Counters, PoolStats};
use crate::error::{ConfigError, Result};
use crate::source::{Fetcher, ImgSourceFactory, LoadState, LoadStateFactory, Rule, RuleSet, SourceRegistry};

pub struct ImgManager {
    config: Config,
    rules: Rc<RuleSet>,
    pool: Rc<ClonePool>,
    sources: SourceRegistry,
    counters: Rc<Counters>,
}

impl ImgManager {
    /// Create a manager whose sources are built by `factory`.
    pub fn new(config: Config, document: Document, factory: Rc<dyn LoadStateFactory>) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = Rc::new(RuleSet::from_config(&config)?);
        let counters = Rc::new(Counters::new());
        let pool = Rc::new(ClonePool::new(document, counters.clone()));
        let sources = SourceRegistry::new(pool.clone(), rules.clone(), factory, counters.clone());

        tracing::debug!(rules = rules.len(), "image manager created");
        Ok(Self {
            config,
            rules,
            pool,
            sources,
            counters,
        })
    }

    /// Create a manager using [`ImgSource`](crate::source::ImgSource)s backed by `fetcher`.
    pub fn with_fetcher(config: Config, document: Document, fetcher: Rc<dyn Fetcher>) -> Result<Self, ConfigError> {
        Self::new(config, document, Rc::new(ImgSourceFactory::new(fetcher)))
    }

    /// Load the TOML config at `path` and create a fetcher-backed manager.
    pub fn from_file(path: impl AsRef<Path>, document: Document, fetcher: Rc<dyn Fetcher>) -> Result<Self> {
        let config = Config::load(path)?;
        Ok(Self::with_fetcher(config, document, fetcher)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &Rc<ClonePool> {
        &self.pool
    }

    pub fn document(&self) -> &Document {
        self.pool.document()
    }

    pub fn default_loading_class(&self) -> &str {
        &self.config.loading_class
    }

    pub fn default_error_class(&self) -> &str {
        &self.config.error_class
    }

    pub fn default_success_class(&self) -> &str {
        &self.config.success_class
    }

    pub fn default_delay(&self) -> Option<Duration> {
        self.config.delay.map(Duration::from_millis)
    }

    pub fn default_batch_size(&self) -> Option<usize> {
        self.config.batch_size
    }

    pub fn default_max_tries(&self) -> u32 {
        self.config.max_tries
    }

    /// Get or create the load state for `src`.
    pub fn source_for_src(&self, src: Option<&str>) -> Rc<dyn LoadState> {
        self.sources.source_for_src(src)
    }

    /// First rule matching `src`.
    pub fn rule_for_src(&self, src: Option<&str>) -> &Rule {
        self.rules.rule_for(src)
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Destroy every pooled clone. Sources are kept, without their handles.
    pub fn teardown(&self) {
        self.pool.teardown();
        self.sources.discard_clones();
    }
}
