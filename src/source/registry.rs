//! Source registry - One load state per source key.
//!
//! Sources are created on first lookup and never removed. Creation bumps the
//! source counter and subscribes the error counter to the source's first
//! failure.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::{ClonePool, Counters};
use crate::types::SourceKey;

use super::{LoadState, LoadStateFactory, RuleSet};

pub struct SourceRegistry {
    pool: Rc<ClonePool>,
    rules: Rc<RuleSet>,
    factory: Rc<dyn LoadStateFactory>,
    counters: Rc<Counters>,
    sources: RefCell<HashMap<SourceKey, Rc<dyn LoadState>>>,
}

impl SourceRegistry {
    pub fn new(
        pool: Rc<ClonePool>,
        rules: Rc<RuleSet>,
        factory: Rc<dyn LoadStateFactory>,
        counters: Rc<Counters>,
    ) -> Self {
        Self {
            pool,
            rules,
            factory,
            counters,
            sources: RefCell::new(HashMap::new()),
        }
    }

    /// Get or create the load state for `src`.
    pub fn source_for_src(&self, src: Option<&str>) -> Rc<dyn LoadState> {
        let key = SourceKey::for_src(src);
        if let Some(source) = self.sources.borrow().get(&key) {
            return source.clone();
        }

        let rule = self.rules.rule_for(src);
        let source = self.factory.create(src, rule, &self.pool);

        self.sources.borrow_mut().insert(key.clone(), source.clone());
        self.counters.source_created();

        let counters = self.counters.clone();
        source.on_first_failure(Box::new(move || counters.source_failed()));

        tracing::debug!(%key, rule = rule.pattern(), "created source");
        source
    }

    /// Existing load state for `src`, without creating one.
    pub fn get(&self, src: Option<&str>) -> Option<Rc<dyn LoadState>> {
        self.sources.borrow().get(&SourceKey::for_src(src)).cloned()
    }

    /// Drop every source's clone handles. Sources themselves stay.
    pub fn discard_clones(&self) {
        let sources: Vec<Rc<dyn LoadState>> = self.sources.borrow().values().cloned().collect();
        for source in sources {
            source.discard_clones();
        }
    }

    pub fn len(&self) -> usize {
        self.sources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dom::Document;
    use crate::source::{FetchRequest, Fetcher, ImgSourceFactory};
    use taffy::geometry::Size;

    struct Failing;
    impl Fetcher for Failing {
        fn fetch(&self, request: FetchRequest) {
            request.responder.fail();
            request.responder.fail();
        }
    }

    fn setup() -> (SourceRegistry, Rc<Counters>) {
        let counters = Rc::new(Counters::new());
        let document = Document::new(Size { width: 800.0, height: 600.0 });
        let pool = Rc::new(ClonePool::new(document, counters.clone()));
        let rules = Rc::new(RuleSet::from_config(&Config::default()).unwrap());
        let factory = Rc::new(ImgSourceFactory::new(Rc::new(Failing)));
        (SourceRegistry::new(pool, rules, factory, counters.clone()), counters)
    }

    #[test]
    fn test_one_source_per_key() {
        let (registry, counters) = setup();

        let a = registry.source_for_src(Some("a.png"));
        let again = registry.source_for_src(Some("a.png"));
        let b = registry.source_for_src(Some("b.png"));

        assert!(Rc::ptr_eq(&a, &again));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
        assert_eq!(counters.snapshot().total_sources, 2);
    }

    #[test]
    fn test_absent_and_empty_share_key() {
        let (registry, _) = setup();

        let absent = registry.source_for_src(None);
        let empty = registry.source_for_src(Some(""));
        assert!(Rc::ptr_eq(&absent, &empty));
        assert!(registry.get(Some("a.png")).is_none());
    }

    #[test]
    fn test_failures_counted_per_source() {
        let (registry, counters) = setup();

        let a = registry.source_for_src(Some("a.png"));
        a.schedule_load();
        a.schedule_load();
        registry.source_for_src(Some("b.png")).schedule_load();

        assert!(a.is_error());
        assert_eq!(counters.snapshot().total_errors, 2);
    }
}
