//! Rule engine - Per-source load policy.
//!
//! Rules are tried in config order; the first whose glob matches the source
//! wins. A catch-all rule is always appended, so every source has a policy.

use std::time::Duration;

use globset::{GlobBuilder, GlobMatcher};

use crate::config::{Config, RuleConfig, DEFAULT_DELAY_MS};
use crate::error::ConfigError;

/// Pattern of the rule appended after the configured ones.
pub const CATCH_ALL: &str = "*";

/// A compiled rule with every value resolved against the global config.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    matcher: GlobMatcher,
    pub max_tries: u32,
    pub delay: Duration,
    /// Carried for external batching; not used by the crate itself.
    pub batch_size: Option<usize>,
    pub loading_src: Option<String>,
    pub error_src: Option<String>,
    pub lazy_load: bool,
}

impl Rule {
    /// Compile `rule`, filling unset fields from `config`.
    pub fn compile(rule: &RuleConfig, config: &Config) -> Result<Self, ConfigError> {
        let matcher = GlobBuilder::new(&rule.pattern)
            .literal_separator(false)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: rule.pattern.clone(),
                source,
            })?
            .compile_matcher();

        let delay_ms = rule.delay.or(config.delay).unwrap_or(DEFAULT_DELAY_MS);

        Ok(Self {
            pattern: rule.pattern.clone(),
            matcher,
            max_tries: rule.max_tries.unwrap_or(config.max_tries).max(1),
            delay: Duration::from_millis(delay_ms),
            batch_size: rule.batch_size.or(config.batch_size),
            loading_src: rule.loading_src.clone().or_else(|| config.loading_src.clone()),
            error_src: rule.error_src.clone().or_else(|| config.error_src.clone()),
            lazy_load: rule.lazy_load.unwrap_or(config.lazy_load),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if the rule applies to `src` (`""` for an absent source).
    pub fn test(&self, src: Option<&str>) -> bool {
        self.matcher.is_match(src.unwrap_or(""))
    }
}

/// Ordered rules, always ending with the catch-all.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut rules = config
            .rules
            .iter()
            .map(|rule| Rule::compile(rule, config))
            .collect::<Result<Vec<_>, _>>()?;
        rules.push(Rule::compile(&RuleConfig::matching(CATCH_ALL), config)?);
        Ok(Self { rules })
    }

    /// First rule matching `src`.
    pub fn rule_for(&self, src: Option<&str>) -> &Rule {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.test(src))
            .unwrap_or(self.rules.len() - 1);
        &self.rules[index]
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
