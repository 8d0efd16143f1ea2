//! Site-specific parsing rules
//!
//! A [`SiteRegistry`] maps hostnames to [`SiteStrategy`] objects by
//! case-insensitive substring match. Rules are consulted in registration
//! order and the first match wins.

mod builtin;
mod retailer;

pub use builtin::builtin_rules;
pub use retailer::{ImageSelector, RetailerStrategy, ScriptState, SelectorRule};

use std::fmt;
use std::sync::Arc;

use scraper::Html;

use crate::error::ConfigError;
use crate::extractors::PartialMetadata;

/// Parsing rule for one retailer's page structure.
pub trait SiteStrategy: Send + Sync + fmt::Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Pull whatever the rule knows how to find. Never fails; fields the
    /// rule cannot find stay `None`.
    fn extract(&self, document: &Html) -> PartialMetadata;
}

#[derive(Debug, Clone)]
struct SiteRule {
    patterns: Vec<String>,
    strategy: Arc<dyn SiteStrategy>,
}

/// Ordered hostname → strategy table.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    rules: Vec<SiteRule>,
}

impl SiteRegistry {
    /// An empty registry; every hostname falls through to the generic stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in retailer rules.
    pub fn with_builtin_rules() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.register_rules(builtin_rules())?;
        Ok(registry)
    }

    /// Append a strategy for hostnames containing any of `patterns`.
    pub fn register<I, S>(&mut self, patterns: I, strategy: Arc<dyn SiteStrategy>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self.rules.push(SiteRule { patterns, strategy });
    }

    /// Compile and append declarative selector rules, in order.
    pub fn register_rules(
        &mut self,
        rules: impl IntoIterator<Item = SelectorRule>,
    ) -> Result<(), ConfigError> {
        for rule in rules {
            let patterns = rule.domains.clone();
            let strategy = RetailerStrategy::compile(rule)?;
            self.register(patterns, Arc::new(strategy));
        }
        Ok(())
    }

    /// Strategy for `hostname`, if any rule matches.
    pub fn select(&self, hostname: &str) -> Option<&dyn SiteStrategy> {
        let host = hostname.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| host.contains(p.as_str())))
            .map(|rule| rule.strategy.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
