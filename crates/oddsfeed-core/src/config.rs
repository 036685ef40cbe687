use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::bookmaker::BookmakerId;
use crate::fallback::StaticDataset;
use crate::fetch::FetchStrategy;
use crate::mapping::FieldMap;

/// Runtime limits applied to every strategy attempt for a bookmaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapePolicy {
    /// Budget for one whole strategy attempt including all its pages.
    pub attempt_timeout: Duration,
    pub max_pages: u32,
    pub page_size: u32,
    /// Minimum spacing between requests to one origin.
    pub min_request_interval: Duration,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(5),
            max_pages: 5,
            page_size: 100,
            min_request_interval: Duration::from_millis(1000),
        }
    }
}

impl ScrapePolicy {
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_min_request_interval(mut self, min_request_interval: Duration) -> Self {
        self.min_request_interval = min_request_interval;
        self
    }
}

/// One fetch strategy paired with the field map describing its output.
#[derive(Clone)]
pub struct StrategyPlan {
    pub source: Arc<dyn FetchStrategy>,
    pub mapping: FieldMap,
}

impl StrategyPlan {
    pub fn new(source: Arc<dyn FetchStrategy>, mapping: FieldMap) -> Self {
        Self { source, mapping }
    }
}

impl fmt::Debug for StrategyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyPlan")
            .field("source", &self.source.name())
            .field("mapping", &self.mapping)
            .finish()
    }
}

/// Everything needed to produce one bookmaker's events: an ordered strategy
/// chain, runtime limits, and the static dataset of last resort.
#[derive(Debug, Clone)]
pub struct BookmakerConfig {
    pub bookmaker: BookmakerId,
    pub region: String,
    pub strategies: Vec<StrategyPlan>,
    pub policy: ScrapePolicy,
    pub fallback: StaticDataset,
}

impl BookmakerConfig {
    pub fn new(bookmaker: BookmakerId, region: impl Into<String>) -> Self {
        Self {
            bookmaker,
            region: region.into(),
            strategies: Vec::new(),
            policy: ScrapePolicy::default(),
            fallback: StaticDataset::empty(),
        }
    }

    pub fn with_strategy(mut self, plan: StrategyPlan) -> Self {
        self.strategies.push(plan);
        self
    }

    pub fn with_policy(mut self, policy: ScrapePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fallback(mut self, fallback: StaticDataset) -> Self {
        self.fallback = fallback;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults_are_conservative() {
        let policy = ScrapePolicy::default();
        assert_eq!(policy.attempt_timeout, Duration::from_secs(5));
        assert_eq!(policy.max_pages, 5);
        assert_eq!(policy.page_size, 100);
        assert_eq!(policy.min_request_interval, Duration::from_millis(1000));
    }

    #[test]
    fn config_starts_with_empty_chain() {
        let config = BookmakerConfig::new(
            BookmakerId::parse("betx").expect("valid id"),
            "gh",
        );
        assert!(config.strategies.is_empty());
        assert!(config.fallback.is_empty());
    }
}
