use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::bookmaker::BookmakerId;
use crate::config::BookmakerConfig;
use crate::domain::Event;
use crate::fallback::{BookmakerRun, FallbackChain};
use crate::throttle::OriginThrottle;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Aggregate result of one scraping cycle across all bookmakers.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub events: Vec<Event>,
    pub runs: Vec<BookmakerRun>,
}

impl CycleReport {
    /// Bookmakers whose whole strategy chain failed this cycle.
    pub fn exhausted_bookmakers(&self) -> Vec<BookmakerId> {
        self.runs
            .iter()
            .filter(|run| run.exhausted())
            .map(|run| run.bookmaker.clone())
            .collect()
    }
}

/// Runs every configured bookmaker's fallback chain concurrently, bounded
/// by a semaphore, and merges the results into one report.
///
/// One throttle is shared across all chains so bookmakers hitting the same
/// origin stay within that origin's request spacing.
pub struct Orchestrator {
    configs: Vec<Arc<BookmakerConfig>>,
    throttle: Arc<OriginThrottle>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(configs: Vec<BookmakerConfig>) -> Self {
        Self {
            configs: configs.into_iter().map(Arc::new).collect(),
            throttle: Arc::new(OriginThrottle::new()),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn throttle(&self) -> Arc<OriginThrottle> {
        Arc::clone(&self.throttle)
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for config in &self.configs {
            let config = Arc::clone(config);
            let throttle = Arc::clone(&self.throttle);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("cycle semaphore is never closed");
                FallbackChain::new(config, throttle).run().await
            });
        }

        let mut runs = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(run) => {
                    if run.exhausted() {
                        warn!(
                            bookmaker = run.bookmaker.as_str(),
                            "bookmaker served from static fallback this cycle"
                        );
                    }
                    runs.push(run);
                }
                // A panicking chain must not take down the cycle.
                Err(join_error) => {
                    error!(error = %join_error, "bookmaker chain task failed");
                }
            }
        }

        runs.sort_by(|a, b| a.bookmaker.as_str().cmp(b.bookmaker.as_str()));
        let events: Vec<Event> = runs.iter().flat_map(|run| run.events.clone()).collect();

        info!(
            bookmakers = runs.len(),
            events = events.len(),
            exhausted = runs.iter().filter(|run| run.exhausted()).count(),
            "scrape cycle complete"
        );

        CycleReport { events, runs }
    }
}
