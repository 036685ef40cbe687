use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::bookmaker::BookmakerId;
use crate::config::{BookmakerConfig, StrategyPlan};
use crate::domain::{Event, FetchedAt};
use crate::error::CoreError;
use crate::normalize::{normalize_batch, SourceTag};
use crate::pagination::PageWalker;
use crate::throttle::OriginThrottle;
use crate::validate::{classify, RawVerdict};

/// Terminal classification of one strategy attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    EmptyResult,
    Timeout,
    InvalidOutput,
    TransportError,
}

impl RunOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::EmptyResult => "empty_result",
            Self::Timeout => "timeout",
            Self::InvalidOutput => "invalid_output",
            Self::TransportError => "transport_error",
        }
    }
}

impl Display for RunOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened during one strategy attempt, kept for the run report.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub strategy: String,
    pub outcome: RunOutcome,
    pub events_normalized: usize,
    pub latency_ms: u64,
    pub detail: Option<String>,
}

/// Which source ultimately served a bookmaker's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedSource {
    Strategy(String),
    StaticFallback,
}

/// Complete result of one bookmaker's fallback chain run.
#[derive(Debug, Clone)]
pub struct BookmakerRun {
    pub bookmaker: BookmakerId,
    pub events: Vec<Event>,
    pub selected: SelectedSource,
    pub attempts: Vec<AttemptRecord>,
}

impl BookmakerRun {
    /// True when no live strategy produced usable events.
    pub fn exhausted(&self) -> bool {
        self.selected == SelectedSource::StaticFallback
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Pending,
    Trying(usize),
    Succeeded(usize),
    Exhausted,
}

/// Pre-validated events served when every live strategy fails.
#[derive(Debug, Clone, Default)]
pub struct StaticDataset {
    events: Vec<Event>,
}

impl StaticDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a dataset, re-validating every event's prices.
    pub fn from_events(events: Vec<Event>) -> Result<Self, CoreError> {
        for event in &events {
            event.validate()?;
        }
        Ok(Self { events })
    }

    pub fn from_json_str(payload: &str) -> Result<Self, CoreError> {
        let events: Vec<Event> = serde_json::from_str(payload)?;
        Self::from_events(events)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let payload = std::fs::read_to_string(path)?;
        Self::from_json_str(&payload)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Runs a bookmaker's strategies in priority order until one yields usable
/// events, falling back to the static dataset when the chain is exhausted.
///
/// Chain advancement never aborts the run: a timeout, transport failure,
/// empty result, or unrecognizable output each just moves to the next
/// strategy, and every attempt is recorded in the report.
#[derive(Debug, Clone)]
pub struct FallbackChain {
    config: Arc<BookmakerConfig>,
    throttle: Arc<OriginThrottle>,
}

impl FallbackChain {
    pub fn new(config: Arc<BookmakerConfig>, throttle: Arc<OriginThrottle>) -> Self {
        Self { config, throttle }
    }

    pub async fn run(&self) -> BookmakerRun {
        let tag = SourceTag {
            bookmaker: self.config.bookmaker.clone(),
            region: self.config.region.clone(),
            fetched_at: FetchedAt::now(),
        };
        let walker = PageWalker::new(
            Arc::clone(&self.throttle),
            self.config.policy.max_pages,
            self.config.policy.page_size,
            self.config.policy.min_request_interval,
        );

        let mut attempts = Vec::new();
        let mut selected: Option<(usize, Vec<Event>)> = None;
        let mut state = ChainState::Pending;

        while selected.is_none() {
            state = match state {
                ChainState::Pending => ChainState::Trying(0),
                ChainState::Trying(index) if index >= self.config.strategies.len() => {
                    ChainState::Exhausted
                }
                ChainState::Trying(index) => {
                    let plan = &self.config.strategies[index];
                    let attempt = self.attempt(plan, &walker, &tag).await;
                    debug!(
                        bookmaker = self.config.bookmaker.as_str(),
                        strategy = %attempt.record.strategy,
                        outcome = %attempt.record.outcome,
                        latency_ms = attempt.record.latency_ms,
                        "strategy attempt finished"
                    );
                    let usable =
                        attempt.record.outcome == RunOutcome::Success && !attempt.events.is_empty();
                    attempts.push(attempt.record);
                    if usable {
                        selected = Some((index, attempt.events));
                        ChainState::Succeeded(index)
                    } else {
                        ChainState::Trying(index + 1)
                    }
                }
                ChainState::Succeeded(_) | ChainState::Exhausted => break,
            };
            if state == ChainState::Exhausted {
                break;
            }
        }

        match selected {
            Some((index, events)) => BookmakerRun {
                bookmaker: self.config.bookmaker.clone(),
                events,
                selected: SelectedSource::Strategy(
                    self.config.strategies[index].source.name().to_owned(),
                ),
                attempts,
            },
            None => {
                warn!(
                    bookmaker = self.config.bookmaker.as_str(),
                    attempts = attempts.len(),
                    fallback_events = self.config.fallback.len(),
                    "all strategies exhausted, serving static fallback"
                );
                BookmakerRun {
                    bookmaker: self.config.bookmaker.clone(),
                    events: self.config.fallback.events().to_vec(),
                    selected: SelectedSource::StaticFallback,
                    attempts,
                }
            }
        }
    }

    async fn attempt(&self, plan: &StrategyPlan, walker: &PageWalker, tag: &SourceTag) -> Attempt {
        let started = Instant::now();
        let timeout = self.config.policy.attempt_timeout;

        let (outcome, events, detail) =
            match tokio::time::timeout(timeout, walker.collect(plan.source.as_ref())).await {
                Err(_) => (
                    RunOutcome::Timeout,
                    Vec::new(),
                    Some(format!("attempt exceeded {}ms", timeout.as_millis())),
                ),
                Ok(Err(error)) => (
                    RunOutcome::TransportError,
                    Vec::new(),
                    Some(error.message().to_owned()),
                ),
                Ok(Ok(records)) => match classify(&records, &plan.mapping) {
                    RawVerdict::EmptyResult => (RunOutcome::EmptyResult, Vec::new(), None),
                    RawVerdict::InvalidOutput => (
                        RunOutcome::InvalidOutput,
                        Vec::new(),
                        Some(format!("{} unrecognizable records", records.len())),
                    ),
                    RawVerdict::Success => (
                        RunOutcome::Success,
                        normalize_batch(&plan.mapping, &records, tag),
                        None,
                    ),
                },
            };

        Attempt {
            record: AttemptRecord {
                strategy: plan.source.name().to_owned(),
                outcome,
                events_normalized: events.len(),
                latency_ms: elapsed_ms(started),
                detail,
            },
            events,
        }
    }
}

struct Attempt {
    record: AttemptRecord,
    events: Vec<Event>,
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{KickoffTime, Odds, Provenance, Teams};

    fn sample_event(price: f64) -> Event {
        Event {
            id: String::from("1"),
            teams: Teams::new("A", "B").expect("valid teams"),
            league: String::from("Unknown"),
            country: String::from("Unknown"),
            sport: String::from("Unknown"),
            start_time: KickoffTime::parse_canonical("2026-03-01 17:30").expect("valid time"),
            odds: Odds {
                home: Some(price),
                draw: None,
                away: Some(2.0),
            },
            market_available: false,
            source: Provenance {
                bookmaker: BookmakerId::parse("betx").expect("valid id"),
                region: String::from("gh"),
                fetched_at: FetchedAt::parse("2026-02-27T12:00:00Z").expect("valid timestamp"),
            },
        }
    }

    #[test]
    fn static_dataset_rejects_invalid_prices() {
        let result = StaticDataset::from_events(vec![sample_event(0.5)]);
        assert!(result.is_err());
    }

    #[test]
    fn static_dataset_accepts_valid_events() {
        let dataset = StaticDataset::from_events(vec![sample_event(1.5)]).expect("valid dataset");
        assert_eq!(dataset.len(), 1);
    }
}
