//! Core engine for the oddsfeed scraping platform.
//!
//! What lives here:
//! - canonical event domain types with a single textual kick-off form
//! - the fetch strategy contract every bookmaker integration implements
//! - declarative field maps that turn raw payloads into canonical events
//! - per-origin request throttling shared across the whole process
//! - a pagination driver with empty-page, short-page, and cap stops
//! - a fallback chain that tries strategies in order and serves a static
//!   dataset when all of them fail
//! - an orchestrator running every bookmaker's chain concurrently

pub mod adapters;
pub mod bookmaker;
pub mod config;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod http;
pub mod mapping;
pub mod normalize;
pub mod orchestrator;
pub mod pagination;
pub mod throttle;
pub mod validate;

pub use adapters::{BetikaSource, BetpawaSource, SportybetSource};
pub use bookmaker::BookmakerId;
pub use config::{BookmakerConfig, ScrapePolicy, StrategyPlan};
pub use domain::{validate_price, Event, FetchedAt, KickoffTime, Odds, Provenance, Teams};
pub use error::{CoreError, ValidationError};
pub use fallback::{
    AttemptRecord, BookmakerRun, FallbackChain, RunOutcome, SelectedSource, StaticDataset,
};
pub use fetch::{FetchError, FetchFuture, FetchStrategy, PageContext};
pub use http::{
    BrowserProfile, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use mapping::{
    FieldMap, FieldPath, MarketMatch, MarketSelector, NestedMarket, OutcomeLabels, RawMarket,
    SuspendRule, TeamFields, TimeEncoding,
};
pub use normalize::{normalize_batch, normalize_record, SourceTag};
pub use orchestrator::{CycleReport, Orchestrator, DEFAULT_CONCURRENCY};
pub use pagination::PageWalker;
pub use throttle::OriginThrottle;
pub use validate::{classify, RawVerdict};
