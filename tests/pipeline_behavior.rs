//! End-to-end behavior of the fetch, pagination, and normalization pipeline.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use oddsfeed_core::{
    normalize_batch, BookmakerId, FetchFuture, FetchStrategy, FetchedAt, FieldMap,
    FieldPath, MarketSelector, OriginThrottle, PageContext, PageWalker, SourceTag, TeamFields,
    TimeEncoding,
};
use oddsfeed_tests::init_tracing;
use serde_json::{json, Value};

/// Serves pre-built pages in order, then empty pages forever.
struct FixtureSource {
    origin: &'static str,
    pages: Mutex<Vec<Vec<Value>>>,
}

impl FixtureSource {
    fn new(origin: &'static str, pages: Vec<Vec<Value>>) -> Self {
        Self {
            origin,
            pages: Mutex::new(pages),
        }
    }
}

impl FetchStrategy for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn origin(&self) -> &str {
        self.origin
    }

    fn fetch<'a>(&'a self, _ctx: PageContext) -> FetchFuture<'a> {
        let batch = {
            let mut pages = self.pages.lock().expect("fixture pages lock");
            if pages.is_empty() {
                Vec::new()
            } else {
                pages.remove(0)
            }
        };
        Box::pin(async move { Ok(batch) })
    }
}

/// Always serves one full page, never terminating on its own.
struct EndlessSource;

impl FetchStrategy for EndlessSource {
    fn name(&self) -> &str {
        "endless"
    }

    fn origin(&self) -> &str {
        "https://endless.test"
    }

    fn fetch<'a>(&'a self, ctx: PageContext) -> FetchFuture<'a> {
        let batch: Vec<Value> = (0..ctx.page_size)
            .map(|i| record(&format!("{}-{}", ctx.page, i), "2.00"))
            .collect();
        Box::pin(async move { Ok(batch) })
    }
}

fn record(id: &str, home_price: &str) -> Value {
    json!({
        "id": id,
        "home": "Gor Mahia",
        "away": "AFC Leopards",
        "time": 1_767_229_200i64,
        "odds": {"h": home_price, "d": "3.40", "a": "4.50"},
    })
}

fn field_map() -> FieldMap {
    FieldMap {
        event_id: Some(FieldPath::new("id")),
        id_digits_only: false,
        teams: TeamFields::Pair {
            home: FieldPath::new("home"),
            away: FieldPath::new("away"),
        },
        league: None,
        country: None,
        sport: None,
        start_time: Some(FieldPath::new("time")),
        time_encoding: TimeEncoding::UnixSeconds,
        market: MarketSelector::Flat {
            home: FieldPath::new("odds.h"),
            draw: Some(FieldPath::new("odds.d")),
            away: FieldPath::new("odds.a"),
            suspended: None,
        },
    }
}

fn tag() -> SourceTag {
    SourceTag {
        bookmaker: BookmakerId::parse("betx").expect("valid id"),
        region: String::from("ke"),
        fetched_at: FetchedAt::parse("2026-02-27T12:00:00Z").expect("valid timestamp"),
    }
}

fn walker(max_pages: u32, page_size: u32) -> PageWalker {
    PageWalker::new(
        Arc::new(OriginThrottle::new()),
        max_pages,
        page_size,
        Duration::from_millis(1),
    )
}

#[tokio::test]
async fn full_then_short_page_collects_both() {
    init_tracing();

    // Given a source with a full page followed by a partial one
    let full: Vec<Value> = (0..100).map(|i| record(&format!("a{i}"), "2.00")).collect();
    let short: Vec<Value> = (0..40).map(|i| record(&format!("b{i}"), "2.00")).collect();
    let source = FixtureSource::new("https://paged.test", vec![full, short]);

    // When the walker collects
    let records = walker(5, 100).collect(&source).await.expect("collects");

    // Then both pages are present and the walk stopped at the short page
    assert_eq!(records.len(), 140);
}

#[tokio::test]
async fn page_cap_bounds_runaway_sources() {
    init_tracing();

    // Given a source that always returns a full page
    // When the walker collects with a cap of 3
    let records = walker(3, 50).collect(&EndlessSource).await.expect("collects");

    // Then exactly cap * page_size records come back
    assert_eq!(records.len(), 150);
}

#[tokio::test]
async fn normalization_is_deterministic_across_runs() {
    init_tracing();

    let records: Vec<Value> = (0..5).map(|i| record(&format!("e{i}"), "2.05")).collect();

    // When the same batch is normalized twice with the same provenance
    let first = normalize_batch(&field_map(), &records, &tag());
    let second = normalize_batch(&field_map(), &records, &tag());

    // Then the outputs are byte-identical
    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
    let first_json = serde_json::to_string(&first).expect("serializes");
    let second_json = serde_json::to_string(&second).expect("serializes");
    assert_eq!(first_json, second_json);
}

#[tokio::test]
async fn invalid_prices_never_reach_the_feed() {
    init_tracing();

    // Given a batch with one clean record and several corrupt ones
    let mut bad_time = record("t1", "2.00");
    bad_time["time"] = json!("soon");
    let records = vec![
        record("ok", "2.05"),
        record("neg", "-1.5"),
        record("nan", "NaN"),
        record("text", "N/A"),
        bad_time,
    ];

    // When the batch is normalized
    let events = normalize_batch(&field_map(), &records, &tag());

    // Then only the clean record survives, with valid prices throughout
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "ok");
    for price in [events[0].odds.home, events[0].odds.draw, events[0].odds.away] {
        let price = price.expect("price present");
        assert!(price.is_finite() && price >= 1.0);
    }
}

#[tokio::test]
async fn zero_draw_is_kept_but_marked_unavailable() {
    init_tracing();

    // Given a record whose draw price is zero
    let mut raw = record("z1", "1.85");
    raw["odds"]["d"] = json!(0);

    // When normalized
    let events = normalize_batch(&field_map(), &[raw], &tag());

    // Then the record survives without a draw and the market is unavailable
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].odds.draw, None);
    assert_eq!(events[0].odds.home, Some(1.85));
    assert!(!events[0].market_available);
    let payload = serde_json::to_string(&events[0]).expect("serializes");
    assert!(!payload.contains("\"draw\""));
}

#[tokio::test]
async fn shared_origin_requests_are_spaced() {
    init_tracing();

    // Given two single-page sources on the same origin and a 60ms interval
    let throttle = Arc::new(OriginThrottle::new());
    let walker = PageWalker::new(Arc::clone(&throttle), 1, 100, Duration::from_millis(60));
    let first = FixtureSource::new("https://shared.test", vec![vec![record("s1", "2.00")]]);
    let second = FixtureSource::new("https://shared.test", vec![vec![record("s2", "2.00")]]);

    // When both are collected back to back
    let started = Instant::now();
    walker.collect(&first).await.expect("collects");
    walker.collect(&second).await.expect("collects");

    // Then the second collection waited out the shared interval
    assert!(started.elapsed() >= Duration::from_millis(50));
}
