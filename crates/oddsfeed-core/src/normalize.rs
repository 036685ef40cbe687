use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::bookmaker::BookmakerId;
use crate::domain::{Event, FetchedAt, KickoffTime, Odds, Provenance, Teams};
use crate::mapping::{scalar_string, FieldMap, FieldPath, RawMarket, TimeEncoding};

/// Provenance stamped onto every event produced from one batch.
#[derive(Debug, Clone)]
pub struct SourceTag {
    pub bookmaker: BookmakerId,
    pub region: String,
    pub fetched_at: FetchedAt,
}

/// Normalizes a raw batch, deduplicating by event id (first record wins).
pub fn normalize_batch(map: &FieldMap, records: &[Value], tag: &SourceTag) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut events = Vec::new();
    for record in records {
        let Some(event) = normalize_record(map, record, tag) else {
            continue;
        };
        if !seen.insert(event.id.clone()) {
            debug!(
                bookmaker = tag.bookmaker.as_str(),
                event_id = %event.id,
                "duplicate event id in batch, keeping first"
            );
            continue;
        }
        events.push(event);
    }
    events
}

/// Normalizes one raw record, or drops it.
///
/// A record is dropped when it has no usable team names, no parseable start
/// time, or a present home/away price that cannot be coerced to a valid
/// decimal. A missing price or a suspended market retains the record with
/// the affected odds absent and `market_available` false; a missing or
/// uncoercible draw likewise never drops the record on its own.
pub fn normalize_record(map: &FieldMap, record: &Value, tag: &SourceTag) -> Option<Event> {
    let (home_name, away_name) = map.team_names(record)?;
    let teams = Teams::new(home_name, away_name).ok()?;

    let Some(start_time) = kickoff(map, record) else {
        debug!(
            bookmaker = tag.bookmaker.as_str(),
            teams = %teams.display(),
            "dropping record without parseable start time"
        );
        return None;
    };

    let (odds, market_available) = match map.market.locate(record) {
        Some(market) if market.suspended => (Odds::none(), false),
        Some(market) => price_market(&market, map, tag, &teams)?,
        None => (Odds::none(), false),
    };

    let id = map
        .native_id(record)
        .unwrap_or_else(|| derived_id(&teams, start_time));

    Some(Event {
        id,
        teams,
        league: text_or_unknown(map.league.as_ref(), record),
        country: text_or_unknown(map.country.as_ref(), record),
        sport: text_or_unknown(map.sport.as_ref(), record),
        start_time,
        odds,
        market_available,
        source: Provenance {
            bookmaker: tag.bookmaker.clone(),
            region: tag.region.clone(),
            fetched_at: tag.fetched_at,
        },
    })
}

fn price_market(
    market: &RawMarket,
    map: &FieldMap,
    tag: &SourceTag,
    teams: &Teams,
) -> Option<(Odds, bool)> {
    let home = coerce(market.home.as_ref());
    let away = coerce(market.away.as_ref());

    // Required price present but uncoercible: the record is untrustworthy.
    if market.home.is_some() && home.is_none() || market.away.is_some() && away.is_none() {
        debug!(
            bookmaker = tag.bookmaker.as_str(),
            teams = %teams.display(),
            "dropping record with invalid required price"
        );
        return None;
    }

    let draw = coerce(market.draw.as_ref());
    let available = home.is_some()
        && away.is_some()
        && (!map.market.expects_draw() || draw.is_some());

    Some((Odds { home, draw, away }, available))
}

fn kickoff(map: &FieldMap, record: &Value) -> Option<KickoffTime> {
    let raw = map.start_time.as_ref()?.resolve(record)?;
    match map.time_encoding {
        TimeEncoding::UnixSeconds => KickoffTime::from_unix_seconds(integer_value(raw)?).ok(),
        TimeEncoding::UnixMillis => KickoffTime::from_unix_millis(integer_value(raw)?).ok(),
        TimeEncoding::Rfc3339 => KickoffTime::parse_rfc3339(raw.as_str()?).ok(),
        TimeEncoding::Canonical => KickoffTime::parse_canonical(raw.as_str()?).ok(),
    }
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn coerce(value: Option<&Value>) -> Option<f64> {
    let price = match value? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 1.0).then_some(price)
}

fn text_or_unknown(path: Option<&FieldPath>, record: &Value) -> String {
    path.and_then(|path| path.resolve(record))
        .and_then(|value| scalar_string(value))
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| String::from("Unknown"))
}

/// Content hash standing in for a missing native id. Stable across runs for
/// the same teams and kick-off minute.
fn derived_id(teams: &Teams, start_time: KickoffTime) -> String {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let material = format!(
        "{}|{}|{}",
        teams.home,
        teams.away,
        start_time.format_canonical()
    );
    let mut hash = OFFSET_BASIS;
    for byte in material.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MarketSelector, TeamFields};
    use serde_json::json;

    fn tag() -> SourceTag {
        SourceTag {
            bookmaker: BookmakerId::parse("betx").expect("valid id"),
            region: String::from("ke"),
            fetched_at: FetchedAt::parse("2026-02-27T12:00:00Z").expect("valid timestamp"),
        }
    }

    fn flat_map() -> FieldMap {
        FieldMap {
            event_id: Some(FieldPath::new("id")),
            id_digits_only: false,
            teams: TeamFields::Pair {
                home: FieldPath::new("home"),
                away: FieldPath::new("away"),
            },
            league: Some(FieldPath::new("league")),
            country: Some(FieldPath::new("country")),
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

    fn record() -> Value {
        json!({
            "id": "9001",
            "home": "Gor Mahia",
            "away": "AFC Leopards",
            "league": "Premier League",
            "country": "Kenya",
            "time": 1_767_229_200i64,
            "odds": {"h": "1.85", "d": 3.40, "a": "4.50"},
        })
    }

    #[test]
    fn normalizes_string_and_numeric_prices() {
        let event = normalize_record(&flat_map(), &record(), &tag()).expect("normalizes");
        assert_eq!(event.odds.home, Some(1.85));
        assert_eq!(event.odds.draw, Some(3.40));
        assert_eq!(event.odds.away, Some(4.50));
        assert!(event.market_available);
        assert_eq!(event.sport, "Unknown");
        assert_eq!(event.start_time.format_canonical(), "2026-01-01 01:00");
    }

    #[test]
    fn normalization_is_deterministic() {
        let first = normalize_record(&flat_map(), &record(), &tag()).expect("normalizes");
        let second = normalize_record(&flat_map(), &record(), &tag()).expect("normalizes");
        assert_eq!(first, second);
    }

    #[test]
    fn zero_draw_retains_record_without_draw() {
        let mut raw = record();
        raw["odds"]["d"] = json!(0);
        let event = normalize_record(&flat_map(), &raw, &tag()).expect("normalizes");
        assert_eq!(event.odds.draw, None);
        assert_eq!(event.odds.home, Some(1.85));
        assert!(!event.market_available);
    }

    #[test]
    fn invalid_home_price_drops_record() {
        let mut raw = record();
        raw["odds"]["h"] = json!("N/A");
        assert!(normalize_record(&flat_map(), &raw, &tag()).is_none());
    }

    #[test]
    fn missing_start_time_drops_record() {
        let mut raw = record();
        raw.as_object_mut().expect("object").remove("time");
        assert!(normalize_record(&flat_map(), &raw, &tag()).is_none());
    }

    #[test]
    fn missing_native_id_derives_stable_hash() {
        let mut raw = record();
        raw.as_object_mut().expect("object").remove("id");
        let map = flat_map();
        let first = normalize_record(&map, &raw, &tag()).expect("normalizes");
        let second = normalize_record(&map, &raw, &tag()).expect("normalizes");
        assert_eq!(first.id, second.id);
        assert_eq!(first.id.len(), 16);
        assert_ne!(first.id, "9001");
    }

    #[test]
    fn two_way_market_is_available_without_a_draw() {
        use crate::mapping::{NestedMarket, OutcomeLabels};

        let map = FieldMap {
            market: MarketSelector::Nested(NestedMarket {
                markets: FieldPath::new("markets"),
                select: None,
                outcomes: FieldPath::new("selections"),
                label: FieldPath::new("name"),
                price: FieldPath::new("odd"),
                labels: OutcomeLabels::two_way(),
                suspended: None,
            }),
            ..flat_map()
        };
        let raw = json!({
            "id": "tennis-1",
            "home": "Djokovic",
            "away": "Alcaraz",
            "league": "ATP",
            "country": "Spain",
            "time": 1_767_229_200i64,
            "markets": [{
                "selections": [
                    {"name": "1", "odd": "1.70"},
                    {"name": "2", "odd": "2.10"},
                ],
            }],
        });

        let event = normalize_record(&map, &raw, &tag()).expect("normalizes");
        assert_eq!(event.odds.home, Some(1.70));
        assert_eq!(event.odds.away, Some(2.10));
        assert_eq!(event.odds.draw, None);
        assert!(event.market_available, "no draw expected for two-way markets");
    }

    #[test]
    fn batch_dedupes_by_event_id() {
        let records = vec![record(), record()];
        let events = normalize_batch(&flat_map(), &records, &tag());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn sub_unit_price_is_rejected() {
        let mut raw = record();
        raw["odds"]["h"] = json!(0.95);
        assert!(normalize_record(&flat_map(), &raw, &tag()).is_none());
    }
}
