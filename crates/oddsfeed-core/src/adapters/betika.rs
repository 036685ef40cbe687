use serde_json::{json, Value};

use crate::config::StrategyPlan;
use crate::fetch::{FetchFuture, FetchStrategy, PageContext};
use crate::mapping::{
    FieldMap, FieldPath, MarketSelector, NestedMarket, OutcomeLabels, TeamFields, TimeEncoding,
};

const ORIGIN: &str = "https://api.betika.com";

// 2026-01-01 00:00:00 UTC.
const KICKOFF_BASE: i64 = 1_767_225_600;

/// Deterministic offline feed serving a fixed Kenyan fixture list.
///
/// Useful as a low-priority strategy in a chain and as a known-good source
/// in tests; it produces the same records on every run without touching the
/// network.
pub struct BetikaSource {
    kickoff_base: i64,
}

impl BetikaSource {
    pub fn new() -> Self {
        Self {
            kickoff_base: KICKOFF_BASE,
        }
    }

    pub fn with_kickoff_base(kickoff_base: i64) -> Self {
        Self { kickoff_base }
    }

    pub fn plan() -> StrategyPlan {
        StrategyPlan::new(std::sync::Arc::new(Self::new()), Self::field_map())
    }

    pub fn field_map() -> FieldMap {
        FieldMap {
            event_id: Some(FieldPath::new("match_id")),
            id_digits_only: false,
            teams: TeamFields::Pair {
                home: FieldPath::new("home.name"),
                away: FieldPath::new("away.name"),
            },
            league: Some(FieldPath::new("competition.name")),
            country: Some(FieldPath::new("competition.category.name")),
            sport: Some(FieldPath::new("sport_name")),
            start_time: Some(FieldPath::new("start_time")),
            time_encoding: TimeEncoding::UnixSeconds,
            market: MarketSelector::Nested(NestedMarket {
                markets: FieldPath::new("markets"),
                select: None,
                outcomes: FieldPath::new("selections"),
                label: FieldPath::new("name"),
                price: FieldPath::new("odd"),
                labels: OutcomeLabels::one_x_two(),
                suspended: None,
            }),
        }
    }

    fn catalog(&self) -> Vec<Value> {
        let base = self.kickoff_base;
        let fixture = |id: &str,
                       home: &str,
                       away: &str,
                       league: &str,
                       offset_hours: i64,
                       prices: [&str; 3]| {
            json!({
                "match_id": id,
                "home": {"name": home},
                "away": {"name": away},
                "competition": {"name": league, "category": {"name": "Kenya"}},
                "sport_name": "Football",
                "start_time": base + offset_hours * 3600,
                "markets": [{
                    "name": "1X2",
                    "selections": [
                        {"name": "1", "odd": prices[0]},
                        {"name": "X", "odd": prices[1]},
                        {"name": "2", "odd": prices[2]},
                    ],
                }],
            })
        };

        vec![
            fixture(
                "BET123456",
                "Gor Mahia",
                "AFC Leopards",
                "FKF Premier League",
                1,
                ["1.85", "3.40", "4.50"],
            ),
            fixture(
                "BET123457",
                "Tusker FC",
                "Kakamega Homeboyz",
                "FKF Premier League",
                3,
                ["2.10", "3.20", "3.60"],
            ),
            fixture(
                "BET123458",
                "Bandari FC",
                "Ulinzi Stars",
                "FKF Premier League",
                5,
                ["1.95", "3.30", "4.10"],
            ),
            fixture(
                "BET123459",
                "Sofapaka",
                "KCB FC",
                "FKF Premier League",
                24,
                ["2.40", "3.10", "3.05"],
            ),
        ]
    }
}

impl Default for BetikaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchStrategy for BetikaSource {
    fn name(&self) -> &str {
        "betika_sample"
    }

    fn origin(&self) -> &str {
        ORIGIN
    }

    fn fetch<'a>(&'a self, ctx: PageContext) -> FetchFuture<'a> {
        let records = if ctx.page == 1 {
            self.catalog()
        } else {
            Vec::new()
        };
        Box::pin(async move { Ok(records) })
    }
}
