use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;

use crate::adapters::origin_of;
use crate::config::StrategyPlan;
use crate::fetch::{FetchError, FetchFuture, FetchStrategy, PageContext};
use crate::http::{BrowserProfile, HttpClient, HttpRequest};
use crate::mapping::{
    FieldMap, FieldPath, MarketMatch, MarketSelector, NestedMarket, OutcomeLabels, SuspendRule,
    TeamFields, TimeEncoding,
};

const DEFAULT_BASE_URL: &str = "https://www.sportybet.com/api/gh/factsCenter/pcUpcomingEvents";
const FOOTBALL_SPORT_ID: &str = "sr:sport:1";

/// Upcoming-events feed. Pages with `pageNum`/`pageSize` and buries events
/// inside a tournament grouping that gets flattened here.
pub struct SportybetSource {
    http: Arc<dyn HttpClient>,
    base_url: String,
    profile: BrowserProfile,
    origin: String,
}

impl SportybetSource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let origin = origin_of(&base_url);
        Self {
            http,
            base_url,
            profile: BrowserProfile::minimal(),
            origin,
        }
    }

    pub fn plan(http: Arc<dyn HttpClient>) -> StrategyPlan {
        StrategyPlan::new(Arc::new(Self::new(http)), Self::field_map())
    }

    pub fn field_map() -> FieldMap {
        FieldMap {
            event_id: Some(FieldPath::new("eventId")),
            id_digits_only: true,
            teams: TeamFields::Pair {
                home: FieldPath::new("homeTeamName"),
                away: FieldPath::new("awayTeamName"),
            },
            league: Some(FieldPath::new("tournament.name")),
            country: Some(FieldPath::new("sport.category.name")),
            sport: Some(FieldPath::new("sport.name")),
            start_time: Some(FieldPath::new("estimateStartTime")),
            time_encoding: TimeEncoding::UnixMillis,
            market: MarketSelector::Nested(NestedMarket {
                markets: FieldPath::new("markets"),
                select: Some(MarketMatch::FieldEquals {
                    field: FieldPath::new("id"),
                    value: String::from("1"),
                }),
                outcomes: FieldPath::new("outcomes"),
                label: FieldPath::new("desc"),
                price: FieldPath::new("odds"),
                labels: OutcomeLabels::home_draw_away(),
                suspended: Some(SuspendRule::Truthy(FieldPath::new("suspendedReason"))),
            }),
        }
    }

    fn page_url(&self, ctx: PageContext) -> String {
        // The _t parameter busts the CDN cache the way the web client does.
        let cache_bust = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        format!(
            "{}?sportId={}&marketId=1&pageSize={}&pageNum={}&_t={}",
            self.base_url,
            urlencoding::encode(FOOTBALL_SPORT_ID),
            ctx.page_size,
            ctx.page,
            cache_bust
        )
    }

    /// Unwraps `data.tournaments[].events[]`, copying the tournament name
    /// onto each event so the field map can reach it.
    fn flatten_tournaments(payload: &Value) -> Vec<Value> {
        let Some(tournaments) = payload
            .pointer("/data/tournaments")
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for tournament in tournaments {
            let Some(events) = tournament.get("events").and_then(Value::as_array) else {
                continue;
            };
            for event in events {
                let mut record = event.clone();
                if record.get("tournament").is_none() {
                    if let (Value::Object(map), Some(name)) = (&mut record, tournament.get("name"))
                    {
                        map.insert(
                            String::from("tournament"),
                            serde_json::json!({"name": name}),
                        );
                    }
                }
                records.push(record);
            }
        }
        records
    }
}

impl FetchStrategy for SportybetSource {
    fn name(&self) -> &str {
        "sportybet_upcoming"
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn fetch<'a>(&'a self, ctx: PageContext) -> FetchFuture<'a> {
        Box::pin(async move {
            let request = self.profile.apply(HttpRequest::get(self.page_url(ctx)));
            let response = self
                .http
                .execute(request)
                .await
                .map_err(|error| FetchError::transport(error.message().to_owned()))?;

            if !response.is_success() {
                return Err(FetchError::transport(format!(
                    "upstream returned status {}",
                    response.status
                )));
            }

            let payload = response
                .json()
                .map_err(|error| FetchError::transport(error.message().to_owned()))?;
            Ok(Self::flatten_tournaments(&payload))
        })
    }
}
