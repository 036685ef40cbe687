use std::sync::Arc;

use serde_json::{json, Value};

use crate::adapters::origin_of;
use crate::config::StrategyPlan;
use crate::fetch::{FetchError, FetchFuture, FetchStrategy, PageContext};
use crate::http::{BrowserProfile, HttpClient, HttpRequest};
use crate::mapping::{
    FieldMap, FieldPath, MarketMatch, MarketSelector, NestedMarket, OutcomeLabels, SuspendRule,
    TeamFields, TimeEncoding,
};

const DEFAULT_BASE_URL: &str =
    "https://www.betpawa.com.gh/api/sportsbook/v2/events/lists/by-queries";
const DEFAULT_BRAND: &str = "betpawa-ghana";
const MARKET_1X2: &str = "3743";

/// Query-by-JSON feed. The whole query document travels percent-encoded in
/// the `q` parameter, and the origin rejects anything that does not look
/// like its own web client.
pub struct BetpawaSource {
    http: Arc<dyn HttpClient>,
    base_url: String,
    profile: BrowserProfile,
    origin: String,
}

impl BetpawaSource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL, DEFAULT_BRAND)
    }

    pub fn with_base_url(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        brand: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let origin = origin_of(&base_url);
        let profile = BrowserProfile::desktop_chrome()
            .with_header("x-pawa-brand", brand.into())
            .with_header("x-pawa-language", "en")
            .with_header("devicetype", "web");
        Self {
            http,
            base_url,
            profile,
            origin,
        }
    }

    pub fn plan(http: Arc<dyn HttpClient>) -> StrategyPlan {
        StrategyPlan::new(Arc::new(Self::new(http)), Self::field_map())
    }

    pub fn field_map() -> FieldMap {
        FieldMap {
            event_id: Some(FieldPath::new("id")),
            id_digits_only: false,
            teams: TeamFields::Combined {
                path: FieldPath::new("name"),
                separator: String::from(" - "),
            },
            league: Some(FieldPath::new("competition.name")),
            country: Some(FieldPath::new("region.name")),
            sport: None,
            start_time: Some(FieldPath::new("startTime")),
            time_encoding: TimeEncoding::Rfc3339,
            market: MarketSelector::Nested(NestedMarket {
                markets: FieldPath::new("markets"),
                select: Some(MarketMatch::FieldEquals {
                    field: FieldPath::new("marketType.id"),
                    value: String::from(MARKET_1X2),
                }),
                outcomes: FieldPath::new("prices"),
                label: FieldPath::new("name"),
                price: FieldPath::new("price"),
                labels: OutcomeLabels::one_x_two(),
                suspended: Some(SuspendRule::Equals {
                    field: FieldPath::new("status"),
                    value: String::from("SUSPENDED"),
                }),
            }),
        }
    }

    fn page_url(&self, ctx: PageContext) -> String {
        let query = json!({
            "queries": [{
                "query": {
                    "eventType": "UPCOMING",
                    "categories": [2],
                    "zones": {},
                    "hasOdds": true,
                },
                "view": {"marketTypes": [MARKET_1X2]},
                "skip": ctx.offset(),
                "take": ctx.page_size,
            }]
        });
        format!(
            "{}?q={}",
            self.base_url,
            urlencoding::encode(&query.to_string())
        )
    }

    fn unwrap_events(payload: &Value) -> Vec<Value> {
        payload
            .pointer("/responses/0/responses")
            .and_then(Value::as_array)
            .map(|events| events.to_vec())
            .unwrap_or_default()
    }
}

impl FetchStrategy for BetpawaSource {
    fn name(&self) -> &str {
        "betpawa_upcoming"
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
            Ok(Self::unwrap_events(&payload))
        })
    }
}
