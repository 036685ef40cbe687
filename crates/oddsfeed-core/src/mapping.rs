use serde_json::Value;

/// Dot-separated path into a JSON document. Numeric segments index arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in self.0.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

/// How team names appear in a source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamFields {
    /// Separate home and away fields.
    Pair { home: FieldPath, away: FieldPath },
    /// One combined field such as `"Arsenal - Chelsea"`.
    Combined { path: FieldPath, separator: String },
}

/// Predicate selecting the 1X2 market among a record's markets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketMatch {
    FieldEquals { field: FieldPath, value: String },
    NameContains { field: FieldPath, needle: String },
}

impl MarketMatch {
    pub fn matches(&self, market: &Value) -> bool {
        match self {
            Self::FieldEquals { field, value } => field
                .resolve(market)
                .and_then(scalar_string)
                .is_some_and(|found| found == *value),
            Self::NameContains { field, needle } => field
                .resolve(market)
                .and_then(scalar_string)
                .is_some_and(|found| {
                    found.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
                }),
        }
    }
}

/// How a source marks a market as suspended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspendRule {
    /// Field present with a truthy value.
    Truthy(FieldPath),
    Equals { field: FieldPath, value: String },
}

impl SuspendRule {
    pub fn matches(&self, market: &Value) -> bool {
        match self {
            Self::Truthy(path) => match path.resolve(market) {
                None | Some(Value::Null) => false,
                Some(Value::Bool(flag)) => *flag,
                Some(Value::String(text)) => !text.trim().is_empty(),
                Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
                Some(_) => true,
            },
            Self::Equals { field, value } => field
                .resolve(market)
                .and_then(scalar_string)
                .is_some_and(|found| found == *value),
        }
    }
}

/// Outcome labels as the source spells them. `draw` is absent for two-way
/// markets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeLabels {
    pub home: String,
    pub draw: Option<String>,
    pub away: String,
}

impl OutcomeLabels {
    pub fn home_draw_away() -> Self {
        Self {
            home: String::from("home"),
            draw: Some(String::from("draw")),
            away: String::from("away"),
        }
    }

    pub fn one_x_two() -> Self {
        Self {
            home: String::from("1"),
            draw: Some(String::from("X")),
            away: String::from("2"),
        }
    }

    pub fn two_way() -> Self {
        Self {
            home: String::from("1"),
            draw: None,
            away: String::from("2"),
        }
    }
}

/// Market layout where outcomes live in a labeled array under a markets list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedMarket {
    /// Path to the markets array within the record.
    pub markets: FieldPath,
    /// Predicate choosing the market; `None` takes the first one.
    pub select: Option<MarketMatch>,
    /// Path to the outcomes array within the chosen market.
    pub outcomes: FieldPath,
    /// Field within one outcome holding its label.
    pub label: FieldPath,
    /// Field within one outcome holding its price.
    pub price: FieldPath,
    pub labels: OutcomeLabels,
    pub suspended: Option<SuspendRule>,
}

impl NestedMarket {
    fn locate(&self, record: &Value) -> Option<RawMarket> {
        let markets = self.markets.resolve(record)?.as_array()?;
        let market = match &self.select {
            Some(predicate) => markets.iter().find(|candidate| predicate.matches(candidate))?,
            None => markets.first()?,
        };

        let suspended = self
            .suspended
            .as_ref()
            .is_some_and(|rule| rule.matches(market));

        let mut raw = RawMarket {
            suspended,
            ..RawMarket::default()
        };
        if let Some(outcomes) = self.outcomes.resolve(market).and_then(Value::as_array) {
            for outcome in outcomes {
                let Some(label) = self.label.resolve(outcome).and_then(scalar_string) else {
                    continue;
                };
                let price = self.price.resolve(outcome).cloned();
                if label.eq_ignore_ascii_case(&self.labels.home) {
                    raw.home = price;
                } else if label.eq_ignore_ascii_case(&self.labels.away) {
                    raw.away = price;
                } else if self
                    .labels
                    .draw
                    .as_ref()
                    .is_some_and(|draw| label.eq_ignore_ascii_case(draw))
                {
                    raw.draw = price;
                }
            }
        }
        Some(raw)
    }
}

/// Where the 1X2 prices live in a source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketSelector {
    Nested(NestedMarket),
    /// Prices directly addressable as record fields.
    Flat {
        home: FieldPath,
        draw: Option<FieldPath>,
        away: FieldPath,
        suspended: Option<SuspendRule>,
    },
}

impl MarketSelector {
    /// Extracts the raw market, or `None` when the record has no trace of
    /// the market at all.
    pub fn locate(&self, record: &Value) -> Option<RawMarket> {
        match self {
            Self::Nested(nested) => nested.locate(record),
            Self::Flat {
                home,
                draw,
                away,
                suspended,
            } => {
                let raw = RawMarket {
                    home: home.resolve(record).cloned(),
                    draw: draw.as_ref().and_then(|path| path.resolve(record)).cloned(),
                    away: away.resolve(record).cloned(),
                    suspended: suspended.as_ref().is_some_and(|rule| rule.matches(record)),
                };
                if raw.home.is_none() && raw.away.is_none() && !raw.suspended {
                    None
                } else {
                    Some(raw)
                }
            }
        }
    }

    /// True when the configured market includes a draw outcome.
    pub fn expects_draw(&self) -> bool {
        match self {
            Self::Nested(nested) => nested.labels.draw.is_some(),
            Self::Flat { draw, .. } => draw.is_some(),
        }
    }
}

/// Prices lifted out of a record before coercion. Values stay raw JSON so
/// the normalizer can distinguish absent from uncoercible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMarket {
    pub home: Option<Value>,
    pub draw: Option<Value>,
    pub away: Option<Value>,
    pub suspended: bool,
}

/// Which encoding a source uses for kick-off times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    UnixSeconds,
    UnixMillis,
    Rfc3339,
    /// Already in the canonical `YYYY-MM-DD HH:MM` form.
    Canonical,
}

/// Declarative description of one source's record shape.
///
/// A field map is data, not code: adding a bookmaker whose payload differs
/// only in field names needs a new map, not a new normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    pub event_id: Option<FieldPath>,
    /// Strip non-digit characters from the native id, for prefixed ids like
    /// `sr:match:50850679`.
    pub id_digits_only: bool,
    pub teams: TeamFields,
    pub league: Option<FieldPath>,
    pub country: Option<FieldPath>,
    pub sport: Option<FieldPath>,
    pub start_time: Option<FieldPath>,
    pub time_encoding: TimeEncoding,
    pub market: MarketSelector,
}

impl FieldMap {
    pub fn team_names(&self, record: &Value) -> Option<(String, String)> {
        match &self.teams {
            TeamFields::Pair { home, away } => {
                let home = string_at(home, record)?;
                let away = string_at(away, record)?;
                Some((home, away))
            }
            TeamFields::Combined { path, separator } => {
                let combined = string_at(path, record)?;
                let (home, away) = combined.split_once(separator.as_str())?;
                let home = home.trim();
                let away = away.trim();
                if home.is_empty() || away.is_empty() {
                    None
                } else {
                    Some((home.to_owned(), away.to_owned()))
                }
            }
        }
    }

    pub fn native_id(&self, record: &Value) -> Option<String> {
        let path = self.event_id.as_ref()?;
        let id = path.resolve(record).and_then(scalar_string)?;
        let id = if self.id_digits_only {
            id.chars().filter(char::is_ascii_digit).collect()
        } else {
            id.trim().to_owned()
        };
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// True when the record carries any recognizable trace of this source's
    /// shape: an identity plus a locatable market with a price or a
    /// suspension flag.
    pub fn has_signal(&self, record: &Value) -> bool {
        if !record.is_object() {
            return false;
        }
        let identified = self.team_names(record).is_some() || self.native_id(record).is_some();
        if !identified {
            return false;
        }
        self.market.locate(record).is_some_and(|market| {
            market.home.is_some() || market.draw.is_some() || market.away.is_some() || market.suspended
        })
    }
}

pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn string_at(path: &FieldPath, record: &Value) -> Option<String> {
    path.resolve(record)
        .and_then(scalar_string)
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
