use serde::{Deserialize, Serialize};

use crate::bookmaker::BookmakerId;
use crate::domain::clock::{FetchedAt, KickoffTime};
use crate::ValidationError;

/// Structured home/away team pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teams {
    pub home: String,
    pub away: String,
}

impl Teams {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Result<Self, ValidationError> {
        let home = home.into();
        let away = away.into();
        if home.trim().is_empty() || away.trim().is_empty() {
            return Err(ValidationError::EmptyTeam);
        }
        Ok(Self {
            home: home.trim().to_owned(),
            away: away.trim().to_owned(),
        })
    }

    /// Display string used by downstream matching, `"Home vs Away"`.
    pub fn display(&self) -> String {
        format!("{} vs {}", self.home, self.away)
    }
}

/// Decimal 1X2 prices. An absent field means the outcome is not priced;
/// prices are never stored as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Odds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away: Option<f64>,
}

impl Odds {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Checks a decimal price: finite and at least 1.0.
pub fn validate_price(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 1.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidPrice { value })
    }
}

/// Where an event came from. Never part of event identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub bookmaker: BookmakerId,
    pub region: String,
    pub fetched_at: FetchedAt,
}

/// Canonical, platform-wide representation of one matchable betting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique within one (bookmaker, region) scope. Source-native where the
    /// source publishes one, otherwise a content hash of teams + start time.
    pub id: String,
    pub teams: Teams,
    #[serde(default = "unknown")]
    pub league: String,
    #[serde(default = "unknown")]
    pub country: String,
    #[serde(default = "unknown")]
    pub sport: String,
    pub start_time: KickoffTime,
    #[serde(default)]
    pub odds: Odds,
    /// False when the 1X2 market was suspended or any expected price is
    /// missing.
    pub market_available: bool,
    pub source: Provenance,
}

fn unknown() -> String {
    String::from("Unknown")
}

impl Event {
    /// Identity scope: (bookmaker, region, id).
    pub fn identity(&self) -> (&str, &str, &str) {
        (
            self.source.bookmaker.as_str(),
            &self.source.region,
            &self.id,
        )
    }

    /// Re-checks the price invariant; used when events enter from external
    /// data such as static fallback files.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for price in [self.odds.home, self.odds.draw, self.odds.away]
            .into_iter()
            .flatten()
        {
            validate_price(price)?;
        }
        Ok(())
    }
}
