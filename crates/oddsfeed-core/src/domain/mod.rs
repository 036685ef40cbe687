mod clock;
mod event;

pub use clock::{FetchedAt, KickoffTime};
pub use event::{validate_price, Event, Odds, Provenance, Teams};
