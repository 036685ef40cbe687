use serde_json::Value;

use crate::mapping::FieldMap;

/// Classification of one strategy attempt's raw output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawVerdict {
    /// At least one record carries the source's expected shape.
    Success,
    /// The source answered but returned no records.
    EmptyResult,
    /// Records came back but none resembles the configured shape, typically
    /// an error page or a silently changed payload format.
    InvalidOutput,
}

/// Judges a raw batch against the source's field map.
///
/// One well-shaped record is enough for `Success`; normalization decides
/// record by record what survives.
pub fn classify(records: &[Value], map: &FieldMap) -> RawVerdict {
    if records.is_empty() {
        return RawVerdict::EmptyResult;
    }
    if records.iter().any(|record| map.has_signal(record)) {
        RawVerdict::Success
    } else {
        RawVerdict::InvalidOutput
    }
}
