//! Calendar strings to epoch seconds and back.
//!
//! Epochs throughout the crate are ephemeris-time seconds past J2000.

use hifitime::Epoch;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimeError {
    #[error("could not parse calendar string '{input}': {reason}")]
    Parse { input: String, reason: String },
    #[error("epoch {0} is not finite")]
    NonFinite(f64),
}

/// Parses a Gregorian calendar string into ET seconds past J2000.
///
/// A bare `YYYY-MM-DD` date means midnight UTC. Strings without a time scale
/// suffix are read as UTC.
pub fn epoch_from_calendar(input: &str) -> Result<f64, TimeError> {
    let trimmed = input.trim();
    let normalized = if is_bare_date(trimmed) {
        format!("{trimmed}T00:00:00 UTC")
    } else {
        trimmed.to_string()
    };

    Epoch::from_gregorian_str(&normalized)
        .map(|epoch| epoch.to_et_seconds())
        .map_err(|e| TimeError::Parse {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

/// Formats ET seconds past J2000 as a UTC calendar string with microseconds
pub fn calendar_from_epoch(et: f64) -> Result<String, TimeError> {
    if !et.is_finite() {
        return Err(TimeError::NonFinite(et));
    }
    let (year, month, day, hour, minute, second, nanos) =
        Epoch::from_et_seconds(et).to_gregorian_utc();

    Ok(format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{:06} UTC",
        nanos / 1_000
    ))
}

fn is_bare_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}
