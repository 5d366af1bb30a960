//! Wall-clock helpers: "HH:MM" parsing/formatting and serde adapters.

use chrono::{Duration, NaiveTime, Timelike};

use crate::models::tournament::TournamentError;

/// Parse a 24-hour "HH:MM" string.
pub fn parse_clock(value: &str) -> Result<NaiveTime, TournamentError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| TournamentError::InvalidInput(format!("invalid time '{value}', expected HH:MM")))
}

/// Format as zero-padded "HH:MM".
pub fn format_clock(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Add a (possibly negative) offset, wrapping past midnight.
pub fn add_clock(time: NaiveTime, offset: Duration) -> NaiveTime {
    time.overflowing_add_signed(offset).0
}

/// Serde adapter storing a `NaiveTime` as "HH:MM".
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_clock(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock(&raw).map_err(serde::de::Error::custom)
    }
}

/// Same as [`hhmm`] for optional times (`null` when unset).
pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&super::format_clock(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_clock(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}
