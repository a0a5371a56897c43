//! Canonical duration text: `[-][d.]hh:mm:ss[.fffffff]`

use chrono::TimeDelta;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration '{0}', expected [-][d.]hh:mm:ss[.fffffff]")]
pub struct DurationError(pub String);

/// Parse the canonical duration format.
pub fn parse(s: &str) -> Result<TimeDelta, DurationError> {
    let invalid = || DurationError(s.to_string());
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut parts = body.split(':');
    let (Some(head), Some(minutes), Some(tail), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let (days, hours) = match head.split_once('.') {
        Some((d, h)) => (number(d, u32::MAX as u64).ok_or_else(invalid)?, h),
        None => (0, head),
    };
    let (seconds, fraction) = tail.split_once('.').unwrap_or((tail, ""));

    let hours = fixed_width(hours, 23).ok_or_else(invalid)?;
    let minutes = fixed_width(minutes, 59).ok_or_else(invalid)?;
    let seconds = fixed_width(seconds, 59).ok_or_else(invalid)?;

    let nanos = if fraction.is_empty() {
        0
    } else {
        if fraction.len() > 7 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        format!("{fraction:0<9}").parse::<i64>().map_err(|_| invalid())?
    };

    let total = TimeDelta::try_days(days as i64)
        .and_then(|d| d.checked_add(&TimeDelta::try_hours(hours as i64)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_minutes(minutes as i64)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_seconds(seconds as i64)?))
        .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos)))
        .ok_or_else(invalid)?;

    Ok(if negative { -total } else { total })
}

/// Format a duration in the canonical text form.
pub fn format(duration: &TimeDelta) -> String {
    let negative = *duration < TimeDelta::zero();
    let abs = duration.abs();
    let total_seconds = abs.num_seconds();
    let nanos = abs.subsec_nanos();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if nanos > 0 {
        out.push_str(&format!(".{:07}", nanos / 100));
    }
    out
}

fn number(s: &str, max: u64) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok().filter(|v| *v <= max)
}

fn fixed_width(s: &str, max: u64) -> Option<u64> {
    if s.len() != 2 {
        return None;
    }
    number(s, max)
}

/// Serde adapter storing durations as canonical text.
pub mod text {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_forms() {
        assert_eq!(parse("01:30:00").unwrap(), TimeDelta::minutes(90));
        assert_eq!(
            parse("2.03:04:05").unwrap(),
            TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(4) + TimeDelta::seconds(5)
        );
        assert_eq!(parse("-00:00:01.5").unwrap(), -TimeDelta::milliseconds(1500));
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        for bad in ["1:30:00", "01:60:00", "24:00:00", "01:30", "P1D", "00:00:00.12345678", ""] {
            assert!(parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(format(&TimeDelta::minutes(90)), "01:30:00");
        assert_eq!(format(&(TimeDelta::days(1) + TimeDelta::milliseconds(250))), "1.00:00:00.2500000");
        assert_eq!(format(&-TimeDelta::seconds(5)), "-00:00:05");
    }
}
