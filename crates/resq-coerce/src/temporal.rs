//! Date, time and duration targets
//!
//! Zone-less and zoned timestamps convert into each other: dropping the
//! zone keeps the local wall-clock time, and a zone-less value is read as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use resq_ast::{duration, Value};

use crate::{unsupported, Input};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub(crate) fn to_datetime(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => {
            let s = s.trim();
            parse_naive(s)
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
                .map(Value::DateTime)
                .ok_or_else(|| format!("{s:?} is not a recognized date/time"))
        }
        Input::Typed(Value::DateTimeTz(dt)) => Ok(Value::DateTime(dt.naive_local())),
        other => Err(unsupported(&other)),
    }
}

pub(crate) fn to_datetimetz(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .ok()
                .or_else(|| parse_naive(s).map(assume_utc))
                .map(Value::DateTimeTz)
                .ok_or_else(|| format!("{s:?} is not a recognized date/time"))
        }
        Input::Typed(Value::DateTime(naive)) => Ok(Value::DateTimeTz(assume_utc(*naive))),
        other => Err(unsupported(&other)),
    }
}

pub(crate) fn to_duration(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => duration::parse(s.trim())
            .map(Value::Duration)
            .map_err(|e| e.to_string()),
        other => Err(unsupported(&other)),
    }
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn assume_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce;
    use chrono::TimeDelta;
    use resq_ast::Literal;
    use resq_schema::DataType;

    fn naive(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn test_datetime_text_formats() {
        let expected = Value::DateTime(naive("2024-03-01T10:30:00"));
        for text in ["2024-03-01T10:30:00", "2024-03-01 10:30:00", "2024-03-01T10:30"] {
            assert_eq!(coerce(&DataType::DateTime, &Literal::wire_str(text)).unwrap(), expected);
        }
        assert_eq!(
            coerce(&DataType::DateTime, &Literal::wire_str("2024-03-01")).unwrap(),
            Value::DateTime(naive("2024-03-01T00:00:00"))
        );
    }

    #[test]
    fn test_datetime_drops_zone() {
        assert_eq!(
            coerce(&DataType::DateTime, &Literal::wire_str("2024-03-01T10:30:00+02:00")).unwrap(),
            Value::DateTime(naive("2024-03-01T10:30:00"))
        );
    }

    #[test]
    fn test_datetimetz_keeps_offset_or_assumes_utc() {
        let zoned = coerce(&DataType::DateTimeTz, &Literal::wire_str("2024-03-01T10:30:00+02:00"))
            .unwrap();
        let Value::DateTimeTz(dt) = zoned else {
            panic!("expected zoned value");
        };
        assert_eq!(dt.offset().local_minus_utc(), 7200);

        let naive_input = Literal::Typed(Value::DateTime(naive("2024-03-01T10:30:00")));
        let Value::DateTimeTz(dt) = coerce(&DataType::DateTimeTz, &naive_input).unwrap() else {
            panic!("expected zoned value");
        };
        assert_eq!(dt.offset().local_minus_utc(), 0);
        assert_eq!(dt.naive_utc(), naive("2024-03-01T10:30:00"));
    }

    #[test]
    fn test_duration_text() {
        assert_eq!(
            coerce(&DataType::Duration, &Literal::wire_str("1.02:00:00")).unwrap(),
            Value::Duration(TimeDelta::hours(26))
        );
        assert!(coerce(&DataType::Duration, &Literal::wire_str("soon")).is_err());
    }

    #[test]
    fn test_invalid_datetime() {
        assert!(coerce(&DataType::DateTime, &Literal::wire_str("yesterday")).is_err());
        assert!(coerce(&DataType::DateTimeTz, &Literal::wire_str("2024-13-01")).is_err());
    }
}
