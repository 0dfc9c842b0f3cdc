//! Duration (de)serialization for config files
//!
//! Accepts Go-style strings (`30s`, `1m30s`, `500ms`, `2h`) or a bare
//! integer number of seconds. Serializes back to the string form.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationHelper {
    Secs(u64),
    Text(String),
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match DurationHelper::deserialize(deserializer)? {
        DurationHelper::Secs(secs) => Ok(Duration::from_secs(secs)),
        DurationHelper::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

/// `Option<Duration>` variant, for use with `#[serde(default, with = "...")]`
pub mod option {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<DurationHelper>::deserialize(deserializer)? {
            None => Ok(None),
            Some(DurationHelper::Secs(secs)) => Ok(Some(Duration::from_secs(secs))),
            Some(DurationHelper::Text(text)) => parse_duration(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a duration string such as `1h30m` or `250ms`
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    let mut rest = text;

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("missing unit in duration '{}'", text))?;
        if digits == 0 {
            return Err(format!("invalid duration '{}'", text));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid number in duration '{}'", text))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let out_of_range = || format!("duration '{}' out of range", text);
        let unit = match &rest[..unit_len] {
            "ns" => Duration::from_nanos(value),
            "us" | "µs" => Duration::from_micros(value),
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60).ok_or_else(out_of_range)?),
            "h" => Duration::from_secs(value.checked_mul(3600).ok_or_else(out_of_range)?),
            "d" => Duration::from_secs(value.checked_mul(86400).ok_or_else(out_of_range)?),
            other => return Err(format!("unknown unit '{}' in duration '{}'", other, text)),
        };
        total = total.checked_add(unit).ok_or_else(out_of_range)?;
        rest = &rest[unit_len..];
    }

    Ok(total)
}

/// Format a duration the way [`parse_duration`] reads it
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let mut secs = duration.as_secs();
    let mut out = String::new();
    for (unit, size) in [("h", 3600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }

    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        // whole seconds
    } else if nanos % 1_000_000 == 0 {
        out.push_str(&format!("{}ms", nanos / 1_000_000));
    } else if nanos % 1_000 == 0 {
        out.push_str(&format!("{}us", nanos / 1_000));
    } else {
        out.push_str(&format!("{}ns", nanos));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1h0m5s").unwrap(), Duration::from_secs(3605));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s10").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s500ms");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_duration("9999999999999999999h").is_err());
        assert!(parse_duration("18446744073709551615m").is_err());
        assert!(parse_duration("18446744073709551615s1s")
            .unwrap_err()
            .contains("out of range"));
        // overflowing u64 itself
        assert!(parse_duration("99999999999999999999999s").is_err());
    }

    #[test]
    fn test_overflow_in_config_is_a_parse_error() {
        let result = serde_yaml::from_str::<crate::config::DatasourcesConfig>(
            "queryTimeout: 18446744073709551615s1s",
        );
        assert!(result.is_err());

        let result = serde_yaml::from_str::<crate::config::DatasourcesConfig>(
            "discovery:\n  timeout: 9999999999999999999h",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sub_millisecond_round_trip() {
        for duration in [
            Duration::from_nanos(1),
            Duration::from_micros(250),
            Duration::from_nanos(1_500),
            Duration::new(90, 42),
        ] {
            assert_eq!(parse_duration(&format_duration(duration)).unwrap(), duration);
        }
        assert_eq!(format_duration(Duration::from_micros(250)), "250us");
        assert_eq!(parse_duration("3µs").unwrap(), Duration::from_micros(3));
    }
}
