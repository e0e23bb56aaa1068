use chrono::{DateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

/// The FPL API sends most decimal stats as strings ("3.4"), and some as plain
/// numbers. Blank strings read as zero.
pub fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) if s.trim().is_empty() => Ok(0.0),
        NumberOrString::String(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

// Unscheduled fixtures carry either null or "" here.
pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "decimal")]
        value: f64,
        #[serde(default, deserialize_with = "optional_timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn decimals_from_strings_and_numbers() {
        let s: Sample = serde_json::from_str(r#"{"value": "12.5"}"#).unwrap();
        assert_eq!(s.value, 12.5);
        let s: Sample = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(s.value, 3.0);
        let s: Sample = serde_json::from_str(r#"{"value": ""}"#).unwrap();
        assert_eq!(s.value, 0.0);
        assert!(serde_json::from_str::<Sample>(r#"{"value": "abc"}"#).is_err());
    }

    #[test]
    fn blank_timestamps_are_none() {
        let s: Sample = serde_json::from_str(r#"{"value": 0, "at": ""}"#).unwrap();
        assert_eq!(s.at, None);
        let s: Sample = serde_json::from_str(r#"{"value": 0, "at": null}"#).unwrap();
        assert_eq!(s.at, None);
        let s: Sample = serde_json::from_str(r#"{"value": 0}"#).unwrap();
        assert_eq!(s.at, None);

        let s: Sample =
            serde_json::from_str(r#"{"value": 0, "at": "2024-08-16T19:00:00Z"}"#).unwrap();
        assert_eq!(
            s.at.map(|t| t.to_rfc3339()),
            Some("2024-08-16T19:00:00+00:00".to_string())
        );
    }
}
