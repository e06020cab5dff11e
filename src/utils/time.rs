use chrono::{SecondsFormat, TimeZone, Utc};
use mongodb::bson::DateTime;

/// Renders a BSON timestamp the way JavaScript's `toISOString` does.
pub fn to_iso_string(dt: DateTime) -> String {
    match Utc.timestamp_millis_opt(dt.timestamp_millis()).single() {
        Some(parsed) => parsed.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => dt.timestamp_millis().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_format() {
        let dt = DateTime::from_millis(1_704_067_200_123);
        assert_eq!(to_iso_string(dt), "2024-01-01T00:00:00.123Z");
    }
}
