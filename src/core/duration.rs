use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ISO_8601: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid duration pattern")
});

static CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d+):)?(\d+):(\d+)$").expect("valid clock pattern"));

/// Converts `PT#H#M#S` or `[HH:]MM:SS` into seconds. Anything else is 0.
pub fn parse_duration(input: &str) -> u64 {
    let input = input.trim();

    let captures = ISO_8601
        .captures(input)
        .or_else(|| CLOCK.captures(input));

    let Some(captures) = captures else {
        return 0;
    };

    let part = |index: usize| -> u64 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    // absurd magnitudes are treated like any other unreadable value
    part(1)
        .checked_mul(3600)
        .and_then(|secs| part(2).checked_mul(60)?.checked_add(secs))
        .and_then(|secs| secs.checked_add(part(3)))
        .unwrap_or(0)
}

/// Reads a duration that upstream encodes as a JSON number or numeric string.
pub fn seconds_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.max(0.0).round() as u64)
            .unwrap_or_else(|_| parse_duration(s)),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iso_8601() {
        assert_eq!(parse_duration("PT15M51S"), 951);
        assert_eq!(parse_duration("PT1H"), 3600);
        assert_eq!(parse_duration("PT2H3S"), 7203);
        assert_eq!(parse_duration("PT"), 0);
    }

    #[test]
    fn test_clock() {
        assert_eq!(parse_duration("01:22:33"), 4953);
        assert_eq!(parse_duration("22:33"), 1353);
        assert_eq!(parse_duration(" 00:04:13 "), 253);
    }

    #[test]
    fn test_garbage_is_zero() {
        assert_eq!(parse_duration("garbage"), 0);
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("1:2:3:4"), 0);
        assert_eq!(parse_duration("P1D"), 0);
    }

    #[test]
    fn test_overflow_is_zero() {
        assert_eq!(parse_duration("PT9999999999999999H"), 0);
        assert_eq!(parse_duration("9999999999999999:00:00"), 0);
        assert_eq!(parse_duration("PT18446744073709551615S"), u64::MAX);
        assert_eq!(parse_duration("PT1H18446744073709551615S"), 0);
    }

    #[test]
    fn test_seconds_from_value() {
        assert_eq!(seconds_from_value(&json!(120)), 120);
        assert_eq!(seconds_from_value(&json!(254.6)), 255);
        assert_eq!(seconds_from_value(&json!("254.35")), 254);
        assert_eq!(seconds_from_value(&json!("03:02")), 182);
        assert_eq!(seconds_from_value(&json!(null)), 0);
    }
}
