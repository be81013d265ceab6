use regex::Regex;
use std::sync::LazyLock;

static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:hour|hr)s?").expect("hardcoded regex")
});

static MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*min(?:ute)?s?").expect("hardcoded regex"));

/// First duration the correspondent mentioned, in whole minutes.
///
/// Hours win over minutes: "1.5 hours, maybe 20 min" is 90.
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let text = text.to_lowercase();

    if let Some(caps) = HOURS.captures(&text) {
        let hours: f64 = caps[1].parse().ok()?;
        // `as` saturates; durations are small and non-negative by the pattern
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let minutes = (hours * 60.0) as u32;
        return Some(minutes);
    }

    MINUTES
        .captures(&text)
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(parse_duration_minutes("30 min"), Some(30));
        assert_eq!(parse_duration_minutes("gimme 15 minutes"), Some(15));
        assert_eq!(parse_duration_minutes("1 hour"), Some(60));
        assert_eq!(parse_duration_minutes("2 Hours on the thesis"), Some(120));
        assert_eq!(parse_duration_minutes("1.5hrs"), Some(90));
        assert_eq!(parse_duration_minutes("1.5 hours, maybe 20 min"), Some(90));
    }

    #[test]
    fn ignores_text_without_durations() {
        assert_eq!(parse_duration_minutes("on it"), None);
        assert_eq!(parse_duration_minutes("5 more pages"), None);
    }
}
