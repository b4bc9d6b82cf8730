use chrono::Duration;

pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 {
        parts.push(format!("{}m", mins));
    }
    if secs > 0 || (hours == 0 && mins == 0) {
        parts.push(format!("{}s", secs));
    }

    parts.join(" ")
}

/// Heart rate for display; no samples renders as "--", never as zero.
pub fn format_bpm(value: Option<f64>) -> String {
    match value {
        Some(bpm) => format!("{:.0} bpm", bpm),
        None => "--".to_string(),
    }
}

pub fn format_distance(metres: f64) -> String {
    if metres >= 1000.0 {
        format!("{:.2} km", metres / 1000.0)
    } else {
        format!("{:.0} m", metres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::zero()), "0s");
        assert_eq!(format_duration(Duration::seconds(59)), "59s");
        assert_eq!(format_duration(Duration::seconds(60)), "1m");
        assert_eq!(format_duration(Duration::seconds(61)), "1m 1s");
        assert_eq!(format_duration(Duration::seconds(3661)), "1h 1m 1s");
        assert_eq!(format_duration(Duration::milliseconds(30_900)), "30s");
        assert_eq!(format_duration(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_format_bpm() {
        assert_eq!(format_bpm(Some(142.4)), "142 bpm");
        assert_eq!(format_bpm(None), "--");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(420.4), "420 m");
        assert_eq!(format_distance(2500.0), "2.50 km");
    }
}
