/// Current UTC instant as ISO-8601 with millisecond precision,
/// e.g. `2026-08-07T12:00:00.123Z`.
pub fn now_iso_ms() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_shape() {
        let ts = now_iso_ms();
        // 2026-08-07T12:00:00.123Z
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
        assert!(ts.ends_with('Z'));
        assert!(ts[20..23].chars().all(|c| c.is_ascii_digit()));
    }
}
