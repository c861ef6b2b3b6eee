//! Time related utils.

use chrono::Utc;

/// A point in time, always in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Return the current UTC instant.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format a date stamp like "20220313".
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Format a compact ISO 8601 timestamp like "20220313T072004Z".
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Clock supplies the instant a request is signed at.
///
/// Signing is deterministic for a fixed instant, so the clock is passed into
/// the signing call instead of being read ambiently. Production callers use
/// [`SystemClock`]; tests inject a [`FixedClock`] to reproduce known
/// signatures.
pub trait Clock: Send + Sync {
    /// Current UTC instant.
    fn now(&self) -> DateTime;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        now()
    }
}

/// Clock pinned to a fixed instant.
///
/// # Note
///
/// We should always take current time to sign requests. Only use this clock
/// for reproducing a known signature.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime);

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 13, 7, 20, 4)
            .single()
            .expect("in bounds")
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(test_time()), "20220313");
    }

    #[test]
    fn test_format_iso8601() {
        assert_eq!(format_iso8601(test_time()), "20220313T072004Z");
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(test_time());
        assert_eq!(clock.now(), test_time());
        assert_eq!(clock.now(), clock.now());
    }
}
