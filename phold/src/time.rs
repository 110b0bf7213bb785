//! Simulated time.
//!
//! Delivery times are integer picoseconds. Configuration values such as
//! `timeToRun` or `linkDelay` are written as `<number><unit>` strings the way
//! the host kernel accepts them (`1000ns`, `1.5us`, `2ms`).

use crate::error::{PholdError, PholdResult};

/// Simulated time in picoseconds.
pub type SimTime = u64;

/// Picoseconds in one nanosecond.
pub const PS_PER_NS: SimTime = 1_000;

const UNITS: &[(&str, f64)] = &[
    ("ps", 1.0),
    ("ns", 1e3),
    ("us", 1e6),
    ("ms", 1e9),
    ("s", 1e12),
];

/// Parse a time string into picoseconds.
///
/// A bare number is taken as picoseconds.
pub fn parse_time(input: &str) -> PholdResult<SimTime> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let scale = if unit.is_empty() {
        1.0
    } else {
        UNITS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(unit.trim()))
            .map(|(_, scale)| *scale)
            .ok_or_else(|| PholdError::InvalidTime(input.to_string()))?
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| PholdError::InvalidTime(input.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(PholdError::InvalidTime(input.to_string()));
    }

    Ok((value * scale).round() as SimTime)
}

/// Convert a non-negative delay in picoseconds to [`SimTime`].
///
/// Fractional picoseconds are truncated; non-finite values saturate.
pub fn delay_to_sim_time(delay: f64) -> SimTime {
    if delay.is_nan() || delay <= 0.0 {
        0
    } else {
        // `as` saturates at u64::MAX for +inf and out-of-range values.
        delay as SimTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(parse_time("1000ns").unwrap(), 1_000_000);
        assert_eq!(parse_time("1ns").unwrap(), 1_000);
        assert_eq!(parse_time("1.5us").unwrap(), 1_500_000);
        assert_eq!(parse_time("2ms").unwrap(), 2_000_000_000);
        assert_eq!(parse_time("1s").unwrap(), 1_000_000_000_000);
        assert_eq!(parse_time("42").unwrap(), 42);
        assert_eq!(parse_time(" 7 NS ").unwrap(), 7_000);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_time("ns").is_err());
        assert!(parse_time("10 parsecs").is_err());
        assert!(parse_time("-5ns").is_err());
        assert!(parse_time("").is_err());
    }

    #[test]
    fn delay_conversion_truncates() {
        assert_eq!(delay_to_sim_time(0.0), 0);
        assert_eq!(delay_to_sim_time(999.9), 999);
        assert_eq!(delay_to_sim_time(-3.0), 0);
        assert_eq!(delay_to_sim_time(f64::NAN), 0);
        assert_eq!(delay_to_sim_time(f64::INFINITY), SimTime::MAX);
    }
}
