//! Human-readable numbers for the summary cards, table and popups.

/// Rendered for a missing or zero delta.
pub const NO_CHANGE: &str = "0";

const UNITS: [(f64, &str); 4] = [(1e3, "k"), (1e6, "m"), (1e9, "b"), (1e12, "t")];

fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Values below 1000 stay exact; larger ones get one decimal and a unit.
fn abbreviate(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }

    let value = n as f64;
    let mut idx = UNITS
        .iter()
        .rposition(|(scale, _)| value >= *scale)
        .unwrap_or(0);
    let mut scaled = round_tenth(value / UNITS[idx].0);

    // 999_960 would otherwise print as "1000.0k"
    if scaled >= 1000.0 {
        if idx + 1 == UNITS.len() {
            // Nothing above trillions: whole trillions with separators.
            let whole = (value / UNITS[idx].0).round() as u64;
            return format!("{}{}", format_count(whole), UNITS[idx].1);
        }
        idx += 1;
        scaled = round_tenth(value / UNITS[idx].0);
    }

    format!("{scaled:.1}{}", UNITS[idx].1)
}

/// Cumulative total in abbreviated form, e.g. `1.0m`. Missing reads as zero.
pub fn format_magnitude(n: Option<u64>) -> String {
    abbreviate(n.unwrap_or(0))
}

/// Signed change since the last reporting period, e.g. `+500` or `+1.2k`.
pub fn format_delta(n: Option<i64>) -> String {
    match n {
        None | Some(0) => NO_CHANGE.to_string(),
        Some(v) if v > 0 => format!("+{}", abbreviate(v.unsigned_abs())),
        Some(v) => format!("-{}", abbreviate(v.unsigned_abs())),
    }
}

/// `format_delta` for the unsigned deltas stored in `RegionStats`.
pub fn format_today(n: Option<u64>) -> String {
    format_delta(n.map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
}

/// Full count with thousands separators, e.g. `1,234,567`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_sentinel() {
        assert_eq!(format_delta(Some(0)), NO_CHANGE);
        assert_eq!(format_delta(None), NO_CHANGE);
        assert_eq!(format_today(None), NO_CHANGE);
        assert_eq!(format_today(Some(0)), NO_CHANGE);
    }

    #[test]
    fn test_delta_sign() {
        assert_eq!(format_delta(Some(5)), "+5");
        assert_eq!(format_delta(Some(500)), "+500");
        assert_eq!(format_delta(Some(1_234)), "+1.2k");
        assert_eq!(format_delta(Some(-2_500_000)), "-2.5m");
        assert_eq!(format_today(Some(42)), "+42");
    }

    #[test]
    fn test_magnitude_units() {
        assert_eq!(format_magnitude(Some(1_000_000)), "1.0m");
        assert_eq!(format_magnitude(Some(20_000)), "20.0k");
        assert_eq!(format_magnitude(Some(1_234)), "1.2k");
        assert_eq!(format_magnitude(Some(999)), "999");
        assert_eq!(format_magnitude(Some(3_400_000_000)), "3.4b");
        assert_eq!(format_magnitude(None), "0");
    }

    #[test]
    fn test_magnitude_rounds_into_next_unit() {
        assert_eq!(format_magnitude(Some(999_960)), "1.0m");
        assert_eq!(format_magnitude(Some(999_940)), "999.9k");
    }

    #[test]
    fn test_magnitude_past_the_largest_unit() {
        assert_eq!(format_magnitude(Some(999_900_000_000_000)), "999.9t");
        assert_eq!(format_magnitude(Some(999_990_000_000_000)), "1,000t");
        assert_eq!(format_magnitude(Some(5_000_000_000_000_000)), "5,000t");
        assert_eq!(format_magnitude(Some(u64::MAX)), "18,446,744t");
        assert_eq!(format_delta(Some(i64::MAX)), "+9,223,372t");
    }

    #[test]
    fn test_count_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }
}
