//! Pure unit converters shared by the collectors and the summary renderer.

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Renders a byte counter as a human-readable string, e.g. `"12.34 MB"`.
///
/// Divides by 1024 until the value drops below the step or the unit ladder
/// runs out, so anything at petabyte scale stays in PB.
pub fn bytes_to_human(n: u64) -> String {
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, BYTE_UNITS[unit])
}

/// Substitutes `default` for absent or non-finite readings.
pub fn safe_number(val: Option<f64>, default: f64) -> f64 {
    match val {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Drops non-finite readings instead of substituting a value.
pub fn clean_value(val: f64) -> Option<f64> {
    val.is_finite().then_some(val)
}

/// Rounds to one decimal place, matching the GiB figures in the snapshot.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Base-1024 GiB, reported as "GB" throughout the snapshot.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_to_human_zero() {
        assert_eq!(bytes_to_human(0), "0.00 B");
    }

    #[test]
    fn bytes_to_human_scales_through_units() {
        assert_eq!(bytes_to_human(1536), "1.50 KB");
        assert_eq!(bytes_to_human(1024), "1.00 KB");
        assert_eq!(bytes_to_human(1024_u64.pow(4)), "1.00 TB");
        assert_eq!(bytes_to_human(1024_u64.pow(5)), "1.00 PB");
    }

    #[test]
    fn bytes_to_human_numeric_part_stays_below_step() {
        for n in [1_u64, 1023, 1025, 999_999, 1024_u64.pow(3) - 1, u32::MAX as u64] {
            let rendered = bytes_to_human(n);
            let numeric: f64 = rendered
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .unwrap();
            assert!(numeric < 1024.0, "{rendered} out of range for {n}");
        }
    }

    #[test]
    fn safe_number_filters_non_finite() {
        assert_eq!(safe_number(Some(f64::NAN), 0.0), 0.0);
        assert_eq!(safe_number(Some(f64::INFINITY), 0.0), 0.0);
        assert_eq!(safe_number(Some(f64::NEG_INFINITY), 0.0), 0.0);
        assert_eq!(safe_number(Some(42.0), 0.0), 42.0);
        assert_eq!(safe_number(None, 7.0), 7.0);
    }

    #[test]
    fn clean_value_nulls_non_finite() {
        assert_eq!(clean_value(f64::NAN), None);
        assert_eq!(clean_value(f64::INFINITY), None);
        assert_eq!(clean_value(3.5), Some(3.5));
        assert_eq!(clean_value(0.0), Some(0.0));
    }

    #[test]
    fn round1_keeps_one_decimal() {
        assert_eq!(round1(15.648), 15.6);
        assert_eq!(round1(0.05), 0.1);
        assert_eq!(round1(2.0), 2.0);
    }
}
