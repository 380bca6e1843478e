use crate::domain::{IoBytes, Metric};
use crate::error::{Error, Result};

/// Unit suffixes and their byte multipliers, decimal and binary.
const UNITS: &[(&str, f64)] = &[
    ("B", 1.0),
    ("KB", 1e3),
    ("MB", 1e6),
    ("GB", 1e9),
    ("TB", 1e12),
    ("KiB", 1024.0),
    ("MiB", 1024.0 * 1024.0),
    ("GiB", 1024.0 * 1024.0 * 1024.0),
    ("TiB", 1024.0 * 1024.0 * 1024.0 * 1024.0),
];

/// Parse a human-readable quantity like `"12.3MB"` or `"1.2GiB"` into bytes.
///
/// The longest matching suffix wins, so `"1.2KiB"` matches `KiB` and never
/// falls through to the bare `B` entry. A string with no recognized suffix
/// is parsed as a raw byte value.
pub fn parse_bytes(text: &str) -> Result<f64> {
    let text = text.trim();

    let matched = UNITS
        .iter()
        .filter(|(suffix, _)| text.ends_with(suffix))
        .max_by_key(|(suffix, _)| suffix.len());

    let (number, multiplier) = match matched {
        Some((suffix, multiplier)) => (&text[..text.len() - suffix.len()], *multiplier),
        None => (text, 1.0),
    };

    number
        .trim()
        .parse::<f64>()
        .map(|value| value * multiplier)
        .map_err(|_| Error::Parse(format!("invalid byte quantity: {text:?}")))
}

/// Parse a `"<value><unit> / <value><unit>"` throughput pair into in/out
/// byte counts.
pub fn parse_io_pair(text: &str) -> Result<IoBytes> {
    let parts: Vec<&str> = text.split(" / ").collect();
    if parts.len() != 2 {
        return Err(Error::Parse(format!(
            "expected \"<in> / <out>\" pair, got {text:?}"
        )));
    }

    Ok(IoBytes::new(parse_bytes(parts[0])?, parse_bytes(parts[1])?))
}

/// Parse a percentage string like `"12.34%"` into a fraction.
///
/// Malformed values degrade to a zero metric with `valid` cleared instead of
/// raising; stats collection never aborts on one bad field.
pub fn parse_percent(text: &str) -> Metric {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);

    match number.parse::<f64>() {
        Ok(value) => Metric::measured(value / 100.0),
        Err(_) => Metric::missing(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bytes_decimal_units() {
        assert_eq!(parse_bytes("1B").unwrap(), 1.0);
        assert_eq!(parse_bytes("1KB").unwrap(), 1e3);
        assert_eq!(parse_bytes("150MB").unwrap(), 150e6);
        assert_eq!(parse_bytes("1.5GB").unwrap(), 1.5e9);
        assert_eq!(parse_bytes("2TB").unwrap(), 2e12);
    }

    #[test]
    fn test_parse_bytes_binary_units() {
        assert_eq!(parse_bytes("1KiB").unwrap(), 1024.0);
        assert_eq!(parse_bytes("1MiB").unwrap(), 1_048_576.0);
        assert_eq!(parse_bytes("1GiB").unwrap(), 1_073_741_824.0);
        assert_eq!(parse_bytes("1TiB").unwrap(), 1_099_511_627_776.0);
    }

    #[test]
    fn test_parse_bytes_longest_suffix_wins() {
        // "1KiB" ends with "B" and "KiB"; the longer suffix must win.
        assert_eq!(parse_bytes("1KiB").unwrap(), 1024.0);
        assert_eq!(parse_bytes("1KB").unwrap(), 1000.0);
    }

    #[test]
    fn test_parse_bytes_no_suffix_is_raw() {
        assert_eq!(parse_bytes("12345").unwrap(), 12345.0);
        assert_eq!(parse_bytes("0.5").unwrap(), 0.5);
    }

    #[test]
    fn test_parse_bytes_invalid() {
        assert!(parse_bytes("garbageMB").is_err());
        assert!(parse_bytes("").is_err());
    }

    #[test]
    fn test_parse_io_pair() {
        let io = parse_io_pair("12.3MB / 1.2GiB").unwrap();
        assert_eq!(io.inbound, 12_300_000.0);
        assert!((io.outbound - 1_288_490_188.8).abs() < 1e-3);
    }

    #[test]
    fn test_parse_io_pair_not_splittable() {
        assert!(parse_io_pair("12.3MB").is_err());
        assert!(parse_io_pair("1B / 2B / 3B").is_err());
    }

    #[test]
    fn test_parse_percent() {
        let metric = parse_percent("45.00%");
        assert_eq!(metric.fraction, 0.45);
        assert!(metric.valid);
    }

    #[test]
    fn test_parse_percent_zero_is_valid() {
        let metric = parse_percent("0.00%");
        assert_eq!(metric.fraction, 0.0);
        assert!(metric.valid);
    }

    #[test]
    fn test_parse_percent_malformed_degrades() {
        let metric = parse_percent("bad");
        assert_eq!(metric.fraction, 0.0);
        assert!(!metric.valid);
    }
}
