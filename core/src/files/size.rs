//! Human-readable file sizes.

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
const BASE: f64 = 1024.0;

/// Format a byte count with binary units, e.g. `1536` → `"1.5 KB"`.
///
/// Trailing zeros in the fraction are dropped, but at least one decimal is
/// kept when `decimal_places > 0`. `use_comma` switches the decimal
/// separator to `,`.
pub fn format_file_size(bytes: u64, decimal_places: usize, use_comma: bool) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= BASE && unit < UNITS.len() - 1 {
        value /= BASE;
        unit += 1;
    }

    let mut formatted = format!("{value:.decimal_places$}");
    if let Some(dot) = formatted.find('.') {
        let trimmed_len = formatted.trim_end_matches('0').len();
        // Keep one decimal digit.
        formatted.truncate(trimmed_len.max(dot + 2));
    }
    if use_comma {
        formatted = formatted.replace('.', ",");
    }

    format!("{formatted} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes() {
        assert_eq!(format_file_size(0, 1, false), "0 B");
    }

    #[test]
    fn whole_units_keep_one_decimal() {
        assert_eq!(format_file_size(1024, 1, false), "1.0 KB");
        assert_eq!(format_file_size(1024 * 1024, 1, false), "1.0 MB");
        assert_eq!(format_file_size(1024u64.pow(4), 1, false), "1.0 TB");
    }

    #[test]
    fn fractions_and_comma_separator() {
        assert_eq!(format_file_size(1536, 1, false), "1.5 KB");
        assert_eq!(format_file_size(1536, 1, true), "1,5 KB");
        assert_eq!(format_file_size(1280, 3, false), "1.25 KB");
    }

    #[test]
    fn no_decimals_requested() {
        assert_eq!(format_file_size(500, 0, false), "500 B");
        assert_eq!(format_file_size(100 * 1024, 0, true), "100 KB");
    }

    #[test]
    fn caps_at_largest_unit() {
        assert_eq!(format_file_size(u64::MAX, 1, false), "16384.0 PB");
    }
}
