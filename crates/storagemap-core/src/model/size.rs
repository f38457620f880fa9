/// Human-readable byte counts and capacity conversions.
///
/// All sizes are `u64` bytes. Floating point only appears at the display
/// boundary and when comparing capacities against tier thresholds.

/// Bytes in one binary terabyte, the unit naming thresholds are written in.
pub const BYTES_PER_TB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

/// Display units above bytes, with the decimals each is printed with.
const UNITS: [(&str, usize); 4] = [("KB", 1), ("MB", 1), ("GB", 2), ("TB", 2)];

/// Capacity expressed in (binary) terabytes.
pub fn bytes_to_tb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_TB
}

/// Capacity as `"5.00 TB"` regardless of magnitude, as shown when a
/// volume's tier is decided.
pub fn format_tb(bytes: u64) -> String {
    format!("{:.2} TB", bytes_to_tb(bytes))
}

/// Format a byte count with the largest unit that keeps it ≥ 1.
///
/// Units are binary (1 KB = 1024 B); TB is the ceiling.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut chosen = UNITS[0];
    for unit in UNITS {
        value /= 1024.0;
        chosen = unit;
        if value < 1024.0 {
            break;
        }
    }
    let (label, decimals) = chosen;
    format!("{value:.decimals$} {label}")
}

/// Format a count with `,` thousands separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let lead = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
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
    fn test_format_size_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_size(5 * 1_099_511_627_776), "5.00 TB");
        assert_eq!(format_size(2048 * 1_099_511_627_776), "2048.00 TB");
    }

    #[test]
    fn test_bytes_to_tb() {
        assert_eq!(bytes_to_tb(1_099_511_627_776), 1.0);
        assert!((bytes_to_tb(1_649_267_441_664) - 1.5).abs() < f64::EPSILON);
        assert_eq!(format_tb(549_755_813_888), "0.50 TB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(892), "892");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(12_345), "12,345");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }
}
