//! Human-readable size parsing (e.g., "500MB", "2GB").

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{0}' - expected format like '500MB', '2GB', or '1024KB'")]
pub struct SizeParseError(String);

/// Parse a human-readable size string into bytes.
///
/// Bare numbers are bytes. `K`/`KB`, `M`/`MB` and `G`/`GB` suffixes are
/// binary multiples, case-insensitive, with optional whitespace.
///
/// ```
/// use panocube::config::parse_size;
///
/// assert_eq!(parse_size("500MB").unwrap(), 500 * 1024 * 1024);
/// assert_eq!(parse_size("1 k").unwrap(), 1024);
/// assert_eq!(parse_size("42").unwrap(), 42);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB)]
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|rest| (rest, *mult)))
        .unwrap_or((upper.as_str(), 1));

    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError(trimmed.to_string()))
}

/// Format a byte count using the largest exact binary unit.
///
/// ```
/// use panocube::config::format_size;
///
/// assert_eq!(format_size(500 * 1024 * 1024), "500MB");
/// assert_eq!(format_size(1536), "1536B");
/// ```
pub fn format_size(bytes: u64) -> String {
    match bytes {
        0 => "0".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b if b % KB == 0 => format!("{}KB", b / KB),
        b => format!("{}B", b),
    }
}
