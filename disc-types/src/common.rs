//! Size units and byte formatting shared across models

use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

/// Size of one ISO 9660 sector in bytes; all media geometry is expressed in these
pub const ISO_SECTOR_SIZE: f64 = 2048.0;

pub const BYTES_PER_KBYTE: f64 = 1024.0;
pub const BYTES_PER_MBYTE: f64 = BYTES_PER_KBYTE * 1024.0;
pub const BYTES_PER_GBYTE: f64 = BYTES_PER_MBYTE * 1024.0;

/// Units understood by [`convert_size`]
///
/// Kilo/mega/giga are binary (1 kB = 1024 B), and a sector is [`ISO_SECTOR_SIZE`] bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    Bytes,
    KBytes,
    MBytes,
    GBytes,
    Sectors,
}

impl SizeUnit {
    fn bytes_per_unit(self) -> f64 {
        match self {
            SizeUnit::Bytes => 1.0,
            SizeUnit::KBytes => BYTES_PER_KBYTE,
            SizeUnit::MBytes => BYTES_PER_MBYTE,
            SizeUnit::GBytes => BYTES_PER_GBYTE,
            SizeUnit::Sectors => ISO_SECTOR_SIZE,
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "b" | "byte" | "bytes" => Some(SizeUnit::Bytes),
            "k" | "kb" | "kib" => Some(SizeUnit::KBytes),
            "m" | "mb" | "mib" => Some(SizeUnit::MBytes),
            "g" | "gb" | "gib" => Some(SizeUnit::GBytes),
            "s" | "sector" | "sectors" => Some(SizeUnit::Sectors),
            _ => None,
        }
    }
}

/// Convert a size between units, going through bytes internally
pub fn convert_size(size: f64, from: SizeUnit, to: SizeUnit) -> f64 {
    let bytes = size * from.bytes_per_unit();
    bytes / to.bytes_per_unit()
}

/// Format a byte quantity for log and terminal output (e.g. "69.02 MB")
///
/// Values under one kilobyte are printed as whole bytes.
pub fn display_bytes(bytes: f64, digits: usize) -> String {
    let magnitude = bytes.abs();
    if magnitude < BYTES_PER_KBYTE {
        format!("{bytes:.0} bytes")
    } else if magnitude < BYTES_PER_MBYTE {
        format!("{:.digits$} kB", bytes / BYTES_PER_KBYTE)
    } else if magnitude < BYTES_PER_GBYTE {
        format!("{:.digits$} MB", bytes / BYTES_PER_MBYTE)
    } else {
        format!("{:.digits$} GB", bytes / BYTES_PER_GBYTE)
    }
}

/// Convert bytes to human-readable format with the exact count appended,
/// e.g. "650.00 MB (681,574,400 bytes)"
pub fn bytes_to_pretty(bytes: u64) -> String {
    let pretty = display_bytes(bytes as f64, 2);
    format!("{} ({} bytes)", pretty, bytes.to_formatted_string(&Locale::en))
}

/// Parse a size such as "650 MB", "700m", "332800 sectors" or "4096" into bytes
pub fn pretty_to_bytes(pretty: &str) -> Result<f64> {
    let pretty = pretty.trim();
    let split_at = pretty
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(pretty.len());
    let (number, suffix) = pretty.split_at(split_at);

    if number.is_empty() {
        return Err(anyhow::anyhow!("Invalid size: {}", pretty));
    }
    let value: f64 = number.parse()?;

    let suffix = suffix.trim();
    let unit = if suffix.is_empty() {
        SizeUnit::Bytes
    } else {
        SizeUnit::from_suffix(suffix).ok_or_else(|| anyhow::anyhow!("Invalid unit: {}", suffix))?
    };

    Ok(convert_size(value, unit, SizeUnit::Bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_megabytes_to_sectors() {
        assert_eq!(convert_size(650.0, SizeUnit::MBytes, SizeUnit::Sectors), 332800.0);
        assert_eq!(convert_size(700.0, SizeUnit::MBytes, SizeUnit::Sectors), 358400.0);
        assert_eq!(convert_size(1.0, SizeUnit::Sectors, SizeUnit::Bytes), 2048.0);
    }

    #[test]
    fn display_switches_units_at_binary_boundaries() {
        assert_eq!(display_bytes(1023.0, 2), "1023 bytes");
        assert_eq!(display_bytes(1024.0, 2), "1.00 kB");
        assert_eq!(display_bytes(BYTES_PER_MBYTE * 69.02, 2), "69.02 MB");
        assert_eq!(display_bytes(BYTES_PER_GBYTE * 4.4, 1), "4.4 GB");
        assert_eq!(display_bytes(-2048.0, 0), "-2 kB");
    }

    #[test]
    fn pretty_includes_exact_count() {
        assert_eq!(bytes_to_pretty(681_574_400), "650.00 MB (681,574,400 bytes)");
    }

    #[test]
    fn parses_sizes_with_units() {
        assert_eq!(pretty_to_bytes("4096").expect("plain bytes"), 4096.0);
        assert_eq!(pretty_to_bytes("650 MB").expect("megabytes"), 681_574_400.0);
        assert_eq!(pretty_to_bytes("1.5k").expect("kilobytes"), 1536.0);
        assert_eq!(pretty_to_bytes("10 sectors").expect("sectors"), 20480.0);
        assert!(pretty_to_bytes("MB").is_err());
        assert!(pretty_to_bytes("12 parsecs").is_err());
    }
}
