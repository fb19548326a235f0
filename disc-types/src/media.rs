//! Optical media geometry and capacity snapshots

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{SizeUnit, convert_size, display_bytes};

/// Lead-in consumed by the first session written to a CD, per cdrecord's documentation
const CD_INITIAL_LEAD_IN: f64 = 11400.0;

/// Lead-in consumed by every additional CD session, per cdrecord's documentation
const CD_SESSION_LEAD_IN: f64 = 6900.0;

/// 650 MiB in sectors
const CD_74_SECTORS: f64 = 332800.0;

/// 700 MiB in sectors
const CD_80_SECTORS: f64 = 358400.0;

/// 4.4 "true" GiB in sectors (the 4.7 GB marketed capacity)
const DVD_SECTORS: f64 = 4.4 * 1024.0 * 1024.0 * 1024.0 / 2048.0;

/// Supported media types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// 74-minute CD-R
    CdR74,
    /// 74-minute CD-RW
    CdRw74,
    /// 80-minute CD-R
    CdR80,
    /// 80-minute CD-RW
    CdRw80,
    /// DVD+R
    DvdPlusR,
    /// DVD+RW
    DvdPlusRw,
}

impl MediaType {
    pub const ALL: [MediaType; 6] = [
        MediaType::CdR74,
        MediaType::CdRw74,
        MediaType::CdR80,
        MediaType::CdRw80,
        MediaType::DvdPlusR,
        MediaType::DvdPlusRw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::CdR74 => "cdr74",
            MediaType::CdRw74 => "cdrw74",
            MediaType::CdR80 => "cdr80",
            MediaType::CdRw80 => "cdrw80",
            MediaType::DvdPlusR => "dvdplusr",
            MediaType::DvdPlusRw => "dvdplusrw",
        }
    }

    pub fn is_dvd(self) -> bool {
        matches!(self, MediaType::DvdPlusR | MediaType::DvdPlusRw)
    }

    pub fn definition(self) -> MediaDefinition {
        match self {
            MediaType::CdR74 => MediaDefinition::CDR_74,
            MediaType::CdRw74 => MediaDefinition::CDRW_74,
            MediaType::CdR80 => MediaDefinition::CDR_80,
            MediaType::CdRw80 => MediaDefinition::CDRW_80,
            MediaType::DvdPlusR => MediaDefinition::DVDPLUSR,
            MediaType::DvdPlusRw => MediaDefinition::DVDPLUSRW,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value
            .trim()
            .to_ascii_lowercase()
            .replace('+', "plus")
            .replace(['-', '_'], "");
        MediaType::ALL
            .into_iter()
            .find(|media| media.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Invalid media type: {}", value))
    }
}

/// Fixed geometry of one media type
///
/// Capacity and lead-in values are in ISO sectors. DVD media carry no
/// lead-in accounting; their capacity is reported by the writer directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaDefinition {
    media_type: MediaType,
    rewritable: bool,
    capacity: f64,
    initial_lead_in: f64,
    lead_in: f64,
}

impl MediaDefinition {
    pub const CDR_74: MediaDefinition = MediaDefinition::cd(MediaType::CdR74, false, CD_74_SECTORS);
    pub const CDRW_74: MediaDefinition = MediaDefinition::cd(MediaType::CdRw74, true, CD_74_SECTORS);
    pub const CDR_80: MediaDefinition = MediaDefinition::cd(MediaType::CdR80, false, CD_80_SECTORS);
    pub const CDRW_80: MediaDefinition = MediaDefinition::cd(MediaType::CdRw80, true, CD_80_SECTORS);
    pub const DVDPLUSR: MediaDefinition = MediaDefinition::dvd(MediaType::DvdPlusR, false);
    pub const DVDPLUSRW: MediaDefinition = MediaDefinition::dvd(MediaType::DvdPlusRw, true);

    const fn cd(media_type: MediaType, rewritable: bool, capacity: f64) -> Self {
        Self {
            media_type,
            rewritable,
            capacity,
            initial_lead_in: CD_INITIAL_LEAD_IN,
            lead_in: CD_SESSION_LEAD_IN,
        }
    }

    const fn dvd(media_type: MediaType, rewritable: bool) -> Self {
        Self {
            media_type,
            rewritable,
            capacity: DVD_SECTORS,
            initial_lead_in: 0.0,
            lead_in: 0.0,
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn rewritable(&self) -> bool {
        self.rewritable
    }

    /// Total capacity in sectors, before any lead-in
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Lead-in required by the first image written to the media, in sectors
    pub fn initial_lead_in(&self) -> f64 {
        self.initial_lead_in
    }

    /// Lead-in required by each successive session, in sectors
    pub fn lead_in(&self) -> f64 {
        self.lead_in
    }

    pub fn capacity_bytes(&self) -> f64 {
        convert_size(self.capacity, SizeUnit::Sectors, SizeUnit::Bytes)
    }
}

/// Multisession boundaries, in sectors, exactly as `cdrecord -msinfo` reports them
///
/// `start` is where the last session started and `end` is where the next
/// session would start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Boundaries {
    pub start: u64,
    pub end: u64,
}

impl Boundaries {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Boundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

impl FromStr for Boundaries {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Boundaries must look like start,end: {}", value))?;
        Ok(Self {
            start: start.trim().parse()?,
            end: end.trim().parse()?,
        })
    }
}

/// Space used and available on a disc, computed fresh for every query
///
/// Space used includes earlier sessions (unless the disc is unused). Space
/// available is what remains for data once the required lead-in is set aside.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MediaCapacity {
    bytes_used: f64,
    bytes_available: f64,
    boundaries: Option<Boundaries>,
}

impl MediaCapacity {
    pub fn new(bytes_used: f64, bytes_available: f64, boundaries: Option<Boundaries>) -> Self {
        Self {
            bytes_used,
            bytes_available,
            boundaries,
        }
    }

    pub fn bytes_used(&self) -> f64 {
        self.bytes_used
    }

    pub fn bytes_available(&self) -> f64 {
        self.bytes_available
    }

    pub fn boundaries(&self) -> Option<Boundaries> {
        self.boundaries
    }

    /// Used plus available, in bytes
    pub fn total_capacity(&self) -> f64 {
        self.bytes_used + self.bytes_available
    }

    /// Percentage of the total capacity already used
    pub fn utilized(&self) -> f64 {
        if self.bytes_available <= 0.0 {
            100.0
        } else if self.bytes_used <= 0.0 {
            0.0
        } else {
            (self.bytes_used / self.total_capacity()) * 100.0
        }
    }
}

impl fmt::Display for MediaCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "utilized {} of {} ({:.2}%)",
            display_bytes(self.bytes_used, 2),
            display_bytes(self.total_capacity(), 2),
            self.utilized()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_definitions_match_cdrecord_geometry() {
        let media = MediaType::CdR74.definition();
        assert_eq!(media.media_type(), MediaType::CdR74);
        assert!(!media.rewritable());
        assert_eq!(media.capacity(), 332800.0);
        assert_eq!(media.initial_lead_in(), 11400.0);
        assert_eq!(media.lead_in(), 6900.0);
        assert_eq!(media.capacity_bytes(), 681_574_400.0);

        let media = MediaType::CdRw80.definition();
        assert!(media.rewritable());
        assert_eq!(media.capacity(), 358400.0);
    }

    #[test]
    fn dvd_definitions_have_no_lead_in() {
        let media = MediaType::DvdPlusRw.definition();
        assert!(media.rewritable());
        assert_eq!(media.initial_lead_in(), 0.0);
        assert_eq!(media.lead_in(), 0.0);
        assert!((media.capacity_bytes() - 4.4 * 1024.0 * 1024.0 * 1024.0).abs() < 1.0);
    }

    #[test]
    fn media_type_parses_loose_spellings() {
        assert_eq!("cdrw74".parse::<MediaType>().expect("parse"), MediaType::CdRw74);
        assert_eq!("CD-R80".parse::<MediaType>().expect("parse"), MediaType::CdR80);
        assert_eq!("dvd+rw".parse::<MediaType>().expect("parse"), MediaType::DvdPlusRw);
        assert!("bluray".parse::<MediaType>().is_err());

        let json = serde_json::to_string(&MediaType::DvdPlusR).expect("serialize");
        assert_eq!(json, "\"dvdplusr\"");
    }

    #[test]
    fn boundaries_parse_from_msinfo_form() {
        let boundaries: Boundaries = " 268582 , 302230".parse().expect("parse boundaries");
        assert_eq!(boundaries, Boundaries::new(268582, 302230));
        assert_eq!(boundaries.to_string(), "268582,302230");
        assert!("12".parse::<Boundaries>().is_err());
        assert!("-1,5".parse::<Boundaries>().is_err());
    }

    #[test]
    fn utilization_edges() {
        let capacity = MediaCapacity::new(100.0, 200.0, Some(Boundaries::new(300, 400)));
        assert_eq!(capacity.bytes_used(), 100.0);
        assert_eq!(capacity.bytes_available(), 200.0);
        assert_eq!(capacity.boundaries(), Some(Boundaries::new(300, 400)));
        assert_eq!(capacity.total_capacity(), 300.0);
        assert!((capacity.utilized() - 33.333).abs() < 0.01);

        assert_eq!(MediaCapacity::new(100.0, 0.0, None).utilized(), 100.0);
        assert_eq!(MediaCapacity::new(0.0, 200.0, None).utilized(), 0.0);
    }

    #[test]
    fn display_reports_utilization() {
        let capacity = MediaCapacity::new(0.0, 2048.0, None);
        assert_eq!(capacity.to_string(), "utilized 0 bytes of 2.00 kB (0.00%)");
    }
}
