// SPDX-License-Identifier: GPL-3.0-only

//! Optical writers and the space left on their media
//!
//! CD writers are driven through `cdrecord`, which reports multisession
//! boundaries. DVD writers are driven through `growisofs`, which only tells
//! how many sectors are in use. Either way the result is a
//! [`MediaCapacity`].

pub mod capacity;
pub mod cdrecord;
pub mod growisofs;

use std::path::Path;

use disc_types::{MediaCapacity, MediaType};

use crate::error::{Result, SysError};

pub use capacity::{calculate_capacity, calculate_dvd_capacity};
pub use cdrecord::{Cdrecord, parse_boundaries_output};
pub use growisofs::{Growisofs, parse_sectors_used};

/// The writer matching a media type
#[derive(Debug, Clone)]
pub enum MediaWriter {
    Cd(Cdrecord),
    Dvd(Growisofs),
}

impl MediaWriter {
    pub fn for_media(
        media_type: MediaType,
        hardware_id: &str,
        supports_multi: bool,
        drive_speed: Option<u32>,
    ) -> Result<Self> {
        validate_hardware_id(hardware_id)?;
        let media = media_type.definition();
        if media_type.is_dvd() {
            Ok(MediaWriter::Dvd(Growisofs::new(hardware_id, media, drive_speed)?))
        } else {
            Ok(MediaWriter::Cd(Cdrecord::new(hardware_id, media, supports_multi)?))
        }
    }

    /// Query the disc in the drive; `use_multi` only applies to CD media
    pub fn retrieve_capacity(&self, entire_disc: bool, use_multi: bool) -> Result<MediaCapacity> {
        match self {
            MediaWriter::Cd(writer) => writer.retrieve_capacity(entire_disc, use_multi),
            MediaWriter::Dvd(writer) => writer.retrieve_capacity(entire_disc),
        }
    }
}

/// Accept an absolute device path or a SCSI id of the form `[method:]bus,target,lun`
pub fn validate_hardware_id(hardware_id: &str) -> Result<()> {
    if Path::new(hardware_id).is_absolute() || is_scsi_id(hardware_id) {
        Ok(())
    } else {
        Err(SysError::InvalidConfig(format!(
            "Device must either be an absolute path or a valid SCSI id: {hardware_id:?}"
        )))
    }
}

fn is_scsi_id(value: &str) -> bool {
    let address = match value.rsplit_once(':') {
        Some((_method, address)) => address,
        None => value,
    };
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
