// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use disc_types::{Boundaries, MediaCapacity, MediaDefinition};
use tracing::{debug, warn};

use super::capacity::calculate_capacity;
use crate::error::{Result, SysError};
use crate::tool::{CDRECORD_COMMANDS, execute, resolve_command};

/// A CD writer queried through `cdrecord` (or `wodim`)
#[derive(Debug, Clone)]
pub struct Cdrecord {
    binary_path: PathBuf,
    hardware_id: String,
    media: MediaDefinition,
    supports_multi: bool,
}

impl Cdrecord {
    pub fn new(hardware_id: impl Into<String>, media: MediaDefinition, supports_multi: bool) -> Result<Self> {
        if !cfg!(feature = "cd-tools") {
            return Err(SysError::ToolNotFound("cdrecord (built without cd-tools)".to_string()));
        }
        let binary_path = resolve_command(CDRECORD_COMMANDS)?;
        Ok(Self::with_binary(binary_path, hardware_id, media, supports_multi))
    }

    pub fn with_binary(
        binary_path: PathBuf,
        hardware_id: impl Into<String>,
        media: MediaDefinition,
        supports_multi: bool,
    ) -> Self {
        Self {
            binary_path,
            hardware_id: hardware_id.into(),
            media,
            supports_multi,
        }
    }

    pub fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    pub fn media(&self) -> &MediaDefinition {
        &self.media
    }

    /// Multisession boundaries of the disc in the drive
    ///
    /// `None` means the disc should be treated as empty: the drive cannot
    /// write multisession discs, multisession use was not asked for, the
    /// entire disc was asked for, or the disc could not be read.
    pub fn boundaries(&self, entire_disc: bool, use_multi: bool) -> Result<Option<Boundaries>> {
        if !self.supports_multi {
            debug!("Device does not support multisession discs; returning boundaries None");
            return Ok(None);
        }
        if !use_multi {
            debug!("Use multisession flag is false; returning boundaries None");
            return Ok(None);
        }
        if entire_disc {
            debug!("Entire disc flag is set; returning boundaries None");
            return Ok(None);
        }

        let output = execute(&self.binary_path, &boundaries_args(&self.hardware_id))?;
        if !output.success() {
            debug!(
                "Error ({:?}) executing cdrecord command to get capacity",
                output.exit_code
            );
            warn!("Unable to read disc (might not be initialized); returning boundaries None");
            return Ok(None);
        }

        let boundaries = parse_boundaries_output(&output.lines())?;
        debug!("Returning disc boundaries: {:?}", boundaries);
        Ok(boundaries)
    }

    pub fn retrieve_capacity(&self, entire_disc: bool, use_multi: bool) -> Result<MediaCapacity> {
        let boundaries = self.boundaries(entire_disc, use_multi)?;
        Ok(calculate_capacity(&self.media, boundaries))
    }
}

pub fn boundaries_args(hardware_id: &str) -> Vec<String> {
    vec!["-msinfo".to_string(), format!("dev={hardware_id}")]
}

/// Parse `cdrecord -msinfo` output, a single `start,end` line
///
/// No output at all means the disc could not be read, which is treated as
/// an empty disc. Anything after the first line is ignored.
pub fn parse_boundaries_output(lines: &[&str]) -> Result<Option<Boundaries>> {
    let Some(first) = lines.first() else {
        warn!("Unable to read disc (might not be initialized); returning full capacity");
        return Ok(None);
    };

    let parse_error = || SysError::ParseOutput {
        tool: "cdrecord".to_string(),
        reason: format!("expected start,end boundaries, got {first:?}"),
    };
    let parse_sector = |value: &str| -> Result<u64> {
        let value = value.trim();
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(parse_error());
        }
        value.parse().map_err(|_| parse_error())
    };

    let (start, end) = first.split_once(',').ok_or_else(parse_error)?;
    Ok(Some(Boundaries::new(parse_sector(start)?, parse_sector(end)?)))
}
