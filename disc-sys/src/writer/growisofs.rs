// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use disc_types::{MediaCapacity, MediaDefinition};
use tracing::{debug, warn};

use super::capacity::calculate_dvd_capacity;
use crate::error::{Result, SysError};
use crate::tool::{GROWISOFS_COMMANDS, execute, resolve_command};

/// `growisofs` reports the resume offset in 32 KiB blocks, 16 ISO sectors each
const SECTORS_PER_SEEK_BLOCK: f64 = 16.0;

/// A DVD writer queried through `growisofs`
#[derive(Debug, Clone)]
pub struct Growisofs {
    binary_path: PathBuf,
    hardware_id: String,
    media: MediaDefinition,
    drive_speed: Option<u32>,
}

impl Growisofs {
    pub fn new(hardware_id: impl Into<String>, media: MediaDefinition, drive_speed: Option<u32>) -> Result<Self> {
        if !cfg!(feature = "dvd-tools") {
            return Err(SysError::ToolNotFound("growisofs (built without dvd-tools)".to_string()));
        }
        let binary_path = resolve_command(GROWISOFS_COMMANDS)?;
        Ok(Self::with_binary(binary_path, hardware_id, media, drive_speed))
    }

    pub fn with_binary(
        binary_path: PathBuf,
        hardware_id: impl Into<String>,
        media: MediaDefinition,
        drive_speed: Option<u32>,
    ) -> Self {
        Self {
            binary_path,
            hardware_id: hardware_id.into(),
            media,
            drive_speed,
        }
    }

    pub fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    /// Sectors already written to the disc, found through a dry run
    ///
    /// `growisofs` needs something to write even on a dry run, so it is
    /// handed an empty temporary directory that is removed afterwards. A
    /// failed dry run usually means a blank or unreadable disc and counts as
    /// zero sectors used.
    pub fn retrieve_sectors_used(&self) -> Result<f64> {
        let tempdir = tempfile::tempdir()?;
        let args = sectors_used_args(&self.hardware_id, self.drive_speed, tempdir.path());
        let output = execute(&self.binary_path, &args)?;

        if !output.success() {
            debug!(
                "Error ({:?}) calling growisofs to read sectors used",
                output.exit_code
            );
            warn!("Unable to read disc (might not be initialized); returning zero sectors used");
            return Ok(0.0);
        }

        // growisofs prints the mkisofs command line it would run on stderr
        let sectors_used = parse_sectors_used(&output.all_lines())?;
        debug!("Determined sectors used as {}", sectors_used);
        Ok(sectors_used)
    }

    pub fn retrieve_capacity(&self, entire_disc: bool) -> Result<MediaCapacity> {
        let sectors_used = if entire_disc { 0.0 } else { self.retrieve_sectors_used()? };
        Ok(calculate_dvd_capacity(&self.media, sectors_used))
    }
}

/// Arguments for a `growisofs` dry run appending `path` to the disc
///
/// `-use-the-force-luke=tty` keeps growisofs from refusing to run without a
/// terminal, as it otherwise does under cron.
pub fn sectors_used_args(hardware_id: &str, drive_speed: Option<u32>, path: &Path) -> Vec<String> {
    let mut args = vec!["-use-the-force-luke=tty".to_string(), "-dry-run".to_string()];
    if let Some(speed) = drive_speed {
        args.push(format!("-speed={speed}"));
    }
    args.extend([
        "-M".to_string(),
        hardware_id.to_string(),
        "-r".to_string(),
        "-graft-points".to_string(),
        path.display().to_string(),
    ]);
    args
}

/// Sectors used on the disc, from the `seek=` offset `growisofs` plans to resume at
///
/// The line of interest looks like:
///
/// ```text
/// Executing 'mkisofs -C 973744,1401056 -M /dev/fd/3 -r -graft-points music4/=music | builtin_dd of=/dev/cdrom obs=32k seek=87566'
/// ```
///
/// No such line means nothing has been written yet.
pub fn parse_sectors_used(lines: &[&str]) -> Result<f64> {
    for line in lines {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(body) = line.strip_suffix('\'') else {
            continue;
        };
        let Some(index) = body.rfind("seek=") else {
            continue;
        };
        let value = body[index + "seek=".len()..].trim();
        let blocks: f64 = value.parse().map_err(|_| SysError::ParseOutput {
            tool: "growisofs".to_string(),
            reason: format!("unable to parse sectors used out of {value:?}"),
        })?;
        return Ok(blocks * SECTORS_PER_SEEK_BLOCK);
    }

    warn!("Unable to read disc (might not be initialized); returning zero sectors used");
    Ok(0.0)
}
