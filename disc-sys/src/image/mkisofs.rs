// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use disc_types::{EntryMap, SizeUnit, convert_size};
use tracing::{debug, info};

use super::ImageOptions;
use super::prune::ImageSizeEstimator;
use crate::error::{Result, SysError};
use crate::tool::{MKISOFS_COMMANDS, ToolOutput, execute, resolve_command};

/// `mkisofs` (or `genisoimage`) driven with a fixed set of image options
#[derive(Debug, Clone)]
pub struct Mkisofs {
    binary_path: PathBuf,
    options: ImageOptions,
}

impl Mkisofs {
    pub fn new(options: ImageOptions) -> Result<Self> {
        let binary_path = resolve_command(MKISOFS_COMMANDS)?;
        debug!("Using {} for image builds", binary_path.display());
        Ok(Self::with_binary(binary_path, options))
    }

    pub fn with_binary(binary_path: PathBuf, options: ImageOptions) -> Self {
        Self { binary_path, options }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn options(&self) -> &ImageOptions {
        &self.options
    }

    /// Write an image holding `entries` to `image_path`
    pub fn write_image(&self, entries: &EntryMap, image_path: &Path) -> Result<()> {
        if entries.is_empty() {
            return Err(SysError::InvalidEntry("Image does not contain any entries".to_string()));
        }
        let args = self.options.write_args(entries, image_path);
        let output = execute(&self.binary_path, &args)?;
        if !output.success() {
            return Err(failed(&output, "build image"));
        }
        info!("Wrote image with {} entries to {}", entries.len(), image_path.display());
        Ok(())
    }
}

impl ImageSizeEstimator for Mkisofs {
    fn estimate(&self, entries: &EntryMap) -> Result<f64> {
        let args = self.options.size_args(entries);
        let output = execute(&self.binary_path, &args)?;
        if !output.success() {
            return Err(failed(&output, "estimate size"));
        }
        parse_print_size_output(&output.lines())
    }
}

fn failed(output: &ToolOutput, action: &str) -> SysError {
    SysError::CommandFailed {
        command: output.command.clone(),
        reason: format!(
            "error ({}) executing mkisofs command to {}",
            output.exit_code.unwrap_or(-1),
            action
        ),
    }
}

/// Convert `mkisofs -print-size` output, a single sector count, to bytes
pub fn parse_print_size_output(lines: &[&str]) -> Result<f64> {
    let parse_error = || SysError::ParseOutput {
        tool: "mkisofs".to_string(),
        reason: format!("expected a single sector count, got {lines:?}"),
    };

    let [line] = lines else {
        return Err(parse_error());
    };
    let sectors: f64 = line.trim().parse().map_err(|_| parse_error())?;
    Ok(convert_size(sectors, SizeUnit::Sectors, SizeUnit::Bytes))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[test]
    fn print_size_output_is_sectors() {
        assert_eq!(parse_print_size_output(&["332800"]).expect("parse"), 681_574_400.0);
        assert_eq!(parse_print_size_output(&[" 16 "]).expect("parse"), 32768.0);
        assert!(parse_print_size_output(&[]).is_err());
        assert!(parse_print_size_output(&["16", "17"]).is_err());
        assert!(parse_print_size_output(&["sixteen"]).is_err());
    }

    /// A stand-in for mkisofs that prints a fixed sector count
    fn fake_mkisofs(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("mkisofs");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        path
    }

    #[test]
    fn estimator_runs_the_size_command() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let binary = fake_mkisofs(temp.path(), "echo 10");
        let mkisofs = Mkisofs::with_binary(binary, ImageOptions::default());

        let entries = EntryMap::from([(temp.path().to_path_buf(), None)]);
        assert_eq!(mkisofs.estimate(&entries).expect("estimate"), 20480.0);
    }

    #[test]
    fn estimator_failures_are_errors() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let binary = fake_mkisofs(temp.path(), "echo 10; exit 1");
        let mkisofs = Mkisofs::with_binary(binary, ImageOptions::default());

        let entries = EntryMap::from([(temp.path().to_path_buf(), None)]);
        let error = mkisofs.estimate(&entries).expect_err("non-zero exit");
        assert!(matches!(error, SysError::CommandFailed { .. }));
    }

    #[test]
    fn empty_images_are_not_written() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let binary = fake_mkisofs(temp.path(), "exit 0");
        let mkisofs = Mkisofs::with_binary(binary, ImageOptions::default());

        let error = mkisofs
            .write_image(&EntryMap::new(), &temp.path().join("out.iso"))
            .expect_err("no entries");
        assert!(matches!(error, SysError::InvalidEntry(_)));
    }
}
