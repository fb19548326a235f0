// SPDX-License-Identifier: GPL-3.0-only

//! ISO images and fitting them onto media
//!
//! An [`IsoImage`] is a set of filesystem entries, each with an optional
//! graft point, plus the options handed to `mkisofs` when the image is
//! sized or built. Nothing is written until [`Mkisofs::write_image`] runs;
//! until then the image can be estimated and pruned as often as needed.

mod error;
pub mod expand;
pub mod mkisofs;
pub mod prune;
pub mod sizes;

use std::path::Path;

use disc_types::{Boundaries, EntryMap, join_graft_point};
use tracing::debug;

use crate::error::{Result, SysError};

pub use error::PruneError;
pub use expand::{NodeKind, expand_entries};
pub use mkisofs::{Mkisofs, parse_print_size_output};
pub use prune::{
    BACKOFF_FACTORS, CapacityPruner, DVD_PADDING_SECTORS, ImageSizeEstimator, PaddedEstimator,
};
pub use sizes::SizeTable;

/// Settings that shape the image `mkisofs` produces
///
/// `device` and `boundaries` only matter for multisession discs: when both
/// are set the image is built to follow the existing sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    pub device: Option<String>,
    pub boundaries: Option<Boundaries>,
    pub use_rock_ridge: bool,
    pub application_id: Option<String>,
    pub biblio_file: Option<String>,
    pub publisher_id: Option<String>,
    pub preparer_id: Option<String>,
    pub volume_id: Option<String>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            device: None,
            boundaries: None,
            use_rock_ridge: true,
            application_id: None,
            biblio_file: None,
            publisher_id: None,
            preparer_id: None,
            volume_id: None,
        }
    }
}

impl ImageOptions {
    /// Reject identifiers that are set but empty
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("device", &self.device),
            ("application id", &self.application_id),
            ("biblio file", &self.biblio_file),
            ("publisher id", &self.publisher_id),
            ("preparer id", &self.preparer_id),
            ("volume id", &self.volume_id),
        ];
        for (name, value) in fields {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(SysError::InvalidConfig(format!("The {name} must be a non-empty string")));
            }
        }
        Ok(())
    }

    fn general_args(&self) -> Vec<String> {
        let flags = [
            ("-A", &self.application_id),
            ("-biblio", &self.biblio_file),
            ("-publisher", &self.publisher_id),
            ("-p", &self.preparer_id),
            ("-V", &self.volume_id),
        ];
        let mut args = Vec::new();
        for (flag, value) in flags {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        args
    }

    fn multisession_args(&self) -> Vec<String> {
        match (&self.device, self.boundaries) {
            (Some(device), Some(boundaries)) => vec![
                "-C".to_string(),
                boundaries.to_string(),
                "-M".to_string(),
                device.clone(),
            ],
            _ => Vec::new(),
        }
    }

    /// Arguments for `mkisofs -print-size`, which reports the image size in sectors
    pub fn size_args(&self, entries: &EntryMap) -> Vec<String> {
        let mut args = self.general_args();
        args.push("-print-size".to_string());
        args.push("-graft-points".to_string());
        if self.use_rock_ridge {
            args.push("-r".to_string());
        }
        args.extend(self.multisession_args());
        args.extend(path_specs(entries));
        args
    }

    /// Arguments for writing the image to `image_path`
    pub fn write_args(&self, entries: &EntryMap, image_path: &Path) -> Vec<String> {
        let mut args = self.general_args();
        args.push("-graft-points".to_string());
        if self.use_rock_ridge {
            args.push("-r".to_string());
        }
        args.push("-o".to_string());
        args.push(image_path.display().to_string());
        args.extend(self.multisession_args());
        args.extend(path_specs(entries));
        args
    }
}

/// One `mkisofs` path spec per entry: the bare path, or `graft/=path` when grafted
pub fn path_specs(entries: &EntryMap) -> Vec<String> {
    entries
        .iter()
        .map(|(path, graft_point)| match graft_point {
            None => path.display().to_string(),
            Some(graft) => format!("{}/={}", graft.trim_matches('/'), path.display()),
        })
        .collect()
}

/// The entries making up an ISO image, with the options used to size and build it
#[derive(Debug, Clone, Default)]
pub struct IsoImage {
    options: ImageOptions,
    graft_point: Option<String>,
    entries: EntryMap,
}

impl IsoImage {
    pub fn new(options: ImageOptions) -> Self {
        Self {
            options,
            graft_point: None,
            entries: EntryMap::new(),
        }
    }

    /// Graft point applied to entries added without their own
    ///
    /// Only affects entries added afterwards.
    pub fn set_graft_point(&mut self, graft_point: Option<String>) -> Result<()> {
        if graft_point.as_deref().is_some_and(str::is_empty) {
            return Err(SysError::InvalidEntry("The graft point must be a non-empty string".to_string()));
        }
        self.graft_point = graft_point;
        Ok(())
    }

    pub fn graft_point(&self) -> Option<&str> {
        self.graft_point.as_deref()
    }

    pub fn options(&self) -> &ImageOptions {
        &self.options
    }

    pub fn entries(&self) -> &EntryMap {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a file or directory to the image
    ///
    /// Directories are placed under a directory of their own name, below the
    /// graft point if there is one. With `contents_only` the directory's
    /// contents go directly under the graft point instead, which is plain
    /// `mkisofs` behavior. Soft links are refused, as are paths already in
    /// the image unless `override_existing` is set.
    pub fn add_entry(
        &mut self,
        path: &Path,
        graft_point: Option<&str>,
        override_existing: bool,
        contents_only: bool,
    ) -> Result<()> {
        if !override_existing && self.entries.contains_key(path) {
            return Err(SysError::InvalidEntry(format!(
                "Path has already been added to the image: {}",
                path.display()
            )));
        }

        let graft = graft_point.or(self.graft_point.as_deref());
        let graft = match NodeKind::of(path) {
            NodeKind::Symlink => {
                return Err(SysError::InvalidEntry(format!("Path must not be a link: {}", path.display())));
            }
            NodeKind::Dir | NodeKind::EmptyDir => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match (graft, contents_only) {
                    (Some(graft), true) => Some(graft.to_string()),
                    (Some(graft), false) => Some(join_graft_point([graft, name.as_str()])),
                    (None, true) => None,
                    (None, false) => Some(name),
                }
            }
            NodeKind::File => graft.map(str::to_string),
            NodeKind::Other | NodeKind::Missing => {
                return Err(SysError::InvalidEntry(format!(
                    "Path must be a file or a directory: {}",
                    path.display()
                )));
            }
        };

        debug!("Adding [{}] to image with graft point {:?}", path.display(), graft);
        self.entries.insert(path.to_path_buf(), graft);
        Ok(())
    }

    /// Size of the image in bytes, as reported by the estimator
    pub fn estimated_size<E: ImageSizeEstimator>(&self, estimator: &E) -> Result<f64> {
        if self.entries.is_empty() {
            return Err(SysError::InvalidEntry("Image does not contain any entries".to_string()));
        }
        estimator.estimate(&self.entries)
    }

    /// Shrink the image to fit in `capacity` bytes and return its new estimated size
    ///
    /// The entries are replaced by the pruned, fully expanded set only on
    /// success; on any error the image is left as it was.
    pub fn prune_image<E: ImageSizeEstimator>(
        &mut self,
        capacity: f64,
        estimator: &E,
    ) -> std::result::Result<f64, PruneError> {
        self.prune_image_with(&CapacityPruner::new(estimator), capacity)
    }

    /// Like [`IsoImage::prune_image`], with a pruner configured by the caller
    pub fn prune_image_with<E: ImageSizeEstimator>(
        &mut self,
        pruner: &CapacityPruner<E>,
        capacity: f64,
    ) -> std::result::Result<f64, PruneError> {
        if self.entries.is_empty() {
            return Err(PruneError::NoEntries);
        }
        let pruned = pruner.prune(&self.entries, capacity)?;
        self.entries = pruned;
        Ok(self.estimated_size(pruner.estimator())?)
    }
}
