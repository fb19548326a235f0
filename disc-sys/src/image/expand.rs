// SPDX-License-Identifier: GPL-3.0-only

//! Expansion of image entries into their individual files
//!
//! Pruning has to decide file by file, so every directory entry is replaced
//! by the files and soft links beneath it. Graft points are carried down so
//! that each expanded item lands in the same place in the image as it would
//! have when its directory was added whole: a file nested at `dir2/file1`
//! under a directory grafted at `base/dir1` gets the graft point
//! `base/dir1/dir2`.
//!
//! Soft links are kept as leaves and never traversed. Empty directories have
//! no files to carry them into the image, so each one is kept as its own
//! entry with a graft point ending in its own name.

use std::fs;
use std::path::Path;

use disc_types::{EntryMap, join_graft_point};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What a filesystem node looks like without following soft links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Symlink,
    EmptyDir,
    Dir,
    /// Devices, sockets, fifos
    Other,
    Missing,
}

impl NodeKind {
    pub fn of(path: &Path) -> NodeKind {
        match fs::symlink_metadata(path) {
            Ok(metadata) => Self::from_file_type(path, metadata.file_type()),
            Err(_) => NodeKind::Missing,
        }
    }

    fn from_file_type(path: &Path, file_type: fs::FileType) -> NodeKind {
        if file_type.is_symlink() {
            NodeKind::Symlink
        } else if file_type.is_file() {
            NodeKind::File
        } else if file_type.is_dir() {
            match fs::read_dir(path) {
                Ok(mut children) => {
                    if children.next().is_none() {
                        NodeKind::EmptyDir
                    } else {
                        NodeKind::Dir
                    }
                }
                Err(_) => NodeKind::Dir,
            }
        } else {
            NodeKind::Other
        }
    }
}

/// Expand every directory in `entries` into the files, links and empty directories it contains
///
/// Files and links given directly are passed through with their graft
/// point. Entries missing from disk are dropped. When two entries expand to
/// the same path, the later one wins.
pub fn expand_entries(entries: &EntryMap) -> EntryMap {
    let mut expanded = EntryMap::new();

    for (path, graft_point) in entries {
        match NodeKind::of(path) {
            NodeKind::File | NodeKind::Symlink => {
                expanded.insert(path.clone(), graft_point.clone());
            }
            NodeKind::Dir | NodeKind::EmptyDir => {
                expand_directory(path, graft_point.as_deref(), &mut expanded);
            }
            NodeKind::Other | NodeKind::Missing => {
                debug!("Skipping [{}]: not a file or directory on disk", path.display());
            }
        }
    }

    expanded
}

fn expand_directory(root: &Path, graft_point: Option<&str>, expanded: &mut EntryMap) {
    let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();

    for item in walker {
        let item = match item {
            Ok(item) => item,
            Err(error) => {
                warn!("Skipping unreadable entry under [{}]: {}", root.display(), error);
                continue;
            }
        };

        let path = item.path();
        let subdir = path
            .strip_prefix(root)
            .ok()
            .and_then(Path::parent)
            .map(|parent| parent.to_string_lossy().into_owned())
            .unwrap_or_default();

        match NodeKind::from_file_type(path, item.file_type()) {
            NodeKind::File | NodeKind::Symlink => {
                let graft = graft_point.map(|graft| join_graft_point([graft, subdir.as_str()]));
                expanded.insert(path.to_path_buf(), graft);
            }
            NodeKind::EmptyDir => {
                let name = item.file_name().to_string_lossy();
                let graft = match graft_point {
                    Some(graft) => join_graft_point([graft, subdir.as_str(), &*name]),
                    None => name.into_owned(),
                };
                expanded.insert(path.to_path_buf(), Some(graft));
            }
            NodeKind::Dir | NodeKind::Other | NodeKind::Missing => {}
        }
    }
}
