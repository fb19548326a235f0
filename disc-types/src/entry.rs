//! Image entry types
//!
//! An image is described by a map from filesystem path to an optional graft
//! point, the relative location under which the path appears inside the image.
//! `None` means the entry is placed at the image root.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Filesystem path → optional graft point
///
/// Ordered by path so that anything derived from the map is deterministic.
pub type EntryMap = BTreeMap<PathBuf, Option<String>>;

/// Join graft point components with `/`, trimming separators from each part
///
/// Empty components are dropped, so joining `"base"` with an empty
/// subdirectory yields `"base"` rather than `"base/"`.
pub fn join_graft_point<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter_map(|part| {
            let trimmed = part.as_ref().trim_matches('/');
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}
