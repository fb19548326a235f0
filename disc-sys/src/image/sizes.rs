// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use disc_types::EntryMap;
use tracing::{debug, warn};

use crate::fit::Item;

/// On-disk sizes of expanded image entries, in bytes
///
/// Regular files are measured by their length. Soft links, empty directories
/// and anything else count as zero, since their cost is in the ISO directory
/// records that the overhead estimate already covers. Paths that no longer
/// exist are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeTable {
    sizes: BTreeMap<PathBuf, f64>,
    total_file_bytes: f64,
}

impl SizeTable {
    pub fn build(entries: &EntryMap) -> Self {
        let mut table = SizeTable::default();

        for path in entries.keys() {
            let Some(size) = entry_size(path) else {
                continue;
            };
            table.total_file_bytes += size;
            table.sizes.insert(path.clone(), size);
        }

        debug!(
            "Measured {} entries totalling {} bytes",
            table.sizes.len(),
            table.total_file_bytes
        );
        table
    }

    pub fn get(&self, path: &Path) -> Option<f64> {
        self.sizes.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Sum of every regular file in the table
    pub fn total_file_bytes(&self) -> f64 {
        self.total_file_bytes
    }

    /// Knapsack items in path order
    pub fn items(&self) -> Vec<Item<PathBuf>> {
        self.sizes
            .iter()
            .map(|(path, size)| Item::new(path.clone(), *size))
            .collect()
    }
}

fn entry_size(path: &Path) -> Option<f64> {
    // Soft links whose target is gone are dropped like missing paths.
    if let Err(error) = fs::metadata(path) {
        if error.kind() != ErrorKind::NotFound {
            warn!("Unable to measure [{}]: {}", path.display(), error);
        }
        return None;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_file() => Some(metadata.len() as f64),
        Ok(_) => Some(0.0),
        Err(error) if error.kind() == ErrorKind::NotFound => None,
        Err(error) => {
            warn!("Unable to measure [{}]: {}", path.display(), error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::symlink;

    use super::*;

    #[test]
    fn files_are_measured_and_everything_else_is_free() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path();
        fs::write(root.join("small"), vec![0u8; 100]).expect("write small");
        fs::write(root.join("large"), vec![0u8; 4000]).expect("write large");
        fs::create_dir(root.join("empty")).expect("create empty dir");
        symlink(root.join("large"), root.join("link")).expect("create link");

        let entries = EntryMap::from([
            (root.join("small"), None),
            (root.join("large"), Some("graft".to_string())),
            (root.join("empty"), Some("empty".to_string())),
            (root.join("link"), None),
            (root.join("missing"), None),
        ]);
        let table = SizeTable::build(&entries);

        assert_eq!(table.len(), 4);
        assert_eq!(table.get(&root.join("small")), Some(100.0));
        assert_eq!(table.get(&root.join("large")), Some(4000.0));
        assert_eq!(table.get(&root.join("empty")), Some(0.0));
        assert_eq!(table.get(&root.join("link")), Some(0.0));
        assert_eq!(table.get(&root.join("missing")), None);
        assert_eq!(table.total_file_bytes(), 4100.0);
    }

    #[test]
    fn dangling_links_are_left_out() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path();
        fs::write(root.join("kept"), vec![0u8; 10]).expect("write kept");
        symlink(root.join("gone"), root.join("dangling")).expect("create dangling link");

        let entries = EntryMap::from([(root.join("kept"), None), (root.join("dangling"), None)]);
        let table = SizeTable::build(&entries);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&root.join("dangling")), None);
        assert!(table.items().iter().all(|item| item.key != root.join("dangling")));
        assert_eq!(table.total_file_bytes(), 10.0);
    }

    #[test]
    fn items_follow_path_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path();
        fs::write(root.join("b"), vec![0u8; 2]).expect("write b");
        fs::write(root.join("a"), vec![0u8; 1]).expect("write a");

        let entries = EntryMap::from([(root.join("b"), None), (root.join("a"), None)]);
        let items = SizeTable::build(&entries).items();

        assert_eq!(items, vec![Item::new(root.join("a"), 1.0), Item::new(root.join("b"), 2.0)]);
        assert!(SizeTable::build(&EntryMap::new()).is_empty());
    }
}
