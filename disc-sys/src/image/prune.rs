// SPDX-License-Identifier: GPL-3.0-only

//! Pruning an image down to a capacity
//!
//! The ISO overhead (directory records, path tables, Rock Ridge extensions)
//! is never known exactly up front. The pruner measures it once from a full
//! estimate of the image, packs files into what remains, and then asks the
//! estimator again about the packed candidate. When the candidate still does
//! not fit, the packing target is shrunk by the next back-off factor and the
//! process repeats.

use disc_types::{EntryMap, SizeUnit, convert_size, display_bytes};
use tracing::{debug, info};

use super::error::PruneError;
use super::expand::expand_entries;
use super::sizes::SizeTable;
use crate::error::Result;
use crate::fit::FitStrategy;

/// Fractions of the packing target tried in order
pub const BACKOFF_FACTORS: [f64; 4] = [1.0, 0.98, 0.95, 0.90];

/// Sectors added to every DVD image estimate
///
/// growisofs needs room beyond what `mkisofs -print-size` reports when it
/// appends a session to DVD media.
pub const DVD_PADDING_SECTORS: f64 = 2500.0;

/// Anything that can tell how many bytes an image built from a set of entries would take
pub trait ImageSizeEstimator {
    fn estimate(&self, entries: &EntryMap) -> Result<f64>;
}

impl<T: ImageSizeEstimator + ?Sized> ImageSizeEstimator for &T {
    fn estimate(&self, entries: &EntryMap) -> Result<f64> {
        (**self).estimate(entries)
    }
}

/// Wraps an estimator and adds a fixed number of bytes to every estimate
#[derive(Debug, Clone)]
pub struct PaddedEstimator<E> {
    inner: E,
    padding: f64,
}

impl<E: ImageSizeEstimator> PaddedEstimator<E> {
    pub fn new(inner: E, padding: f64) -> Self {
        Self { inner, padding }
    }

    /// Padding for images going onto DVD media
    pub fn dvd(inner: E) -> Self {
        Self::new(
            inner,
            convert_size(DVD_PADDING_SECTORS, SizeUnit::Sectors, SizeUnit::Bytes),
        )
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }
}

impl<E: ImageSizeEstimator> ImageSizeEstimator for PaddedEstimator<E> {
    fn estimate(&self, entries: &EntryMap) -> Result<f64> {
        Ok(self.inner.estimate(entries)? + self.padding)
    }
}

pub struct CapacityPruner<E> {
    estimator: E,
    strategy: FitStrategy,
}

impl<E: ImageSizeEstimator> CapacityPruner<E> {
    /// A pruner packing with worst fit, which keeps the largest number of entries
    pub fn new(estimator: E) -> Self {
        Self {
            estimator,
            strategy: FitStrategy::WorstFit,
        }
    }

    pub fn with_strategy(mut self, strategy: FitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> FitStrategy {
        self.strategy
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Find a subset of `entries`, expanded to individual files, whose image fits in `capacity` bytes
    pub fn prune(&self, entries: &EntryMap, capacity: f64) -> std::result::Result<EntryMap, PruneError> {
        if entries.is_empty() {
            return Err(PruneError::NoEntries);
        }

        let expanded = expand_entries(entries);
        let table = SizeTable::build(&expanded);

        let estimated = self.estimator.estimate(entries)?;
        let overhead = estimated - table.total_file_bytes();
        debug!(
            "Image estimate {} with {} of files, overhead {}",
            display_bytes(estimated, 2),
            display_bytes(table.total_file_bytes(), 2),
            display_bytes(overhead, 2)
        );
        if overhead > capacity {
            return Err(PruneError::OverheadExceedsCapacity { overhead, capacity });
        }

        let items = table.items();
        let mut last_estimate = estimated;

        for (attempt, factor) in BACKOFF_FACTORS.iter().enumerate() {
            let target = (capacity - overhead) * factor;
            let selection = self.strategy.fit(&items, target);
            if selection.is_empty() || selection.used == 0.0 {
                return Err(PruneError::NothingFits { target });
            }

            let candidate: EntryMap = selection
                .keys
                .iter()
                .filter_map(|path| {
                    expanded
                        .get(path)
                        .map(|graft_point| (path.clone(), graft_point.clone()))
                })
                .collect();

            last_estimate = self.estimator.estimate(&candidate)?;
            debug!(
                "Attempt {} (factor {}): {} of {} entries, estimate {} against {}",
                attempt + 1,
                factor,
                candidate.len(),
                expanded.len(),
                display_bytes(last_estimate, 2),
                display_bytes(capacity, 2)
            );

            if last_estimate <= capacity {
                info!(
                    "Pruned image to {} of {} entries, estimated size {}",
                    candidate.len(),
                    expanded.len(),
                    display_bytes(last_estimate, 2)
                );
                return Ok(candidate);
            }
        }

        Err(PruneError::Exhausted {
            attempts: BACKOFF_FACTORS.len(),
            estimated: last_estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;

    use super::*;

    /// Reports the on-disk size of the entries plus a fixed overhead, remembering every call
    struct FixedOverhead {
        overhead: f64,
        calls: RefCell<Vec<usize>>,
    }

    impl FixedOverhead {
        fn new(overhead: f64) -> Self {
            Self {
                overhead,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageSizeEstimator for FixedOverhead {
        fn estimate(&self, entries: &EntryMap) -> Result<f64> {
            self.calls.borrow_mut().push(entries.len());
            let expanded = expand_entries(entries);
            Ok(SizeTable::build(&expanded).total_file_bytes() + self.overhead)
        }
    }

    #[test]
    fn default_strategy_is_worst_fit() {
        let pruner = CapacityPruner::new(FixedOverhead::new(0.0));
        assert_eq!(pruner.strategy(), FitStrategy::WorstFit);
        let pruner = pruner.with_strategy(FitStrategy::BestFit);
        assert_eq!(pruner.strategy(), FitStrategy::BestFit);
    }

    #[test]
    fn empty_entries_are_rejected_before_estimating() {
        let estimator = FixedOverhead::new(0.0);
        let error = CapacityPruner::new(&estimator)
            .prune(&EntryMap::new(), 1000.0)
            .expect_err("nothing to prune");
        assert!(matches!(error, PruneError::NoEntries));
        assert!(estimator.calls.borrow().is_empty());
    }

    #[test]
    fn first_fitting_attempt_wins() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let dir = temp.path().join("data");
        fs::create_dir(&dir).expect("create data dir");
        fs::write(dir.join("a"), vec![0u8; 10]).expect("write a");
        fs::write(dir.join("b"), vec![0u8; 20]).expect("write b");
        fs::write(dir.join("c"), vec![0u8; 500]).expect("write c");

        let estimator = FixedOverhead::new(5.0);
        let entries = EntryMap::from([(dir.clone(), Some("data".to_string()))]);
        let pruned = CapacityPruner::new(&estimator)
            .prune(&entries, 100.0)
            .expect("prune should succeed");

        assert_eq!(
            pruned,
            EntryMap::from([
                (dir.join("a"), Some("data".to_string())),
                (dir.join("b"), Some("data".to_string())),
            ])
        );
        // one full estimate plus one candidate estimate
        assert_eq!(*estimator.calls.borrow(), vec![1, 2]);
    }

    #[test]
    fn dvd_padding_is_added_to_every_estimate() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let file = temp.path().join("a");
        fs::write(&file, vec![0u8; 100]).expect("write a");
        let entries = EntryMap::from([(file, None)]);

        let inner = FixedOverhead::new(1_000.0);
        let padded = PaddedEstimator::dvd(&inner);
        assert_eq!(padded.padding(), 5_120_000.0);
        assert_eq!(padded.estimate(&entries).expect("estimate"), 5_121_100.0);
        assert_eq!(*inner.calls.borrow(), vec![1]);
    }

    #[test]
    fn dvd_padding_counts_against_capacity() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let file = temp.path().join("a");
        fs::write(&file, vec![0u8; 100]).expect("write a");
        let entries = EntryMap::from([(file, None)]);

        let capacity = 5_000_000.0;
        assert!(CapacityPruner::new(FixedOverhead::new(0.0)).prune(&entries, capacity).is_ok());

        let error = CapacityPruner::new(PaddedEstimator::dvd(FixedOverhead::new(0.0)))
            .prune(&entries, capacity)
            .expect_err("padding exceeds capacity");
        assert!(matches!(
            error,
            PruneError::OverheadExceedsCapacity { overhead, .. } if overhead == 5_120_000.0
        ));
    }
}
