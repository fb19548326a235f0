// SPDX-License-Identifier: GPL-3.0-only

//! Knapsack ("fit") algorithms
//!
//! Each strategy takes a list of sized items and a container capacity and
//! picks a subset of items whose sizes sum to no more than the capacity.
//! Sizes and capacity are unitless here; the image code uses bytes.
//!
//! All strategies walk some ordering of the items, accept an item when it
//! still fits in the remaining capacity, and stop early once the capacity is
//! met exactly. They differ only in the ordering:
//!
//! - first fit uses the items as given, and is the fastest since nothing is sorted
//! - best fit goes largest first, using the fewest items to approach capacity
//! - worst fit goes smallest first, including as many items as possible
//! - alternate fit alternates between the small and large ends of the sorted list
//!
//! Sorting is stable, so items of equal size keep their input order.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// An item that can be placed into the container
#[derive(Debug, Clone, PartialEq)]
pub struct Item<K> {
    pub key: K,
    pub size: f64,
}

impl<K> Item<K> {
    pub fn new(key: K, size: f64) -> Self {
        Self { key, size }
    }
}

/// Keys chosen by a strategy, in the order they were accepted, and the capacity they use
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<K> {
    pub keys: Vec<K>,
    pub used: f64,
}

impl<K> Selection<K> {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
    FirstFit,
    BestFit,
    /// Used when pruning images, since it keeps the most entries
    #[default]
    WorstFit,
    AlternateFit,
}

impl FitStrategy {
    pub const ALL: [FitStrategy; 4] = [
        FitStrategy::FirstFit,
        FitStrategy::BestFit,
        FitStrategy::WorstFit,
        FitStrategy::AlternateFit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FitStrategy::FirstFit => "first fit",
            FitStrategy::BestFit => "best fit",
            FitStrategy::WorstFit => "worst fit",
            FitStrategy::AlternateFit => "alternate fit",
        }
    }

    /// Select items for a container of the given capacity
    ///
    /// A capacity of zero selects nothing, not even zero-sized items. An item
    /// larger than the capacity is never selected.
    pub fn fit<K: Clone>(self, items: &[Item<K>], capacity: f64) -> Selection<K> {
        match self {
            FitStrategy::FirstFit => first_fit(items, capacity),
            FitStrategy::BestFit => best_fit(items, capacity),
            FitStrategy::WorstFit => worst_fit(items, capacity),
            FitStrategy::AlternateFit => alternate_fit(items, capacity),
        }
    }
}

/// Running state shared by every strategy
struct Packer<K> {
    keys: Vec<K>,
    used: f64,
    remaining: f64,
}

impl<K: Clone> Packer<K> {
    fn new(capacity: f64) -> Self {
        Self {
            keys: Vec::new(),
            used: 0.0,
            remaining: capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.remaining == 0.0
    }

    fn offer(&mut self, item: &Item<K>) {
        if self.remaining - item.size >= 0.0 {
            self.keys.push(item.key.clone());
            self.used += item.size;
            self.remaining -= item.size;
        }
    }

    fn pack<'a, I>(mut self, order: I) -> Selection<K>
    where
        I: IntoIterator<Item = &'a Item<K>>,
        K: 'a,
    {
        for item in order {
            if self.is_full() {
                break;
            }
            self.offer(item);
        }
        self.finish()
    }

    fn finish(self) -> Selection<K> {
        Selection {
            keys: self.keys,
            used: self.used,
        }
    }
}

fn sorted_ascending<K>(items: &[Item<K>]) -> Vec<&Item<K>> {
    let mut sorted: Vec<&Item<K>> = items.iter().collect();
    sorted.sort_by(|left, right| left.size.total_cmp(&right.size));
    sorted
}

pub fn first_fit<K: Clone>(items: &[Item<K>], capacity: f64) -> Selection<K> {
    Packer::new(capacity).pack(items)
}

pub fn best_fit<K: Clone>(items: &[Item<K>], capacity: f64) -> Selection<K> {
    let mut sorted: Vec<&Item<K>> = items.iter().collect();
    sorted.sort_by(|left, right| right.size.total_cmp(&left.size));
    Packer::new(capacity).pack(sorted)
}

pub fn worst_fit<K: Clone>(items: &[Item<K>], capacity: f64) -> Selection<K> {
    Packer::new(capacity).pack(sorted_ascending(items))
}

pub fn alternate_fit<K: Clone>(items: &[Item<K>], capacity: f64) -> Selection<K> {
    let sorted = sorted_ascending(items);
    let (front, back) = sorted.split_at(sorted.len() / 2);
    let mut front = front.iter();
    let mut back = back.iter().rev();

    let mut packer = Packer::new(capacity);
    while packer.remaining > 0.0 {
        let small = front.next();
        let large = back.next();
        if small.is_none() && large.is_none() {
            break;
        }
        if let Some(item) = small {
            packer.offer(item);
        }
        if let Some(item) = large {
            packer.offer(item);
        }
    }
    packer.finish()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn items(sizes: &[f64]) -> Vec<Item<String>> {
        sizes
            .iter()
            .enumerate()
            .map(|(index, size)| Item::new(format!("item{index:02}"), *size))
            .collect()
    }

    fn total(items: &[Item<String>], keys: &[String]) -> f64 {
        items
            .iter()
            .filter(|item| keys.contains(&item.key))
            .map(|item| item.size)
            .sum()
    }

    #[rstest]
    fn empty_inputs_select_nothing(#[values(
        FitStrategy::FirstFit,
        FitStrategy::BestFit,
        FitStrategy::WorstFit,
        FitStrategy::AlternateFit
    )] strategy: FitStrategy) {
        let selection = strategy.fit::<String>(&[], 100.0);
        assert!(selection.is_empty());
        assert_eq!(selection.used, 0.0);

        let selection = strategy.fit(&items(&[0.0, 0.0, 1.0]), 0.0);
        assert!(selection.is_empty(), "zero capacity fits nothing, even zero-sized items");
        assert_eq!(selection.used, 0.0);
    }

    #[rstest]
    fn never_exceeds_capacity(#[values(
        FitStrategy::FirstFit,
        FitStrategy::BestFit,
        FitStrategy::WorstFit,
        FitStrategy::AlternateFit
    )] strategy: FitStrategy, #[values(0.0, 1.0, 7.5, 50.0, 333.0, 1000.0, 5000.0)] capacity: f64) {
        let list = items(&[1.0, 900.0, 3.0, 250.0, 47.0, 47.0, 12.5, 0.0, 600.0, 99.0, 1500.0]);
        let selection = strategy.fit(&list, capacity);
        assert!(selection.used <= capacity);
        assert_eq!(selection.used, total(&list, &selection.keys));
    }

    #[rstest]
    fn oversized_items_are_never_selected(#[values(
        FitStrategy::FirstFit,
        FitStrategy::BestFit,
        FitStrategy::WorstFit,
        FitStrategy::AlternateFit
    )] strategy: FitStrategy) {
        let list = items(&[100.0, 200.0, 5_000_000.0]);
        let selection = strategy.fit(&list, 4_999_999.0);
        assert_eq!(selection.keys, {
            let mut keys = vec!["item00".to_string(), "item01".to_string()];
            if strategy == FitStrategy::BestFit {
                keys.reverse();
            }
            keys
        });
        assert_eq!(selection.used, 300.0);
    }

    #[test]
    fn first_fit_keeps_input_order_and_skips_misfits() {
        let list = items(&[60.0, 50.0, 30.0, 10.0]);
        let selection = first_fit(&list, 100.0);
        assert_eq!(selection.keys, vec!["item00", "item02", "item03"]);
        assert_eq!(selection.used, 100.0);
    }

    #[test]
    fn first_fit_stops_once_capacity_is_met_exactly() {
        let list = items(&[40.0, 60.0, 0.0, 0.0]);
        let selection = first_fit(&list, 100.0);
        assert_eq!(selection.keys, vec!["item00", "item01"]);
    }

    #[test]
    fn best_fit_prefers_large_items() {
        let list = items(&[10.0, 20.0, 30.0, 40.0, 55.0]);
        let selection = best_fit(&list, 100.0);
        assert_eq!(selection.keys, vec!["item04", "item03"]);
        assert_eq!(selection.used, 95.0);
    }

    #[test]
    fn worst_fit_includes_the_most_items() {
        let list = items(&[55.0, 40.0, 30.0, 20.0, 10.0]);
        let selection = worst_fit(&list, 100.0);
        assert_eq!(selection.keys, vec!["item04", "item03", "item02", "item01"]);
        assert_eq!(selection.used, 100.0);
    }

    #[test]
    fn worst_fit_breaks_ties_by_input_order() {
        let list = items(&[5.0, 3.0, 5.0, 3.0, 5.0]);
        let selection = worst_fit(&list, 13.0);
        assert_eq!(selection.keys, vec!["item01", "item03", "item00"]);
        assert_eq!(selection.used, 11.0);
    }

    #[test]
    fn alternate_fit_works_from_both_ends() {
        // sorted ascending: 1, 2, 3 | 70, 80, 90 ; back half walked from the largest
        let list = items(&[80.0, 3.0, 1.0, 90.0, 2.0, 70.0]);
        let selection = alternate_fit(&list, 100.0);
        assert_eq!(selection.keys, vec!["item02", "item03", "item04", "item01"]);
        assert_eq!(selection.used, 96.0);
    }

    #[test]
    fn alternate_fit_handles_odd_lengths() {
        // front gets the single smallest item, back gets the remaining two
        let list = items(&[5.0, 1.0, 3.0]);
        let selection = alternate_fit(&list, 6.0);
        assert_eq!(selection.keys, vec!["item01", "item00"]);
        assert_eq!(selection.used, 6.0);
    }

    #[test]
    fn strategies_keep_all_items_when_everything_fits() {
        let list = items(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        for strategy in FitStrategy::ALL {
            let selection = strategy.fit(&list, 1000.0);
            assert_eq!(selection.keys.len(), list.len(), "{}", strategy.as_str());
            assert_eq!(selection.used, 28.0);
        }
    }
}
