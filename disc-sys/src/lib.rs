// SPDX-License-Identifier: GPL-3.0-only

//! Fitting backups onto optical media
//!
//! This crate does everything that touches the filesystem or the writer
//! tools:
//! - Expanding image entries and pruning them to a capacity
//! - Knapsack strategies for choosing what fits
//! - Querying CD and DVD writers for the space left on a disc
//! - Checking a disc against a configured capacity limit
//!
//! `mkisofs`, `cdrecord` and `growisofs` are run as child processes; see
//! [`tool`] for how they are located.

pub mod check;
pub mod config;
pub mod error;
pub mod fit;
pub mod image;
pub mod tool;
pub mod writer;

pub use check::{CapacityLimit, CapacityStatus, check_capacity};
pub use config::Config;
pub use error::{Result, SysError};
pub use fit::{FitStrategy, Item, Selection};
pub use image::{CapacityPruner, ImageOptions, ImageSizeEstimator, IsoImage, Mkisofs, PruneError};
pub use writer::{MediaWriter, calculate_capacity, calculate_dvd_capacity};
