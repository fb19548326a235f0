// SPDX-License-Identifier: GPL-3.0-only

//! Canonical value types for optical media capacity management
//!
//! These models are shared by every layer of discfit:
//!
//! - **disc-sys**: computes them from filesystem state and writer tool output
//! - **discfit** (binary): renders them for the operator
//!
//! ## Model
//!
//! - `MediaDefinition` → fixed sector geometry for one media type
//! - `MediaCapacity` → used/available snapshot computed from session boundaries
//! - `EntryMap` → filesystem paths mapped to their optional image graft points
//!
//! All sizes that come from media geometry are expressed in ISO sectors of
//! [`ISO_SECTOR_SIZE`] bytes until they are converted for display.

pub mod common;
pub mod entry;
pub mod media;

pub use common::{
    BYTES_PER_GBYTE, BYTES_PER_KBYTE, BYTES_PER_MBYTE, ISO_SECTOR_SIZE, SizeUnit, bytes_to_pretty,
    convert_size, display_bytes, pretty_to_bytes,
};
pub use entry::{EntryMap, join_graft_point};
pub use media::{Boundaries, MediaCapacity, MediaDefinition, MediaType};
