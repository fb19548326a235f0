// SPDX-License-Identifier: GPL-3.0-only

//! Remaining space on a disc
//!
//! A CD session costs more than its data: the first session on a disc needs
//! an initial lead-in and every later one needs its own session lead-in.
//! Multisession boundaries say where the next session would start, which is
//! everything already used, so space available is what lies past that
//! point once the lead-in is set aside.

use disc_types::{Boundaries, MediaCapacity, MediaDefinition, SizeUnit, convert_size};
use tracing::debug;

fn sectors_to_bytes(sectors: f64) -> f64 {
    convert_size(sectors, SizeUnit::Sectors, SizeUnit::Bytes)
}

/// Capacity of CD media given the multisession boundaries of the disc in the drive
///
/// No boundaries, or boundaries ending at sector zero, mean the disc is
/// unused (or will be overwritten) and the whole disc less the initial
/// lead-in is available. Only the end boundary matters otherwise.
pub fn calculate_capacity(media: &MediaDefinition, boundaries: Option<Boundaries>) -> MediaCapacity {
    let capacity = match boundaries {
        Some(boundaries) if boundaries.end != 0 => {
            let end = boundaries.end as f64;
            let available = (media.capacity() - end - media.lead_in()).max(0.0);
            MediaCapacity::new(sectors_to_bytes(end), sectors_to_bytes(available), Some(boundaries))
        }
        _ => {
            let available = (media.capacity() - media.initial_lead_in()).max(0.0);
            MediaCapacity::new(0.0, sectors_to_bytes(available), boundaries)
        }
    };

    debug!(
        "Capacity of {} with boundaries {:?}: used {} bytes, available {} bytes",
        media.media_type(),
        boundaries,
        capacity.bytes_used(),
        capacity.bytes_available()
    );
    capacity
}

/// Capacity of DVD media given the sectors `growisofs` reports as used
pub fn calculate_dvd_capacity(media: &MediaDefinition, sectors_used: f64) -> MediaCapacity {
    let available = (media.capacity() - sectors_used).max(0.0);
    let capacity = MediaCapacity::new(sectors_to_bytes(sectors_used), sectors_to_bytes(available), None);

    debug!(
        "Capacity of {} with {} sectors used: available {} bytes",
        media.media_type(),
        sectors_used,
        capacity.bytes_available()
    );
    capacity
}
