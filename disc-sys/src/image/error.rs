// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

use crate::error::SysError;

/// Reasons an image could not be pruned to fit a capacity
///
/// Every variant leaves the caller's entries untouched.
#[derive(Error, Debug)]
pub enum PruneError {
    #[error("Image does not contain any entries")]
    NoEntries,

    #[error("Required overhead ({overhead:.0} bytes) exceeds available capacity ({capacity:.0} bytes)")]
    OverheadExceedsCapacity { overhead: f64, capacity: f64 },

    #[error("Unable to fit any entries into {target:.0} bytes")]
    NothingFits { target: f64 },

    #[error("Unable to prune image to fit the capacity after {attempts} tries (last estimate {estimated:.0} bytes)")]
    Exhausted { attempts: usize, estimated: f64 },

    #[error("Image size estimate failed: {0}")]
    Estimate(#[from] SysError),
}

impl PruneError {
    /// Whether the image was too large for the capacity, as opposed to unusable input or a tool failure
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            PruneError::OverheadExceedsCapacity { .. }
                | PruneError::NothingFits { .. }
                | PruneError::Exhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_are_distinguished() {
        assert!(!PruneError::NoEntries.is_capacity_error());
        assert!(PruneError::NothingFits { target: 10.0 }.is_capacity_error());
        let tool = PruneError::from(SysError::ToolNotFound("mkisofs".to_string()));
        assert!(!tool.is_capacity_error());
        assert_eq!(tool.to_string(), "Image size estimate failed: Required tool not found: mkisofs");
    }

    #[test]
    fn messages_include_the_numbers() {
        let error = PruneError::OverheadExceedsCapacity {
            overhead: 4096.0,
            capacity: 2048.0,
        };
        assert_eq!(
            error.to_string(),
            "Required overhead (4096 bytes) exceeds available capacity (2048 bytes)"
        );
        let error = PruneError::Exhausted {
            attempts: 4,
            estimated: 12.4,
        };
        assert!(error.to_string().contains("after 4 tries"));
    }
}
