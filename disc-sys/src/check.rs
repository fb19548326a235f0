// SPDX-License-Identifier: GPL-3.0-only

//! Warning when a disc is close to full

use disc_types::{MediaCapacity, display_bytes};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{Result, SysError};

/// When a disc should be considered full
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityLimit {
    /// Utilization above this percentage
    MaxPercentage(f64),
    /// Fewer bytes than this available
    MinBytes(f64),
}

impl CapacityLimit {
    pub fn max_percentage(percentage: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(SysError::InvalidConfig(format!(
                "Percentage must be between 0 and 100: {percentage}"
            )));
        }
        Ok(CapacityLimit::MaxPercentage(percentage))
    }

    pub fn min_bytes(bytes: f64) -> Result<Self> {
        if bytes < 0.0 {
            return Err(SysError::InvalidConfig(format!("Minimum bytes must not be negative: {bytes}")));
        }
        Ok(CapacityLimit::MinBytes(bytes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    WithinLimit,
    LimitReached,
}

impl CapacityStatus {
    pub fn limit_reached(self) -> bool {
        self == CapacityStatus::LimitReached
    }
}

pub fn check_capacity(capacity: &MediaCapacity, limit: &CapacityLimit) -> CapacityStatus {
    debug!("Media capacity: {}", capacity);

    match *limit {
        CapacityLimit::MaxPercentage(percentage) if capacity.utilized() > percentage => {
            error!(
                "Media has reached capacity limit of {}%: {:.2}% utilized",
                percentage,
                capacity.utilized()
            );
            CapacityStatus::LimitReached
        }
        CapacityLimit::MinBytes(bytes) if capacity.bytes_available() < bytes => {
            error!(
                "Media has reached capacity limit of {}: only {} available",
                display_bytes(bytes, 2),
                display_bytes(capacity.bytes_available(), 2)
            );
            CapacityStatus::LimitReached
        }
        _ => CapacityStatus::WithinLimit,
    }
}
