// SPDX-License-Identifier: GPL-3.0-only

//! TOML configuration for the `discfit` front end
//!
//! Every section is optional:
//!
//! ```toml
//! [writer]
//! media = "cdrw74"
//! device = "/dev/cdrw"
//! hardware_id = "0,0,0"
//! multisession = true
//!
//! [image]
//! rock_ridge = true
//! volume_id = "backup"
//!
//! [capacity]
//! max_percentage = 95.0
//! ```

use std::fs;
use std::path::Path;

use disc_types::{MediaType, pretty_to_bytes};
use serde::{Deserialize, Serialize};

use crate::check::CapacityLimit;
use crate::error::{Result, SysError};
use crate::fit::FitStrategy;
use crate::image::ImageOptions;
use crate::writer::validate_hardware_id;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub writer: WriterConfig,
    pub image: ImageConfig,
    pub capacity: Option<CapacityConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    pub media: MediaType,
    /// Device path, used for multisession image builds
    pub device: Option<String>,
    /// Id handed to the writer tools; defaults to `device`
    pub hardware_id: Option<String>,
    pub multisession: bool,
    pub drive_speed: Option<u32>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            media: MediaType::CdRw74,
            device: None,
            hardware_id: None,
            multisession: true,
            drive_speed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    pub rock_ridge: bool,
    pub application_id: Option<String>,
    pub biblio_file: Option<String>,
    pub publisher_id: Option<String>,
    pub preparer_id: Option<String>,
    pub volume_id: Option<String>,
    pub prune_strategy: FitStrategy,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            rock_ridge: true,
            application_id: None,
            biblio_file: None,
            publisher_id: None,
            preparer_id: None,
            volume_id: None,
            prune_strategy: FitStrategy::WorstFit,
        }
    }
}

/// Exactly one of the two limits must be set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityConfig {
    pub max_percentage: Option<f64>,
    pub min_bytes: Option<ByteQuantity>,
}

/// A byte count, either plain (`1048576`) or with a unit (`"100 MB"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ByteQuantity {
    Bytes(f64),
    Pretty(String),
}

impl ByteQuantity {
    pub fn bytes(&self) -> Result<f64> {
        match self {
            ByteQuantity::Bytes(bytes) => Ok(*bytes),
            ByteQuantity::Pretty(pretty) => {
                pretty_to_bytes(pretty).map_err(|error| SysError::InvalidConfig(error.to_string()))
            }
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(raw).map_err(|error| SysError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(hardware_id) = self.hardware_id() {
            validate_hardware_id(hardware_id)?;
        }
        if self.writer.drive_speed == Some(0) {
            return Err(SysError::InvalidConfig("Drive speed must be at least 1".to_string()));
        }
        self.image_options().validate()?;
        self.capacity_limit()?;
        Ok(())
    }

    pub fn hardware_id(&self) -> Option<&str> {
        self.writer
            .hardware_id
            .as_deref()
            .or(self.writer.device.as_deref())
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            device: self.writer.device.clone(),
            boundaries: None,
            use_rock_ridge: self.image.rock_ridge,
            application_id: self.image.application_id.clone(),
            biblio_file: self.image.biblio_file.clone(),
            publisher_id: self.image.publisher_id.clone(),
            preparer_id: self.image.preparer_id.clone(),
            volume_id: self.image.volume_id.clone(),
        }
    }

    /// The configured capacity limit, if there is a `[capacity]` section
    pub fn capacity_limit(&self) -> Result<Option<CapacityLimit>> {
        let Some(capacity) = &self.capacity else {
            return Ok(None);
        };
        match (capacity.max_percentage, &capacity.min_bytes) {
            (Some(percentage), None) => Ok(Some(CapacityLimit::max_percentage(percentage)?)),
            (None, Some(bytes)) => Ok(Some(CapacityLimit::min_bytes(bytes.bytes()?)?)),
            _ => Err(SysError::InvalidConfig(
                "Capacity section must set exactly one of max_percentage or min_bytes".to_string(),
            )),
        }
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .map_err(|error| SysError::InvalidConfig(format!("{}: {}", path.display(), error)))?;
    Config::from_toml_str(&raw)
}
