// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("Command failed: {command}: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Unable to parse {tool} output: {reason}")]
    ParseOutput { tool: String, reason: String },

    #[error("Invalid image entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
