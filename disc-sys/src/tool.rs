// SPDX-License-Identifier: GPL-3.0-only

//! External command resolution and execution
//!
//! The writer tools have been forked and renamed over the years (`cdrecord`
//! versus `wodim`, `mkisofs` versus `genisoimage`), so every lookup takes a
//! list of candidate names and uses the first one found in `PATH`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use which::which;

use crate::error::{Result, SysError};

pub const MKISOFS_COMMANDS: &[&str] = &["mkisofs", "genisoimage"];
pub const CDRECORD_COMMANDS: &[&str] = &["cdrecord", "wodim"];
pub const GROWISOFS_COMMANDS: &[&str] = &["growisofs"];

/// Captured result of running an external tool
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }

    /// Standard output lines followed by standard error lines
    pub fn all_lines(&self) -> Vec<&str> {
        self.stdout.lines().chain(self.stderr.lines()).collect()
    }
}

/// Find the first candidate present in `PATH`
pub fn resolve_command(candidates: &[&str]) -> Result<PathBuf> {
    candidates
        .iter()
        .find_map(|name| which(name).ok())
        .ok_or_else(|| SysError::ToolNotFound(candidates.join(" or ")))
}

pub fn render(command: &Path, args: &[String]) -> String {
    if args.is_empty() {
        command.display().to_string()
    } else {
        format!("{} {}", command.display(), args.join(" "))
    }
}

/// Run a command to completion, capturing its output
///
/// A non-zero exit status is not an error here; callers decide whether an
/// unreadable disc or a failed dry run is fatal.
pub fn execute(command: &Path, args: &[String]) -> Result<ToolOutput> {
    let rendered = render(command, args);
    debug!("Executing [{}]", rendered);

    let output = Command::new(command)
        .args(args)
        .output()
        .map_err(|error| SysError::CommandFailed {
            command: rendered.clone(),
            reason: error.to_string(),
        })?;

    Ok(ToolOutput {
        command: rendered,
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn formats_command_context() {
        let args = vec!["-msinfo".to_string(), "dev=0,0,0".to_string()];
        let rendered = render(Path::new("/usr/bin/cdrecord"), &args);
        assert_eq!(rendered, "/usr/bin/cdrecord -msinfo dev=0,0,0");
        assert_eq!(render(Path::new("eject"), &[]), "eject");
    }

    #[test]
    fn missing_tools_name_every_candidate() {
        let error = resolve_command(&["discfit-no-such-tool", "discfit-nor-this-one"])
            .expect_err("tool should not exist");
        assert!(matches!(error, SysError::ToolNotFound(_)));
        assert!(error.to_string().contains("discfit-no-such-tool or discfit-nor-this-one"));
    }

    #[test]
    fn captures_output_and_exit_status() {
        let shell = resolve_command(&["sh"]).expect("sh should be installed");
        let args = vec!["-c".to_string(), "echo 10,20; exit 3".to_string()];
        let output = execute(&shell, &args).expect("command should run");
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.lines(), vec!["10,20"]);
    }

    #[test]
    fn all_lines_include_standard_error() {
        let shell = resolve_command(&["sh"]).expect("sh should be installed");
        let args = vec!["-c".to_string(), "echo out; echo err >&2".to_string()];
        let output = execute(&shell, &args).expect("command should run");
        assert!(output.success());
        assert_eq!(output.lines(), vec!["out"]);
        assert_eq!(output.all_lines(), vec!["out", "err"]);
    }
}
