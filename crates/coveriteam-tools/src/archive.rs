//! Zip archives through the system `zip` executable.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use coveriteam_contracts::error::{CoveriError, CoveriResult};
use coveriteam_core::traits::Archiver;

#[derive(Debug, Clone)]
pub struct ZipArchiver {
    program: PathBuf,
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self {
            program: PathBuf::from("zip"),
        }
    }
}

impl ZipArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another `zip`-compatible executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `true` when the configured executable can be found.
    pub fn is_available(&self) -> bool {
        (self.program.is_absolute() && self.program.is_file())
            || self
                .program
                .to_str()
                .and_then(crate::runner::find_on_path)
                .is_some()
    }

    fn failure(&self, reason: String) -> CoveriError {
        CoveriError::ToolInvocation {
            tool: self.program.display().to_string(),
            reason,
        }
    }
}

impl Archiver for ZipArchiver {
    fn create_archive(&self, src_dir: &Path, dest_zip: &Path) -> CoveriResult<PathBuf> {
        if !src_dir.is_dir() {
            return Err(self.failure(format!("'{}' is not a directory", src_dir.display())));
        }
        let dest = if dest_zip.is_absolute() {
            dest_zip.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| self.failure(e.to_string()))?
                .join(dest_zip)
        };

        debug!(src = %src_dir.display(), dest = %dest.display(), "creating archive");

        let status = Command::new(&self.program)
            .arg("-r")
            .arg("-q")
            .arg(&dest)
            .arg(".")
            .current_dir(src_dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| self.failure(format!("cannot start: {e}")))?;

        if !status.success() {
            warn!(dest = %dest.display(), status = %status, "archiving failed");
            return Err(self.failure(format!("exited with {status}")));
        }
        Ok(dest)
    }
}
