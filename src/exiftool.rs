use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{AimError, Result};
use crate::metadata::{MetadataTag, TagValue};
use crate::traits::MetadataWriter;

/// Drives the `exiftool` command line, one process per file.
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
    keep_backup: bool,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>, keep_backup: bool) -> Self {
        Self {
            program: program.into(),
            keep_backup,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for writing `tags` into `path`, without the program itself.
    pub fn write_args(&self, path: &Path, tags: &[MetadataTag]) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if !self.keep_backup {
            args.push("-overwrite_original".into());
        }
        if tags.iter().any(MetadataTag::is_iptc) {
            args.push("-codedcharacterset=utf8".into());
        }

        for tag in tags {
            match &tag.value {
                TagValue::Text(text) => args.push(format!("-{}={}", tag.field, text).into()),
                TagValue::List(items) => args.extend(
                    items
                        .iter()
                        .map(|item| OsString::from(format!("-{}={}", tag.field, item))),
                ),
            }
        }

        args.push(path.as_os_str().to_os_string());
        args
    }

    /// All tags of `path`, keyed as `Group:Tag`.
    pub fn read_metadata(&self, path: &Path) -> Result<BTreeMap<String, Value>> {
        let output = self.run([
            OsString::from("-json"),
            OsString::from("-G"),
            path.as_os_str().to_os_string(),
        ])?;

        if !output.status.success() {
            return Err(AimError::MetadataRead {
                path: path.to_path_buf(),
                reason: failure_reason(&output),
            });
        }

        parse_metadata_json(&String::from_utf8_lossy(&output.stdout)).map_err(|reason| {
            AimError::MetadataRead {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Command::new(&self.program)
            .args(args.into_iter().map(Into::into))
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => AimError::ToolNotFound {
                    program: self.program.clone(),
                    reason: e.to_string(),
                },
                _ => AimError::FileSystem {
                    path: self.program.clone(),
                    operation: "spawn metadata tool".to_string(),
                    source: e,
                },
            })
    }
}

impl MetadataWriter for ExifTool {
    fn ensure_available(&self) -> Result<()> {
        let output = self.run(["-ver"])?;

        if !output.status.success() {
            return Err(AimError::ToolNotFound {
                program: self.program.clone(),
                reason: failure_reason(&output),
            });
        }

        debug!(
            "using {} version {}",
            self.program.display(),
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn write_tags(&self, path: &Path, tags: &[MetadataTag]) -> Result<()> {
        let output = self.run(self.write_args(path, tags)).map_err(|e| match e {
            // The tool was checked at startup, so anything but a vanished binary is per file.
            AimError::ToolNotFound { .. } => e,
            other => AimError::MetadataWrite {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;

        if !output.status.success() {
            return Err(AimError::MetadataWrite {
                path: path.to_path_buf(),
                reason: failure_reason(&output),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("exiftool reported for {}: {}", path.display(), stderr.trim());
        }
        Ok(())
    }
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {}", output.status, stderr)
    }
}

/// exiftool's `-json` output is an array with one object per file.
pub fn parse_metadata_json(json: &str) -> std::result::Result<BTreeMap<String, Value>, String> {
    let files: Vec<BTreeMap<String, Value>> =
        serde_json::from_str(json).map_err(|e| format!("unexpected exiftool output: {}", e))?;

    files
        .into_iter()
        .next()
        .ok_or_else(|| "exiftool returned no metadata".to_string())
}
