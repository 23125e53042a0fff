use crate::errors::{AimError, Result};
use crate::metadata::MetadataTag;
use crate::traits::{ImageDescriber, MetadataWriter};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

const MOCK_ENDPOINT: &str = "mock://inference";

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Unavailable,
}

/// Stand-in for the inference service: a fixed reply, or a service that is down.
#[derive(Debug)]
pub struct MockDescriber {
    reply: MockReply,
    fail_marker: Option<Vec<u8>>,
    calls: Mutex<Vec<Vec<u8>>>,
}

impl MockDescriber {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: MockReply::Text(reply.into()),
            fail_marker: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the service were not running.
    pub fn unavailable() -> Self {
        Self {
            reply: MockReply::Unavailable,
            fail_marker: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Images whose bytes contain `marker` get a malformed-response error.
    pub fn failing_on(mut self, marker: &[u8]) -> Self {
        self.fail_marker = Some(marker.to_vec());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn received(&self) -> Vec<Vec<u8>> {
        self.calls.lock().clone()
    }
}

impl ImageDescriber for MockDescriber {
    fn describe(&self, image: &[u8]) -> Result<String> {
        self.calls.lock().push(image.to_vec());

        if let Some(marker) = &self.fail_marker {
            if !marker.is_empty() && image.windows(marker.len()).any(|w| w == marker.as_slice()) {
                return Err(AimError::InferenceResponse {
                    endpoint: MOCK_ENDPOINT.to_string(),
                    reason: "malformed payload".to_string(),
                });
            }
        }

        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Unavailable => Err(AimError::InferenceUnavailable {
                endpoint: MOCK_ENDPOINT.to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
            }),
        }
    }
}

/// Stand-in for the metadata tool: records every write, never spawns a process.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    missing: bool,
    vanish_after: Option<usize>,
    fail_file_names: Vec<String>,
    calls: Mutex<Vec<(PathBuf, Vec<MetadataTag>)>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves as if the tool were not installed.
    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    /// Passes the startup check, then disappears once `writes` writes have been recorded.
    pub fn vanishing_after(mut self, writes: usize) -> Self {
        self.vanish_after = Some(writes);
        self
    }

    /// Writes to a file with this name fail with a non-zero exit.
    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.fail_file_names.push(file_name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<MetadataTag>)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn tool_not_found(&self) -> AimError {
        AimError::ToolNotFound {
            program: PathBuf::from("mock-exiftool"),
            reason: "not installed".to_string(),
        }
    }
}

impl MetadataWriter for RecordingWriter {
    fn ensure_available(&self) -> Result<()> {
        if self.missing {
            return Err(self.tool_not_found());
        }
        Ok(())
    }

    fn write_tags(&self, path: &Path, tags: &[MetadataTag]) -> Result<()> {
        if self.missing {
            return Err(self.tool_not_found());
        }
        if self
            .vanish_after
            .is_some_and(|limit| self.calls.lock().len() >= limit)
        {
            return Err(self.tool_not_found());
        }

        self.calls.lock().push((path.to_path_buf(), tags.to_vec()));

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.fail_file_names.iter().any(|f| f == file_name) {
            return Err(AimError::MetadataWrite {
                path: path.to_path_buf(),
                reason: "exited with exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}
