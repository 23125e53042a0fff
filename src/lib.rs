pub mod caption;
pub mod config;
pub mod errors;
pub mod exiftool;
pub mod metadata;
pub mod ollama;
pub mod scanner;
pub mod summary;
pub mod traits;

pub mod mocks;

use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use caption::ImageDescription;
pub use config::{Config, ModelSettings};
pub use errors::{AimError, Result};
pub use exiftool::ExifTool;
pub use ollama::OllamaClient;
pub use summary::{FailureKind, FileOutcome, FileResult, RunSummary};
pub use traits::*;

#[cfg(test)]
pub use mocks::*;

/// Run driver: scan, describe, write, one file at a time.
///
/// A single local model instance cannot usefully serve concurrent requests, so files
/// are processed sequentially and only the summary is mutated along the way.
pub struct ImageTagger<D: ImageDescriber, W: MetadataWriter> {
    describer: D,
    writer: W,
    config: Config,
    show_progress: bool,
}

impl<D: ImageDescriber, W: MetadataWriter> ImageTagger<D, W> {
    pub const fn new(describer: D, writer: W, config: Config) -> Self {
        Self {
            describer,
            writer,
            config,
            show_progress: false,
        }
    }

    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub const fn describer(&self) -> &D {
        &self.describer
    }

    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Tag every image under the configured input path.
    ///
    /// Fails before touching any file when the input path is missing or the metadata
    /// tool is unavailable. Per-file failures are collected in the returned summary.
    pub fn run(&self) -> Result<RunSummary> {
        let input_path = &self.config.input_path;

        if !input_path.exists() {
            return Err(AimError::PathNotFound {
                path: input_path.clone(),
            });
        }

        self.writer.ensure_available()?;

        let image_files = scanner::collect_image_files(input_path, self.config.recursive)?;

        if image_files.is_empty() {
            info!("no image files found in {}", input_path.display());
            return Ok(RunSummary::default());
        }

        info!("tagging {} image file(s)", image_files.len());
        self.process_files(&image_files)
    }

    pub fn process_files(&self, files: &[PathBuf]) -> Result<RunSummary> {
        let pb = self.progress_bar(files.len() as u64);
        let mut summary = RunSummary::default();

        for path in files {
            match self.process_file(path) {
                Ok(description) => {
                    pb.suspend(|| {
                        info!("tagged {}: {}", path.display(), description.description)
                    });
                    summary.record_success();
                }
                Err(e) => match e.failure_kind() {
                    Some(kind) => {
                        pb.suspend(|| warn!("{} failed ({}): {}", path.display(), kind, e));
                        summary.record_failure(path, kind, error_chain(&e));
                    }
                    None => {
                        pb.abandon();
                        return Err(e);
                    }
                },
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(summary)
    }

    /// Describe one image and write the result into it.
    ///
    /// The writer is only invoked once a usable description exists, so a failed
    /// inference never mutates the file.
    pub fn process_file(&self, path: &Path) -> Result<ImageDescription> {
        let image = fs::read(path).map_err(|e| AimError::FileSystem {
            path: path.to_path_buf(),
            operation: "read image".to_string(),
            source: e,
        })?;

        if image::guess_format(&image).is_err() {
            return Err(AimError::UnrecognizedImage {
                path: path.to_path_buf(),
            });
        }

        let reply = self.describer.describe(&image)?;
        debug!("model reply for {}: {}", path.display(), reply);

        let description =
            ImageDescription::parse(&reply).ok_or_else(|| AimError::UnusableReply {
                path: path.to_path_buf(),
                reply: reply.clone(),
            })?;

        self.writer
            .write_tags(path, &metadata::description_tags(&description))?;

        Ok(description)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

fn error_chain(err: &AimError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00 fake jpeg payload";

    #[test]
    fn test_process_file_writes_parsed_tags() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let image = temp_dir.path().join("photo.jpg");
        fs::write(&image, JPEG_BYTES)?;

        let reply = "Image Headline: Wheels\nImage Description: A red bicycle\nImage Keywords: bike, red";
        let tagger = ImageTagger::new(
            MockDescriber::new(reply),
            RecordingWriter::new(),
            Config::for_input(temp_dir.path()),
        );

        let description = tagger.process_file(&image)?;
        assert_eq!(description.keywords, vec!["bike", "red"]);

        let calls = tagger.writer().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, image);
        assert_eq!(calls[0].1.len(), 7);
        assert_eq!(tagger.describer().received(), vec![JPEG_BYTES.to_vec()]);
        Ok(())
    }

    #[test]
    fn test_unrecognized_bytes_skip_inference() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let image = temp_dir.path().join("not-really.jpg");
        fs::write(&image, b"plain text")?;

        let tagger = ImageTagger::new(
            MockDescriber::new("a red bicycle"),
            RecordingWriter::new(),
            Config::for_input(temp_dir.path()),
        );

        let err = tagger.process_file(&image).unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::Read));
        assert_eq!(tagger.describer().call_count(), 0);
        assert_eq!(tagger.writer().call_count(), 0);
        Ok(())
    }

    #[test]
    fn test_empty_reply_is_inference_failure() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let image = temp_dir.path().join("photo.jpg");
        fs::write(&image, JPEG_BYTES)?;

        let tagger = ImageTagger::new(
            MockDescriber::new("Image Keywords: a, b"),
            RecordingWriter::new(),
            Config::for_input(temp_dir.path()),
        );

        let err = tagger.process_file(&image).unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::Inference));
        assert_eq!(tagger.writer().call_count(), 0);
        Ok(())
    }

    #[test]
    fn test_error_chain_includes_source() {
        let err = AimError::InferenceUnavailable {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
        };
        assert!(error_chain(&err).ends_with(": connection refused"));
    }
}
