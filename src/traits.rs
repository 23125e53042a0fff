use crate::errors::Result;
use crate::metadata::{MetadataTag, TagValue};
use std::path::Path;

/// Turns raw image bytes into text using a vision model.
///
/// The prompt is fixed at construction time, so the run driver only ever hands over bytes.
pub trait ImageDescriber: Send + Sync {
    fn describe(&self, image: &[u8]) -> Result<String>;
}

/// Writes metadata fields into an image file in place.
pub trait MetadataWriter: Send + Sync {
    /// Fails with [`crate::AimError::ToolNotFound`] when nothing could ever be written.
    fn ensure_available(&self) -> Result<()>;

    /// Write all tags to `path` in a single operation.
    fn write_tags(&self, path: &Path, tags: &[MetadataTag]) -> Result<()>;

    fn write_field(&self, path: &Path, field: &str, value: &str) -> Result<()> {
        self.write_tags(
            path,
            &[MetadataTag::new(field, TagValue::Text(value.to_string()))],
        )
    }
}
