//! Upload constraints and storage object naming.
//!
//! Every check here runs before any remote call: a rejected batch never
//! reaches the storage bucket.

use rand::Rng;

use crate::colors::{numeric_color, MAX_COLOR_ID, MIN_COLOR_ID};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum accepted file size (1 MiB).
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

const ALLOWED_MIME_TYPES: &[&str] = &[MIME_PNG, MIME_JPEG];

/// Length of the random stem used for stored object names.
const OBJECT_NAME_LENGTH: usize = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Build an upload whose content type is detected from the header bytes.
    ///
    /// Unrecognised content is labelled `application/octet-stream` and will
    /// fail [`validate_file`].
    pub fn sniffed(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let content_type = detect_content_type(&bytes).unwrap_or("application/octet-stream");
        Self::new(file_name, content_type, bytes)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// An upload paired with the color tag the user entered for it.
#[derive(Debug, Clone)]
pub struct TaggedUpload {
    pub file: UploadFile,
    pub color: String,
}

impl TaggedUpload {
    pub fn new(file: UploadFile, color: impl Into<String>) -> Self {
        Self {
            file,
            color: color.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// MIME type of an image from its magic bytes, if it is one we recognise.
pub fn detect_content_type(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some(MIME_PNG),
        image::ImageFormat::Jpeg => Some(MIME_JPEG),
        _ => None,
    }
}

/// Check type and size of a single file.
pub fn validate_file(file: &UploadFile) -> Result<(), CoreError> {
    let content_type = file.content_type.trim().to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&content_type.as_str()) || file.size() > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(
            "Only PNG/JPG files up to 1MB are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Check one color tag.
///
/// The tag must be non-blank. Tags that start with an integer must have that
/// integer within `0..=254`, so `"300x"` is rejected; anything else
/// (e.g. `"Red"`) is accepted as is.
pub fn validate_color_tag(tag: &str) -> Result<(), CoreError> {
    if tag.trim().is_empty() {
        return Err(CoreError::Validation(
            "Please enter a color ID for all images".to_string(),
        ));
    }
    if let Some(n) = numeric_color(tag) {
        if !(MIN_COLOR_ID..=MAX_COLOR_ID).contains(&n) {
            return Err(CoreError::Validation(format!(
                "Numeric color IDs must be between {MIN_COLOR_ID} and {MAX_COLOR_ID}"
            )));
        }
    }
    Ok(())
}

/// Validate a whole batch: every file first, then every color tag.
pub fn validate_upload_batch(batch: &[TaggedUpload]) -> Result<(), CoreError> {
    if batch.is_empty() {
        return Err(CoreError::Validation(
            "Select at least one image to upload".to_string(),
        ));
    }
    for upload in batch {
        validate_file(&upload.file)?;
    }
    for upload in batch {
        validate_color_tag(&upload.color)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Object naming
// ---------------------------------------------------------------------------

/// Extension of `file_name` without the dot, lowercased.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Random object name that keeps the original extension, e.g. `k3j9x0q2m1ab.png`.
pub fn generate_object_name(file_name: &str) -> String {
    let stem: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(OBJECT_NAME_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    match file_extension(file_name) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

/// Bucket path for an object owned by `user_id`.
pub fn user_object_path(user_id: &str, object_name: &str) -> String {
    format!("{user_id}/{object_name}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

    fn file(content_type: &str, size: usize) -> UploadFile {
        UploadFile::new("shot.png", content_type, vec![0u8; size])
    }

    #[test]
    fn rejects_oversized_png() {
        assert_matches!(
            validate_file(&file(MIME_PNG, 2 * 1024 * 1024)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_gif() {
        assert_matches!(
            validate_file(&file("image/gif", 500 * 1024)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn accepts_jpeg_under_limit() {
        assert!(validate_file(&file(MIME_JPEG, 900 * 1024)).is_ok());
        assert!(validate_file(&file(MIME_PNG, MAX_UPLOAD_BYTES)).is_ok());
    }

    #[test]
    fn color_tag_rules() {
        assert!(validate_color_tag("0").is_ok());
        assert!(validate_color_tag("254").is_ok());
        assert!(validate_color_tag("Red").is_ok());
        assert_matches!(validate_color_tag(""), Err(CoreError::Validation(_)));
        assert_matches!(validate_color_tag("  "), Err(CoreError::Validation(_)));
        assert_matches!(validate_color_tag("255"), Err(CoreError::Validation(_)));
        assert_matches!(validate_color_tag("-1"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn color_tag_range_uses_leading_integer() {
        assert_matches!(validate_color_tag("300x"), Err(CoreError::Validation(_)));
        assert_matches!(validate_color_tag("-5 dark"), Err(CoreError::Validation(_)));
        assert!(validate_color_tag("12abc").is_ok());
        assert!(validate_color_tag("x300").is_ok());
    }

    #[test]
    fn batch_requires_tags_on_every_file() {
        let batch = vec![
            TaggedUpload::new(file(MIME_JPEG, 900 * 1024), "12"),
            TaggedUpload::new(file(MIME_PNG, 10), ""),
        ];
        let err = validate_upload_batch(&batch).unwrap_err();
        assert_eq!(err.user_message(), "Please enter a color ID for all images");
    }

    #[test]
    fn batch_checks_files_before_tags() {
        let batch = vec![TaggedUpload::new(file("image/gif", 10), "")];
        let err = validate_upload_batch(&batch).unwrap_err();
        assert_eq!(err.user_message(), "Only PNG/JPG files up to 1MB are allowed");
    }

    #[test]
    fn empty_batch_rejected() {
        assert_matches!(validate_upload_batch(&[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn sniffing_detects_png_and_jpeg() {
        assert_eq!(UploadFile::sniffed("a.png", PNG_HEADER.to_vec()).content_type, MIME_PNG);
        assert_eq!(UploadFile::sniffed("a.jpg", JPEG_HEADER.to_vec()).content_type, MIME_JPEG);
        let unknown = UploadFile::sniffed("a.txt", b"hello".to_vec());
        assert_matches!(validate_file(&unknown), Err(CoreError::Validation(_)));
    }

    #[test]
    fn object_names_keep_extension() {
        let name = generate_object_name("My Rex.PNG");
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), OBJECT_NAME_LENGTH + 4);
        assert_ne!(generate_object_name("a.png"), generate_object_name("a.png"));
    }

    #[test]
    fn extension_edge_cases() {
        assert_eq!(file_extension("photo.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
        assert_eq!(generate_object_name("noext").len(), OBJECT_NAME_LENGTH);
    }

    #[test]
    fn object_path_is_prefixed_by_user() {
        assert_eq!(user_object_path("u-1", "abc.png"), "u-1/abc.png");
    }
}
