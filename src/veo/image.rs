//! Reference image encoding.
//!
//! Turns a user-selected image into the base64 payload and MIME type the
//! Veo API expects. The bytes are not inspected; a malformed image is sent
//! as-is and rejected server-side.

use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use super::error::GenerationError;

/// MIME type used when neither a declared type nor a known extension is available.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// A reference image ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Standard base64 (with padding) of the raw file bytes.
    pub data: String,
    pub mime_type: String,
}

/// Resolve the MIME type for an image.
///
/// A non-empty declared type always wins. Otherwise the file extension is
/// mapped among png, jpg/jpeg and webp, defaulting to png.
pub fn mime_type_for(declared: Option<&str>, file_name: &str) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        return declared.to_string();
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => DEFAULT_IMAGE_MIME,
    }
    .to_string()
}

/// The file's own type, as a file picker would report it.
///
/// A non-empty declared type wins; otherwise the type is looked up from the
/// extension. Unknown extensions give `None` rather than the upload default.
pub fn detect_mime_type(declared: Option<&str>, file_name: &str) -> Option<String> {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        return Some(declared.to_string());
    }
    mime_guess::from_path(file_name)
        .first_raw()
        .map(str::to_string)
}

/// Whether a MIME type names an image (`image/*`).
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_lowercase().starts_with("image/")
}

/// Encode raw image bytes.
pub fn encode_bytes(bytes: &[u8], declared: Option<&str>, file_name: &str) -> EncodedImage {
    EncodedImage {
        data: general_purpose::STANDARD.encode(bytes),
        mime_type: mime_type_for(declared, file_name),
    }
}

/// Read an image file from disk and encode it.
pub fn encode_file(path: &Path, declared: Option<&str>) -> Result<EncodedImage, GenerationError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::debug!(
        "Encoded reference image {} ({} bytes)",
        path.display(),
        bytes.len()
    );
    Ok(encode_bytes(&bytes, declared, &file_name))
}
