//! Image attachments for the next submission.
//!
//! Images are read from disk and encoded as base64 `data:` URLs, which the
//! service accepts inline in `image_url` content parts.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::{MAX_IMAGE_SIZE, SUPPORTED_IMAGE_TYPES};

/// Returns the MIME type for a supported image extension.
pub fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => return None,
    };
    SUPPORTED_IMAGE_TYPES.contains(&mime).then_some(mime)
}

/// Reads an image file into a `data:<mime>;base64,...` URL.
///
/// # Errors
///
/// Fails for unsupported types, files over the size limit, and read errors.
pub fn load_image(path: &Path) -> Result<String> {
    let Some(mime) = mime_type(path) else {
        bail!(
            "Unsupported file type: {} (expected JPEG, PNG or WebP)",
            path.display()
        );
    };
    let size = fs::metadata(path)
        .with_context(|| format!("Cannot read {}", path.display()))?
        .len();
    if size > MAX_IMAGE_SIZE {
        bail!(
            "{} is too large ({} bytes, limit {})",
            path.display(),
            size,
            MAX_IMAGE_SIZE
        );
    }
    let bytes = fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Images queued for the next submission.
#[derive(Debug, Default)]
pub struct PendingImages {
    urls: Vec<String>,
}

impl PendingImages {
    pub fn add(&mut self, path: &Path) -> Result<()> {
        self.urls.push(load_image(path)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn clear(&mut self) {
        self.urls.clear();
    }

    /// Hands over the queued images, leaving the queue empty.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.urls)
    }
}
