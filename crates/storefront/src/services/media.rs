//! Local disk storage for product images.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::ShopError;

/// Accepted image extensions (lowercase).
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Largest accepted upload (16 MiB).
pub const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

/// Product image directory, served under `/static/images/products`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory images are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and write an image, returning its stored file name
    /// (`<uuid>_<sanitized original name>`).
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for empty, oversized, or disallowed
    /// files, or `ShopError::Media` if the write fails.
    pub async fn save_image(&self, original_name: &str, bytes: &[u8]) -> Result<String, ShopError> {
        if bytes.is_empty() {
            return Err(ShopError::Validation("image file is empty".to_owned()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ShopError::Validation(format!(
                "image must be at most {} MiB",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        let name = sanitize_file_name(original_name);
        if !has_allowed_extension(&name) {
            return Err(ShopError::Validation(format!(
                "image type not allowed (use {})",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let stored = format!("{}_{name}", Uuid::new_v4().simple());
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&stored), bytes).await?;
        tracing::info!(file = %stored, bytes = bytes.len(), "Stored product image");
        Ok(stored)
    }

    /// Remove a stored image. Missing files are ignored; other failures are
    /// logged and swallowed.
    pub async fn delete_image(&self, stored_name: &str) {
        // Stored names never contain separators; anything else is not ours
        if stored_name.is_empty() || stored_name.contains(['/', '\\']) || stored_name.starts_with('.') {
            tracing::warn!(file = %stored_name, "Refusing to delete unexpected image path");
            return;
        }
        match tokio::fs::remove_file(self.root.join(stored_name)).await {
            Ok(()) => tracing::info!(file = %stored_name, "Deleted product image"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %stored_name, error = %e, "Failed to delete product image"),
        }
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, dropping any path.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_owned()
    } else {
        cleaned.to_owned()
    }
}

fn has_allowed_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
