//! Attachment storage under the media root.
//!
//! Uploaded files (property images, contract documents, message images) and
//! generated receipts live in sub-folders of the media root. The database only
//! stores paths relative to that root; absolute URLs are built on the way out.

use crate::errors::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Folder for property pictures.
pub const PROPERTY_IMAGES: &str = "properties";
/// Folder for signed contract documents.
pub const CONTRACT_DOCUMENTS: &str = "contracts";
/// Folder for generated payment receipts.
pub const RECEIPTS: &str = "receipts";
/// Folder for images attached to messages.
pub const MESSAGE_IMAGES: &str = "messages";

/// A file sent inline in a JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    /// Original file name, only its extension is kept
    pub filename: String,
    /// File content, standard base64
    pub content_base64: String,
}

/// Reads and writes attachments and builds their public URLs.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_prefix: String,
}

impl MediaStore {
    /// Creates a store rooted at `root` whose files are reachable at
    /// `{public_base_url}{url_prefix}/{relative path}`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str, url_prefix: &str) -> Self {
        let prefix = format!(
            "{}/{}",
            public_base_url.trim_end_matches('/'),
            url_prefix.trim_matches('/')
        );
        Self {
            root: root.into(),
            public_prefix: prefix,
        }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored file.
    #[must_use]
    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Public URL of a stored file.
    #[must_use]
    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.public_prefix, relative.trim_start_matches('/'))
    }

    /// Decodes an upload and stores it under `folder` with a fresh name.
    /// Returns the path relative to the media root.
    ///
    /// # Errors
    /// Returns a validation error under `field` if the content is empty or not
    /// valid base64, and an I/O error if writing fails.
    pub async fn save_upload(&self, folder: &str, field: &str, upload: &Upload) -> Result<String> {
        let bytes = STANDARD
            .decode(upload.content_base64.trim())
            .map_err(|e| Error::invalid(field, format!("File content is not valid base64: {e}")))?;
        if bytes.is_empty() {
            return Err(Error::invalid(field, "The submitted file is empty."));
        }
        let relative = format!("{folder}/{}{}", Uuid::new_v4().simple(), extension_of(&upload.filename));
        self.write(&relative, &bytes).await?;
        Ok(relative)
    }

    /// Writes bytes at a path relative to the root, creating folders as needed.
    pub async fn write(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let path = self.absolute_path(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    /// Whether a stored file currently exists.
    pub async fn exists(&self, relative: &str) -> bool {
        tokio::fs::try_exists(self.absolute_path(relative))
            .await
            .unwrap_or(false)
    }
}

/// Keeps a short alphanumeric extension (with its dot), drops anything else.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
