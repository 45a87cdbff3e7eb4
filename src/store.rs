//! Local metadata store and atomic cache writes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// File name of the sync metadata record inside the locale directory.
pub const METADATA_FILE: &str = "meta.json";

/// Last synchronized version and locale list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub version: String,
    pub languages: Vec<String>,
}

impl SyncMetadata {
    /// Build metadata from the server's locale list, appending the default
    /// locale when the server omits it. Duplicates are dropped, first one wins.
    pub fn new(version: &str, server_languages: &[String], default_locale: &str) -> Self {
        let mut languages: Vec<String> = Vec::with_capacity(server_languages.len() + 1);
        for lang in server_languages {
            if !languages.contains(lang) {
                languages.push(lang.clone());
            }
        }
        if !languages.iter().any(|l| l == default_locale) {
            languages.push(default_locale.to_string());
        }

        Self {
            version: version.to_string(),
            languages,
        }
    }
}

/// Read the metadata record. A missing or unparsable record is a cold start,
/// reported as `None`.
pub async fn read_metadata(path: &Path) -> Option<SyncMetadata> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) => {
            debug!("No sync metadata at {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice(&content) {
        Ok(meta) => Some(meta),
        Err(e) => {
            warn!("Ignoring unparsable sync metadata {}: {}", path.display(), e);
            None
        }
    }
}

/// Overwrite the metadata record.
pub async fn write_metadata(path: &Path, meta: &SyncMetadata) -> std::io::Result<()> {
    let content = serde_json::to_vec_pretty(meta)?;
    write_atomic(path, &content).await
}

/// Temporary sibling used while `path` is being rewritten. Kept in the same
/// directory so the final rename stays on one filesystem.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

/// Write `content` to a temporary file and rename it over `path`.
pub async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path_for(path);
    let result = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        tokio::fs::rename(&temp_path, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    result
}
