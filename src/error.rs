//! Error taxonomy for synchronization and lookup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the synchronization engine and the translator.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport-level failure reaching a remote endpoint
    #[error("network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status or a response body of unexpected shape
    #[error("protocol error from {url}: {reason}")]
    Protocol { url: String, reason: String },

    /// Local bundle file is unparsable or empty.
    ///
    /// Only produced while validating the cache, where it is turned into a
    /// retry trigger. A sync call never returns it.
    #[error("cached bundle {path} is unusable: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    /// Bundle download failed in transport or while writing to disk
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// Cache directory could not be read at load time
    #[error("failed to load bundles from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Lookup attempted before a synchronization pass completed
    #[error("translations are not loaded; run a synchronization first")]
    NotLoaded,

    /// Synchronization attempted before a project was selected
    #[error("no project selected; call use_project before syncing")]
    NotConfigured,

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
