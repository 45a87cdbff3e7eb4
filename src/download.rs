//! Bundle downloader with bounded per-locale retry.

use crate::bundle;
use crate::error::{Result, SyncError};
use crate::retry::RetryConfig;
use crate::store::temp_path_for;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// How a locale's cache entry ended up after its retry procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleStatus {
    /// Existing file validated; nothing was downloaded
    Cached,
    /// A download produced a usable file
    Downloaded,
    /// Retry budget exhausted; whatever is on disk is kept as is
    Stale { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleOutcome {
    pub locale: String,
    pub attempts: u32,
    pub status: LocaleStatus,
}

impl LocaleOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self.status, LocaleStatus::Stale { .. })
    }
}

/// Expand a bundle URL template for one locale and append a cache-busting
/// query parameter. `:version` takes the tagged form of `service_version`.
pub fn bundle_url(template: &str, locale: &str, service_version: &str) -> String {
    let url = template
        .replace(":lang", locale)
        .replace(":version", &bundle::version_tag(service_version));
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}_={}", url, separator, uuid::Uuid::new_v4().simple())
}

/// Stream the body at `url` into `dest`, replacing any existing file.
///
/// The body is written to a temporary sibling first and renamed into place,
/// so readers never observe a partially written bundle.
pub async fn download(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let failed = |reason: String| SyncError::Download {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("unexpected status {}", status)));
    }

    let temp_path = temp_path_for(dest);
    let written = async {
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| failed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| failed(e.to_string()))?;
        }
        file.flush().await.map_err(|e| failed(e.to_string()))?;
        drop(file);

        tokio::fs::rename(&temp_path, dest)
            .await
            .map_err(|e| failed(e.to_string()))
    }
    .await;

    if written.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    written
}

/// Downloads and validates the bundles of one project.
#[derive(Debug, Clone)]
pub struct BundleDownloader<'a> {
    pub client: &'a reqwest::Client,
    pub translations_url: &'a str,
    pub service_version: &'a str,
    pub retry: RetryConfig,
    pub force_refresh: bool,
}

impl BundleDownloader<'_> {
    /// Bring the cache entry for `locale` up to date.
    ///
    /// Makes at most `retry.max_attempts` downloads. A usable existing file
    /// stops the procedure early, except that a forced refresh always
    /// downloads on the first attempt. Exhausting the budget is not an error:
    /// the outcome is reported as [`LocaleStatus::Stale`].
    pub async fn sync_locale(&self, locale: &str, dest: &Path) -> LocaleOutcome {
        let operation_name = format!("Bundle {}", locale);
        let mut attempts = 0;
        let mut force = self.force_refresh;
        let mut last_error: Option<String> = None;

        while attempts < self.retry.max_attempts {
            if !force && bundle::is_usable(dest, self.service_version) {
                break;
            }
            force = false;

            self.retry.wait_before(attempts, &operation_name).await;
            let url = bundle_url(self.translations_url, locale, self.service_version);
            match download(self.client, &url, dest).await {
                Ok(()) => {
                    debug!("{}: downloaded to {}", operation_name, dest.display());
                    last_error = None;
                }
                Err(e) => {
                    warn!(
                        "{}: Attempt {}/{} failed ({})",
                        operation_name,
                        attempts + 1,
                        self.retry.max_attempts,
                        e
                    );
                    last_error = Some(e.to_string());
                }
            }
            attempts += 1;
        }

        let status = if attempts == 0 {
            debug!("{}: using cached bundle", operation_name);
            LocaleStatus::Cached
        } else if bundle::is_usable(dest, self.service_version) {
            info!("✓ {}: updated after {} attempt(s)", operation_name, attempts);
            LocaleStatus::Downloaded
        } else {
            let reason = last_error
                .unwrap_or_else(|| "downloaded bundle failed validation".to_string());
            warn!(
                "{}: All {} attempts used, keeping stale cache entry. Last error: {}",
                operation_name, attempts, reason
            );
            LocaleStatus::Stale { reason }
        };

        LocaleOutcome {
            locale: locale.to_string(),
            attempts,
            status,
        }
    }
}
