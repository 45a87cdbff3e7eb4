//! Remote metadata client: the list of locales a project publishes.

use crate::error::{Result, SyncError};
use serde::Deserialize;
use tracing::debug;

/// Locale list and optional content version reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub languages: Vec<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataFields {
    languages: Vec<String>,
    #[serde(default)]
    version: Option<serde_json::Value>,
}

/// Accepted response shapes: `{"data": {"languages": [...]}}` or a bare
/// `{"languages": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetadataBody {
    Enveloped { data: MetadataFields },
    Bare(MetadataFields),
}

impl From<MetadataBody> for RemoteMetadata {
    fn from(body: MetadataBody) -> Self {
        let fields = match body {
            MetadataBody::Enveloped { data } => data,
            MetadataBody::Bare(fields) => fields,
        };

        // Versions may arrive as numbers or strings
        let version = fields.version.and_then(|v| match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        RemoteMetadata {
            languages: fields.languages,
            version,
        }
    }
}

/// Fetch the project's locale list.
///
/// Fails with [`SyncError::Network`] when the endpoint cannot be reached and
/// [`SyncError::Protocol`] on a non-success status or a body without a locale
/// list.
pub async fn fetch_metadata(client: &reqwest::Client, url: &str) -> Result<RemoteMetadata> {
    debug!("Fetching locale metadata from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| SyncError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Protocol {
            url: url.to_string(),
            reason: format!("unexpected status {}", status),
        });
    }

    let body = response.bytes().await.map_err(|source| SyncError::Network {
        url: url.to_string(),
        source,
    })?;

    let parsed: MetadataBody =
        serde_json::from_slice(&body).map_err(|e| SyncError::Protocol {
            url: url.to_string(),
            reason: format!("response does not contain a locale list: {}", e),
        })?;

    let metadata = RemoteMetadata::from(parsed);
    debug!(
        "Remote lists {} locales (version {:?})",
        metadata.languages.len(),
        metadata.version
    );
    Ok(metadata)
}
