//! Translation bundles and cache validation.
//!
//! A bundle is a flat JSON object of key → string pairs. It may carry one
//! reserved key, [`RESERVED_KEY`], holding `{language, version}`; that entry
//! is metadata and never participates in lookups.

use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Reserved bundle key carrying bundle metadata.
pub const RESERVED_KEY: &str = "__translation_info";

/// Metadata embedded in a bundle under [`RESERVED_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BundleMeta {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
}

/// Key → string translations for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationBundle {
    entries: HashMap<String, String>,
    meta: Option<BundleMeta>,
}

impl TranslationBundle {
    /// Parse a bundle from raw JSON.
    ///
    /// Non-string scalar values are kept in their JSON text form; nested
    /// objects and arrays are not translations and are skipped.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, String> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {}", e))?;
        let serde_json::Value::Object(map) = value else {
            return Err("bundle is not a JSON object".to_string());
        };

        let mut entries = HashMap::with_capacity(map.len());
        let mut meta = None;
        for (key, value) in map {
            if key == RESERVED_KEY {
                meta = serde_json::from_value(value).ok();
                continue;
            }
            match value {
                serde_json::Value::String(s) => {
                    entries.insert(key, s);
                }
                serde_json::Value::Number(n) => {
                    entries.insert(key, n.to_string());
                }
                serde_json::Value::Bool(b) => {
                    entries.insert(key, b.to_string());
                }
                other => debug!("Skipping non-scalar bundle entry '{}': {}", key, other),
            }
        }

        Ok(Self { entries, meta })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn meta(&self) -> Option<&BundleMeta> {
        self.meta.as_ref()
    }

    /// Translations only; the reserved metadata key is not included.
    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            meta: None,
        }
    }
}

/// Canonical form of a service version as it appears inside bundles.
///
/// Numeric versions are prefixed with `v` (`"2"` → `"v2"`); anything else
/// (`"latest"`, `"v2"`) is used as is.
pub fn version_tag(service_version: &str) -> String {
    match service_version.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("v{}", service_version),
        _ => service_version.to_string(),
    }
}

/// Check a cached bundle, explaining why it cannot be used.
pub fn check(path: &Path, expected_version: &str) -> Result<TranslationBundle> {
    let corrupt = |reason: String| SyncError::CacheCorrupt {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| corrupt(e.to_string()))?;
    let bundle = TranslationBundle::parse(&bytes).map_err(corrupt)?;

    if bundle.is_empty() {
        return Err(corrupt("bundle has no translations".to_string()));
    }

    if let Some(version) = bundle.meta().and_then(|m| m.version.as_deref()) {
        let expected = version_tag(expected_version);
        if version != expected {
            return Err(corrupt(format!(
                "bundle version {} does not match {}",
                version, expected
            )));
        }
    }

    Ok(bundle)
}

/// Whether a cached bundle is structurally sound and version-current.
/// Never fails: any I/O or parse problem simply means "not usable".
pub fn is_usable(path: &Path, expected_version: &str) -> bool {
    match check(path, expected_version) {
        Ok(_) => true,
        Err(e) => {
            debug!("{}", e);
            false
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
