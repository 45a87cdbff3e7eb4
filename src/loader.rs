//! Bundle loader: reads every cached locale file into memory.

use crate::bundle::TranslationBundle;
use crate::error::{Result, SyncError};
use crate::store::METADATA_FILE;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// In-memory bundles keyed by locale code. Built whole by [`load_all`] and
/// never patched afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    bundles: HashMap<String, TranslationBundle>,
}

impl LookupTable {
    pub fn get(&self, locale: &str) -> Option<&TranslationBundle> {
        self.bundles.get(locale)
    }

    /// Value for `key` in `locale`, if both exist.
    pub fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        self.bundles.get(locale).and_then(|b| b.get(key))
    }

    /// Loaded locale codes, sorted.
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl FromIterator<(String, TranslationBundle)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (String, TranslationBundle)>>(iter: I) -> Self {
        Self {
            bundles: iter.into_iter().collect(),
        }
    }
}

/// Load every `<locale>.json` file in `dir`.
///
/// Fails only when the directory itself cannot be read. Individual files that
/// fail to parse are skipped with a warning.
pub async fn load_all(dir: &Path) -> Result<LookupTable> {
    let load_error = |source| SyncError::Load {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(load_error)?;
    let mut bundles = HashMap::new();

    while let Some(entry) = entries.next_entry().await.map_err(load_error)? {
        let path = entry.path();
        let Some(locale) = locale_code(&path) else {
            continue;
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Skipping unreadable bundle {}: {}", path.display(), e);
                continue;
            }
        };

        match TranslationBundle::parse(&bytes) {
            Ok(bundle) => {
                bundles.insert(locale.to_string(), bundle);
            }
            Err(e) => warn!("Skipping malformed bundle {}: {}", path.display(), e),
        }
    }

    debug!("Loaded {} bundles from {}", bundles.len(), dir.display());
    Ok(LookupTable { bundles })
}

/// Locale code for a cache file, or `None` for anything that is not a bundle
/// (metadata record, temporary files, other extensions).
fn locale_code(path: &Path) -> Option<&str> {
    if path.extension()? != "json" {
        return None;
    }
    if path.file_name()? == METADATA_FILE {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem)
}
