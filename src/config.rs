use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration, constructed once and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Remote endpoints (templates containing `:project`, `:lang`, `:version`)
    pub languages_url: String,
    pub translations_url: String,

    // Local cache
    pub locale_dir: PathBuf,
    pub default_locale: String,

    // Download behaviour
    pub download_retry: u32,
    pub request_timeout: Duration,
    pub retry_delay: Duration,

    // Cache freshness
    pub service_version: String,
    pub force_refresh: bool,

    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages_url: String::new(),
            translations_url: String::new(),
            locale_dir: PathBuf::from("translations"),
            default_locale: "en".to_string(),
            download_retry: 3,
            request_timeout: Duration::from_secs(30),
            retry_delay: Duration::from_millis(250),
            service_version: "latest".to_string(),
            force_refresh: false,
            debug: false,
        }
    }
}

/// URLs for one content project, with `:project` and `:version` already
/// substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUrls {
    pub project: String,
    pub languages_url: String,
    pub translations_url: String,
}

impl Config {
    /// Load configuration from `LOCALE_SYNC_*` environment variables,
    /// falling back to [`Config::default`] for anything unset.
    pub fn from_env() -> Result<Self> {
        let overrides = ConfigOverrides {
            languages_url: env_var("LOCALE_SYNC_LANGUAGES_URL"),
            translations_url: env_var("LOCALE_SYNC_TRANSLATIONS_URL"),
            locale_dir: env_var("LOCALE_SYNC_LOCALE_DIR").map(PathBuf::from),
            default_locale: env_var("LOCALE_SYNC_DEFAULT"),
            download_retry: env_parse("LOCALE_SYNC_DOWNLOAD_RETRY")?,
            request_timeout_secs: env_parse("LOCALE_SYNC_REQUEST_TIMEOUT_SECS")?,
            retry_delay_ms: env_parse("LOCALE_SYNC_RETRY_DELAY_MS")?,
            service_version: env_var("LOCALE_SYNC_SERVICE_VERSION"),
            force_refresh: env_var("REFRESH")
                .or_else(|| env_var("REFRESH_TRANSLATIONS"))
                .map(|v| is_truthy(&v)),
            debug: env_var("LOCALE_SYNC_DEBUG").map(|v| is_truthy(&v)),
        };

        let config = overrides.resolve_standalone();
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.languages_url.trim().is_empty() {
            return Err(SyncError::Config("languages_url is not set".to_string()));
        }
        if self.translations_url.trim().is_empty() {
            return Err(SyncError::Config("translations_url is not set".to_string()));
        }
        if self.default_locale.trim().is_empty() {
            return Err(SyncError::Config("default locale is empty".to_string()));
        }
        if self.download_retry == 0 {
            return Err(SyncError::Config(
                "download_retry must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve both URL templates for a content project. `:version` becomes
    /// the tagged service version (`"2"` → `"v2"`).
    pub fn project_urls(&self, project: &str) -> ProjectUrls {
        let version = crate::bundle::version_tag(&self.service_version);
        let expand = |template: &str| {
            template
                .replace(":project", project)
                .replace(":version", &version)
        };
        ProjectUrls {
            project: project.to_string(),
            languages_url: expand(&self.languages_url),
            translations_url: expand(&self.translations_url),
        }
    }

    /// Path of the persisted sync metadata record.
    pub fn metadata_path(&self) -> PathBuf {
        self.locale_dir.join(crate::store::METADATA_FILE)
    }

    /// Path of the cached bundle for one locale.
    pub fn bundle_path(&self, locale: &str) -> PathBuf {
        self.locale_dir.join(format!("{}.json", locale))
    }
}

/// Partial configuration layered over a base [`Config`].
///
/// Every unset field inherits from the base passed to [`resolve`](Self::resolve),
/// so a shared default configuration can be reused explicitly across engines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub languages_url: Option<String>,
    pub translations_url: Option<String>,
    pub locale_dir: Option<PathBuf>,
    #[serde(rename = "default")]
    pub default_locale: Option<String>,
    pub download_retry: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub retry_delay_ms: Option<u64>,
    pub service_version: Option<String>,
    #[serde(rename = "refresh")]
    pub force_refresh: Option<bool>,
    pub debug: Option<bool>,
}

impl ConfigOverrides {
    /// Build a config, taking unset values from `base`.
    pub fn resolve(self, base: &Config) -> Config {
        Config {
            languages_url: self
                .languages_url
                .unwrap_or_else(|| base.languages_url.clone()),
            translations_url: self
                .translations_url
                .unwrap_or_else(|| base.translations_url.clone()),
            locale_dir: self.locale_dir.unwrap_or_else(|| base.locale_dir.clone()),
            default_locale: self
                .default_locale
                .unwrap_or_else(|| base.default_locale.clone()),
            download_retry: self.download_retry.unwrap_or(base.download_retry),
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(base.request_timeout),
            retry_delay: self
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.retry_delay),
            service_version: self
                .service_version
                .unwrap_or_else(|| base.service_version.clone()),
            force_refresh: self.force_refresh.unwrap_or(base.force_refresh),
            debug: self.debug.unwrap_or(base.debug),
        }
    }

    /// Build a config that inherits only the built-in defaults.
    pub fn resolve_standalone(self) -> Config {
        self.resolve(&Config::default())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SyncError::Config(format!("{} has invalid value '{}'", name, raw))),
        None => Ok(None),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
