//! Synchronization orchestrator.
//!
//! One call to [`LocaleSync::sync`] runs one pass:
//!
//! 1. Fast path: without a forced refresh, a metadata record whose version
//!    equals the configured service version means the cache is trusted and
//!    no request is made.
//! 2. Otherwise the remote locale list is fetched. Failing to get it is the
//!    only network error that aborts the pass.
//! 3. Every locale runs the bounded retry procedure concurrently; the pass
//!    waits for all of them, and a locale that exhausts its budget is reported
//!    as stale instead of failing the pass. The metadata record is rewritten.
//! 4. The cache directory is loaded into a fresh lookup table, which replaces
//!    the previous one in a single swap.

use crate::config::{Config, ProjectUrls};
use crate::download::{BundleDownloader, LocaleOutcome};
use crate::error::{Result, SyncError};
use crate::loader::load_all;
use crate::remote::fetch_metadata;
use crate::retry::RetryConfig;
use crate::store::{read_metadata, write_metadata, SyncMetadata};
use crate::translator::Translator;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

/// Lifecycle of a [`LocaleSync`] engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No project selected yet
    Unconfigured,
    /// Project URLs resolved and cache directory present
    Configured,
    /// A pass is running; lookups fail until it completes
    Syncing,
    /// Lookups are served from the last loaded table
    Ready,
    /// The last pass failed before a table could be loaded
    Failed,
}

/// Summary of one synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The cache was trusted without contacting the service
    pub fast_path: bool,
    /// Locale list in effect for this pass (default locale included)
    pub languages: Vec<String>,
    /// Version tag reported by the service, if any
    pub remote_version: Option<String>,
    /// Per-locale results; empty on the fast path
    pub outcomes: Vec<LocaleOutcome>,
}

impl SyncReport {
    /// Locales whose retry budget ran out during this pass.
    pub fn stale_locales(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_stale())
            .map(|o| o.locale.as_str())
            .collect()
    }
}

/// Locale bundle synchronization engine.
///
/// `sync` takes `&mut self`, so passes on one engine cannot overlap. Lookups
/// go through [`Translator`] handles obtained from [`translator`](Self::translator),
/// which may be shared freely across tasks.
#[derive(Debug)]
pub struct LocaleSync {
    config: Config,
    client: reqwest::Client,
    project: Option<ProjectUrls>,
    state: SyncState,
    translator: Translator,
}

impl LocaleSync {
    /// Create an engine. Every request it makes is bounded by
    /// `config.request_timeout`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {}", e)))?;

        debug!("Configured locale sync: {:?}", config);
        Ok(Self {
            translator: Translator::new(config.default_locale.clone()),
            config,
            client,
            project: None,
            state: SyncState::Unconfigured,
        })
    }

    /// Select the content project and prepare the cache directory.
    pub fn use_project(&mut self, project: &str) -> Result<&mut Self> {
        std::fs::create_dir_all(&self.config.locale_dir).map_err(|e| {
            SyncError::Config(format!(
                "cannot create locale directory {}: {}",
                self.config.locale_dir.display(),
                e
            ))
        })?;

        let urls = self.config.project_urls(project);
        debug!("API set for project {}: {}", project, urls.languages_url);
        self.project = Some(urls);
        self.state = SyncState::Configured;
        Ok(self)
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn project(&self) -> Option<&ProjectUrls> {
        self.project.as_ref()
    }

    /// Lookup handle sharing this engine's table.
    pub fn translator(&self) -> Translator {
        self.translator.clone()
    }

    /// Run one synchronization pass.
    ///
    /// Fails when no project is selected, when the remote locale list cannot
    /// be fetched on a cold or stale cache, or when the cache directory cannot
    /// be read. Per-locale download problems never fail the pass; see
    /// [`SyncReport::stale_locales`].
    pub async fn sync(&mut self) -> Result<SyncReport> {
        let project = self.project.clone().ok_or(SyncError::NotConfigured)?;

        self.state = SyncState::Syncing;
        self.translator.clear();

        match self.run_pass(&project).await {
            Ok(report) => {
                self.state = SyncState::Ready;
                Ok(report)
            }
            Err(e) => {
                error!("Synchronization of {} failed: {}", project.project, e);
                self.state = SyncState::Failed;
                Err(e)
            }
        }
    }

    async fn run_pass(&self, project: &ProjectUrls) -> Result<SyncReport> {
        let config = &self.config;

        let cached = if config.force_refresh {
            info!("Refresh forced, ignoring cached metadata");
            None
        } else {
            read_metadata(&config.metadata_path())
                .await
                .filter(|meta| meta.version == config.service_version)
        };

        let report = match cached {
            Some(meta) => {
                info!(
                    "Cache is current (version {}), skipping network",
                    meta.version
                );
                SyncReport {
                    fast_path: true,
                    languages: meta.languages,
                    remote_version: None,
                    outcomes: Vec::new(),
                }
            }
            None => self.refresh(project).await?,
        };

        let table = load_all(&config.locale_dir).await?;
        info!(
            "✓ Loaded {} locale bundles from {}",
            table.len(),
            config.locale_dir.display()
        );
        self.translator.install(table);

        Ok(report)
    }

    async fn refresh(&self, project: &ProjectUrls) -> Result<SyncReport> {
        let config = &self.config;

        info!("Getting languages for {}", project.project);
        let remote = fetch_metadata(&self.client, &project.languages_url).await?;
        let meta = SyncMetadata::new(
            &config.service_version,
            &remote.languages,
            &config.default_locale,
        );

        let downloader = BundleDownloader {
            client: &self.client,
            translations_url: &project.translations_url,
            service_version: &config.service_version,
            retry: RetryConfig::bundle_download(config),
            force_refresh: config.force_refresh,
        };

        info!("Syncing {} locales: {:?}", meta.languages.len(), meta.languages);
        let outcomes = join_all(meta.languages.iter().map(|locale| {
            let dest = config.bundle_path(locale);
            let downloader = &downloader;
            async move { downloader.sync_locale(locale, &dest).await }
        }))
        .await;

        let stale: Vec<&str> = outcomes
            .iter()
            .filter(|o| o.is_stale())
            .map(|o| o.locale.as_str())
            .collect();
        if !stale.is_empty() {
            warn!("Continuing with stale bundles for: {}", stale.join(", "));
        }

        if let Err(e) = write_metadata(&config.metadata_path(), &meta).await {
            warn!(
                "Failed to persist sync metadata to {}: {}",
                config.metadata_path().display(),
                e
            );
        }

        Ok(SyncReport {
            fast_path: false,
            languages: meta.languages,
            remote_version: remote.version,
            outcomes,
        })
    }
}
