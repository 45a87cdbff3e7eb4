//! Client-side cache for remotely managed locale bundles.
//!
//! [`LocaleSync`] keeps a directory of `<locale>.json` bundles in step with a
//! content service, and [`Translator`] serves fallback-aware lookups from the
//! bundles loaded by the last synchronization pass.
//!
//! ```rust,ignore
//! use locale_sync::{Config, LocaleSync};
//!
//! let mut engine = LocaleSync::new(config)?;
//! engine.use_project("freedom_dashboard")?;
//! engine.sync().await?;
//!
//! let translator = engine.translator();
//! translator.trans_with("hello", [("name", "Raven")])?;
//! ```

pub mod bundle;
pub mod config;
pub mod download;
pub mod error;
pub mod loader;
pub mod remote;
pub mod retry;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod translator;

pub use config::{Config, ConfigOverrides, ProjectUrls};
pub use download::{LocaleOutcome, LocaleStatus};
pub use error::SyncError;
pub use store::SyncMetadata;
pub use sync::{LocaleSync, SyncReport, SyncState};
pub use translator::{Lookup, Translator};
