//! Fallback-aware key lookups with `:name` variable substitution.

use crate::error::{Result, SyncError};
use crate::loader::LookupTable;
use arc_swap::ArcSwapOption;
use regex::{NoExpand, Regex};
use std::fmt::Display;
use std::sync::Arc;

/// One lookup request.
///
/// ```ignore
/// let text = translator.translate(
///     &Lookup::key("hello").in_locale("fil").var("name", "jennifer"),
/// )?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup<'a> {
    pub locale: Option<&'a str>,
    pub key: &'a str,
    pub variables: Vec<(&'a str, String)>,
}

impl<'a> Lookup<'a> {
    pub fn key(key: &'a str) -> Self {
        Self {
            locale: None,
            key,
            variables: Vec::new(),
        }
    }

    pub fn in_locale(mut self, locale: &'a str) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn var(mut self, name: &'a str, value: impl Display) -> Self {
        self.variables.push((name, value.to_string()));
        self
    }
}

struct Shared {
    table: ArcSwapOption<LookupTable>,
    current_locale: ArcSwapOption<String>,
    default_locale: String,
}

/// Cheaply cloneable lookup handle.
///
/// All clones observe the same table. The table is replaced as a whole at the
/// end of every synchronization pass, so a lookup sees either the previous
/// table or the next one, never a mix.
#[derive(Clone)]
pub struct Translator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("default_locale", &self.shared.default_locale)
            .field("current_locale", &self.shared.current_locale.load_full())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Translator {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                table: ArcSwapOption::empty(),
                current_locale: ArcSwapOption::empty(),
                default_locale: default_locale.into(),
            }),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.shared.default_locale
    }

    /// Locale used when a lookup does not name one. Unset means the default
    /// locale.
    pub fn set_locale(&self, locale: impl Into<String>) {
        self.shared
            .current_locale
            .store(Some(Arc::new(locale.into())));
    }

    pub fn current_locale(&self) -> String {
        self.shared
            .current_locale
            .load_full()
            .map(|l| l.as_ref().clone())
            .unwrap_or_else(|| self.shared.default_locale.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.shared.table.load().is_some()
    }

    /// Locale codes present in the loaded table.
    pub fn locales(&self) -> Result<Vec<String>> {
        let table = self.table()?;
        Ok(table.locales().into_iter().map(str::to_string).collect())
    }

    pub(crate) fn install(&self, table: LookupTable) {
        self.shared.table.store(Some(Arc::new(table)));
    }

    pub(crate) fn clear(&self) {
        self.shared.table.store(None);
    }

    fn table(&self) -> Result<Arc<LookupTable>> {
        self.shared.table.load_full().ok_or(SyncError::NotLoaded)
    }

    /// Resolve a [`Lookup`].
    ///
    /// The value comes from the requested locale (or the current locale when
    /// none is given), then the default locale, and finally the key itself.
    /// Empty values count as missing.
    pub fn translate(&self, lookup: &Lookup<'_>) -> Result<String> {
        let table = self.table()?;
        let template = self.template(&table, lookup.locale, lookup.key);

        Ok(substitute(
            template,
            lookup.variables.iter().map(|(name, value)| (*name, value)),
        ))
    }

    /// `key` in the current locale.
    pub fn trans(&self, key: &str) -> Result<String> {
        self.translate(&Lookup::key(key))
    }

    /// `key` in the current locale, with variables.
    pub fn trans_with<I, K, V>(&self, key: &str, variables: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        self.lookup_with(None, key, variables)
    }

    /// `key` in an explicit locale.
    pub fn trans_in(&self, locale: &str, key: &str) -> Result<String> {
        self.translate(&Lookup::key(key).in_locale(locale))
    }

    /// `key` in an explicit locale, with variables.
    pub fn trans_in_with<I, K, V>(&self, locale: &str, key: &str, variables: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        self.lookup_with(Some(locale), key, variables)
    }

    fn lookup_with<I, K, V>(&self, locale: Option<&str>, key: &str, variables: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        let table = self.table()?;
        Ok(substitute(self.template(&table, locale, key), variables))
    }

    fn template<'t>(&self, table: &'t LookupTable, locale: Option<&str>, key: &'t str) -> &'t str {
        let current = self.shared.current_locale.load_full();
        let default = self.shared.default_locale.as_str();
        let locale = locale
            .or(current.as_deref().map(String::as_str))
            .unwrap_or(default);

        table
            .lookup(locale, key)
            .filter(|value| !value.is_empty())
            .or_else(|| table.lookup(default, key).filter(|value| !value.is_empty()))
            .unwrap_or(key)
    }
}

/// Replace every `:name` token with its value.
///
/// Variables are applied one at a time in iteration order. A token only
/// matches when the character after the name is not a word character, so
/// `:name` leaves `:nameLong` alone. Inserted values are not rescanned for the
/// variable that produced them.
pub fn substitute<I, K, V>(template: &str, variables: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    let mut text = template.to_string();
    for (name, value) in variables {
        let name = name.as_ref();
        if name.is_empty() || !text.contains(':') {
            continue;
        }
        let Some(pattern) = token_regex(name) else {
            continue;
        };
        let value = value.to_string();
        text = pattern.replace_all(&text, NoExpand(&value)).into_owned();
    }
    text
}

fn token_regex(name: &str) -> Option<Regex> {
    let ends_in_word_char = name
        .chars()
        .last()
        .map(|c| c.is_alphanumeric() || c == '_')
        .unwrap_or(false);
    let boundary = if ends_in_word_char { r"\b" } else { "" };
    Regex::new(&format!(":{}{}", regex::escape(name), boundary)).ok()
}
