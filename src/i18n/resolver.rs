//! Translation resolver: map `(active locale, key)` to display text.
//!
//! The resolver holds an in-memory snapshot of the translation store for one
//! locale plus the base locale, loaded per request/session. Lookups never
//! fail: a key missing everywhere resolves to itself, so a missing
//! translation shows up in the UI as the key text instead of a blank.

use std::collections::HashMap;

use tracing::warn;

use crate::db::Database;
use crate::i18n::BASE_LOCALE;

pub struct TranslationResolver {
    locale: String,
    active: HashMap<String, String>,
    base: HashMap<String, String>,
}

impl TranslationResolver {
    /// Load a snapshot for `locale` from the translation store.
    ///
    /// Storage failures are not surfaced: the affected map degrades to empty
    /// and lookups fall through to the next step of the chain. A full outage
    /// therefore renders keys verbatim rather than failing the request.
    pub async fn load(db: &Database, locale: &str) -> Self {
        let base = match db.translation_map(BASE_LOCALE, None).await {
            Ok(map) => map,
            Err(e) => {
                warn!("Failed to load base locale translations: {:#}", e);
                HashMap::new()
            }
        };

        let active = if locale == BASE_LOCALE {
            HashMap::new()
        } else {
            match db.translation_map(locale, None).await {
                Ok(map) => map,
                Err(e) => {
                    warn!("Failed to load translations for '{}': {:#}", locale, e);
                    HashMap::new()
                }
            }
        };

        Self {
            locale: locale.to_string(),
            active,
            base,
        }
    }

    /// Build a resolver from already-loaded maps.
    pub fn from_maps(
        locale: &str,
        active: HashMap<String, String>,
        base: HashMap<String, String>,
    ) -> Self {
        Self {
            locale: locale.to_string(),
            active,
            base,
        }
    }

    /// Resolve a key to display text.
    ///
    /// Resolution order: exact match in the active locale's map, then the
    /// base locale's map, then the literal key verbatim. Pure lookup.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.active
            .get(key)
            .or_else(|| self.base.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}
