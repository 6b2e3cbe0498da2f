//! Locale preference and the hydration guard.
//!
//! The user's chosen locale lives in client-side storage under a fixed key
//! and is not readable while the server renders the first paint. To keep
//! server and client output identical, the selector starts in the server
//! phase pinned to the base locale and only consults the stored preference
//! after the `mounted` transition.

use crate::i18n::BASE_LOCALE;

/// Fixed storage key holding the chosen locale code.
pub const PREFERENCE_KEY: &str = "preferred_locale";

/// Key/value storage for the locale preference, the localStorage analog.
///
/// Implementations may be unavailable or hold garbage; both are treated as
/// "no preference set" by the selector.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store for tests and embedding hosts without real storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    entries: std::collections::HashMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a locale preference.
    pub fn with_locale(code: &str) -> Self {
        let mut store = Self::default();
        store.set(PREFERENCE_KEY, code);
        store
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Render phase of the page consuming translations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// Initial render; preference storage is unreachable.
    Server,
    /// Fully attached on the client; storage is available.
    Client,
}

/// Tracks the active locale across the server→client transition.
///
/// State machine: starts in `Server` phase with the base locale active
/// regardless of any stored preference. `mounted()` transitions to `Client`
/// and adopts the stored preference iff it is a supported locale.
/// `set_active()` switches locale on explicit user request, persisting the
/// choice; unsupported codes are silently ignored.
pub struct LocaleSelector<S: PreferenceStore> {
    phase: RenderPhase,
    active: String,
    supported: Vec<String>,
    store: S,
}

impl<S: PreferenceStore> LocaleSelector<S> {
    /// Create a selector in the server phase, pinned to the base locale.
    ///
    /// `supported` is the active-locale set from the language registry.
    pub fn new(supported: Vec<String>, store: S) -> Self {
        Self {
            phase: RenderPhase::Server,
            active: BASE_LOCALE.to_string(),
            supported,
            store,
        }
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.supported.iter().any(|c| c == code)
    }

    /// Transition to the client phase and adopt the stored preference.
    ///
    /// Idempotent: calling again after the transition changes nothing. A
    /// missing or unsupported stored value leaves the base locale active.
    pub fn mounted(&mut self) {
        if self.phase == RenderPhase::Client {
            return;
        }
        self.phase = RenderPhase::Client;

        if let Some(stored) = self.store.get(PREFERENCE_KEY) {
            if self.is_supported(&stored) {
                self.active = stored;
            }
        }
    }

    /// Switch to locale `code` and persist the choice.
    ///
    /// Unsupported codes are ignored without error. During the server phase
    /// the preference storage is unreachable, so the call is also a no-op.
    pub fn set_active(&mut self, code: &str) {
        if self.phase == RenderPhase::Server {
            return;
        }
        if !self.is_supported(code) {
            return;
        }
        self.active = code.to_string();
        self.store.set(PREFERENCE_KEY, code);
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
