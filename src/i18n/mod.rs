//! Internationalization (i18n) module for multi-language support.
//!
//! This module contains the runtime side of localization: resolving a
//! translation key to display text with a predictable fallback chain, and
//! tracking which locale is active without a server/client first-paint
//! mismatch. The language and translation tables themselves are managed
//! through the admin CRUD surface in `routes`.
//!
//! # Architecture
//!
//! - `resolver`: per-request snapshot of the translation store with the
//!   three-step fallback (active locale, base locale, literal key)
//! - `preference`: persisted locale choice plus the server/client phase
//!   machine that forces the base locale until the client has mounted

mod preference;
mod resolver;

pub use preference::{
    LocaleSelector, MemoryPreferenceStore, PreferenceStore, RenderPhase, PREFERENCE_KEY,
};
pub use resolver::TranslationResolver;

/// The locale every lookup ultimately falls back to, and the locale forced
/// during the server render phase. New keys are authored here first.
pub const BASE_LOCALE: &str = "en";
