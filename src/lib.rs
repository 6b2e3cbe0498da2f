//! Content backend for the marketing site.
//!
//! The library is organized around a small set of modules:
//!
//! - `config`: environment-driven configuration
//! - `db`: SQLite-backed storage for the four content tables
//! - `error`: the API error taxonomy and its HTTP mapping
//! - `i18n`: translation resolution, fallback and locale preference
//! - `routes`: the REST API surface
//! - `security`: admin API key guard

pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod routes;
pub mod security;
