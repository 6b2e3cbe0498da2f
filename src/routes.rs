//! REST API surface: CRUD over languages, translations, blog posts and
//! contact submissions, plus a liveness probe.
//!
//! Request bodies are deserialized into typed payload structs and validated
//! before any domain logic runs. Responses share one envelope shape:
//! `{"success": true, "data": …}` on success; errors render through
//! `ApiError` with the same flag set to false.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{Database, Language};
use crate::error::ApiError;
use crate::security::RequireApiKey;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/languages", get(list_languages).post(create_language))
        .route(
            "/api/languages/:id",
            put(update_language).delete(delete_language),
        )
        .route(
            "/api/translations",
            get(get_translations).post(upsert_translation),
        )
        .route("/api/translations/bulk", post(bulk_import))
        .route("/api/translations/:id", delete(delete_translation))
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/:slug",
            get(get_post_by_slug).put(update_post).delete(delete_post),
        )
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route("/api/contacts/:id", delete(delete_contact))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==================== Validation helpers ====================

fn slug_regex() -> &'static Regex {
    static SLUG_RE: OnceLock<Regex> = OnceLock::new();
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap())
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

/// Locale codes are short identifiers like "en" or "pt-br".
fn is_valid_locale_code(code: &str) -> bool {
    (2..=10).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn reject_if_invalid(errors: Vec<String>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

// ==================== Health ====================

async fn health() -> Json<ApiResponse<serde_json::Value>> {
    ok(json!({ "status": "ok" }))
}

// ==================== Languages ====================

#[derive(Debug, Deserialize)]
struct LanguageQuery {
    active: Option<bool>,
}

async fn list_languages(
    State(state): State<AppState>,
    Query(params): Query<LanguageQuery>,
) -> Result<Json<ApiResponse<Vec<Language>>>, ApiError> {
    let languages = state
        .db
        .list_languages(params.active.unwrap_or(false))
        .await?;
    Ok(ok(languages))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLanguagePayload {
    code: String,
    name: String,
    native_name: String,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    sort_order: i64,
}

fn default_true() -> bool {
    true
}

impl CreateLanguagePayload {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !is_valid_locale_code(&self.code) {
            errors.push("code must be 2-10 characters (letters, digits, '-')".to_string());
        }
        if self.name.trim().is_empty() {
            errors.push("name is required".to_string());
        }
        if self.native_name.trim().is_empty() {
            errors.push("nativeName is required".to_string());
        }
        errors
    }
}

async fn create_language(
    _: RequireApiKey,
    State(state): State<AppState>,
    Json(payload): Json<CreateLanguagePayload>,
) -> Result<(StatusCode, Json<ApiResponse<Language>>), ApiError> {
    reject_if_invalid(payload.validation_errors())?;

    if state.db.language_code_exists(&payload.code, None).await? {
        return Err(ApiError::Conflict(format!(
            "language code '{}' already exists",
            payload.code
        )));
    }

    let language = state
        .db
        .create_language(
            &payload.code,
            &payload.name,
            &payload.native_name,
            payload.is_active,
            payload.sort_order,
        )
        .await?;

    info!("Created language '{}'", language.code);
    Ok((StatusCode::CREATED, ok(language)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLanguagePayload {
    code: Option<String>,
    name: Option<String>,
    native_name: Option<String>,
    is_active: Option<bool>,
    sort_order: Option<i64>,
}

impl UpdateLanguagePayload {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(code) = &self.code {
            if !is_valid_locale_code(code) {
                errors.push("code must be 2-10 characters (letters, digits, '-')".to_string());
            }
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push("name must not be empty".to_string());
            }
        }
        if let Some(native_name) = &self.native_name {
            if native_name.trim().is_empty() {
                errors.push("nativeName must not be empty".to_string());
            }
        }
        errors
    }
}

async fn update_language(
    _: RequireApiKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLanguagePayload>,
) -> Result<Json<ApiResponse<Language>>, ApiError> {
    reject_if_invalid(payload.validation_errors())?;

    let mut language = state
        .db
        .get_language(id)
        .await?
        .ok_or(ApiError::NotFound("language"))?;

    if let Some(code) = payload.code {
        if code != language.code && state.db.language_code_exists(&code, Some(id)).await? {
            return Err(ApiError::Conflict(format!(
                "language code '{}' already exists",
                code
            )));
        }
        language.code = code;
    }
    if let Some(name) = payload.name {
        language.name = name;
    }
    if let Some(native_name) = payload.native_name {
        language.native_name = native_name;
    }
    if let Some(is_active) = payload.is_active {
        language.is_active = is_active;
    }
    if let Some(sort_order) = payload.sort_order {
        language.sort_order = sort_order;
    }

    if !state.db.update_language(&language).await? {
        return Err(ApiError::NotFound("language"));
    }

    Ok(ok(language))
}

async fn delete_language(
    _: RequireApiKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !state.db.delete_language(id).await? {
        return Err(ApiError::NotFound("language"));
    }
    Ok(ok(json!({ "deleted": true })))
}

// ==================== Translations ====================

#[derive(Debug, Deserialize)]
struct TranslationQuery {
    lang: Option<String>,
    category: Option<String>,
}

async fn get_translations(
    State(state): State<AppState>,
    Query(params): Query<TranslationQuery>,
) -> Result<Json<ApiResponse<HashMap<String, String>>>, ApiError> {
    let lang = params
        .lang
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ApiError::Validation(vec!["lang query parameter is required".to_string()]))?;

    let map = state
        .db
        .translation_map(&lang, params.category.as_deref())
        .await?;
    Ok(ok(map))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationPayload {
    pub lang: String,
    pub key: String,
    pub value: String,
    pub category: Option<String>,
}

impl TranslationPayload {
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !is_valid_locale_code(&self.lang) {
            errors.push("lang must be 2-10 characters (letters, digits, '-')".to_string());
        }
        if self.key.trim().is_empty() {
            errors.push("key is required".to_string());
        }
        errors
    }

    fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("general")
    }
}

async fn upsert_translation(
    _: RequireApiKey,
    State(state): State<AppState>,
    Json(payload): Json<TranslationPayload>,
) -> Result<Json<ApiResponse<crate::db::Translation>>, ApiError> {
    reject_if_invalid(payload.validation_errors())?;

    let translation = state
        .db
        .upsert_translation(
            &payload.lang,
            &payload.key,
            &payload.value,
            payload.category(),
        )
        .await?;

    Ok(ok(translation))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Best-effort batch upsert: each entry's failure is independent and does
/// not abort the remaining entries.
pub async fn bulk_upsert_translations(
    db: &Database,
    entries: &[TranslationPayload],
) -> BulkImportReport {
    let mut report = BulkImportReport {
        imported: 0,
        skipped: 0,
        errors: Vec::new(),
    };

    for (index, entry) in entries.iter().enumerate() {
        let validation = entry.validation_errors();
        if !validation.is_empty() {
            report.skipped += 1;
            report
                .errors
                .push(format!("entry {}: {}", index, validation.join("; ")));
            continue;
        }

        match db
            .upsert_translation(&entry.lang, &entry.key, &entry.value, entry.category())
            .await
        {
            Ok(_) => report.imported += 1,
            Err(e) => {
                warn!("Bulk import entry {} failed: {:#}", index, e);
                report.skipped += 1;
                report.errors.push(format!("entry {}: storage error", index));
            }
        }
    }

    report
}

async fn bulk_import(
    _: RequireApiKey,
    State(state): State<AppState>,
    Json(entries): Json<Vec<TranslationPayload>>,
) -> Result<Json<ApiResponse<BulkImportReport>>, ApiError> {
    let report = bulk_upsert_translations(&state.db, &entries).await;
    info!(
        "Bulk import: {} imported, {} skipped",
        report.imported, report.skipped
    );
    Ok(ok(report))
}

/// Idempotent: deleting an id that is already gone is still a success.
async fn delete_translation(
    _: RequireApiKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let deleted = state.db.delete_translation(id).await?;
    Ok(ok(json!({ "deleted": deleted })))
}

// ==================== Blog posts ====================

#[derive(Debug, Deserialize)]
struct PostQuery {
    published: Option<bool>,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostQuery>,
) -> Result<Json<ApiResponse<Vec<crate::db::BlogPost>>>, ApiError> {
    let posts = state.db.list_posts(params.published.unwrap_or(false)).await?;
    Ok(ok(posts))
}

async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<crate::db::BlogPost>>, ApiError> {
    let post = state
        .db
        .get_post_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound("blog post"))?;
    Ok(ok(post))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostPayload {
    title: String,
    slug: String,
    #[serde(default)]
    excerpt: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    published: bool,
}

impl CreatePostPayload {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("title is required".to_string());
        }
        if !slug_regex().is_match(&self.slug) {
            errors.push("slug must be lowercase letters, digits and hyphens".to_string());
        }
        if self.content.trim().is_empty() {
            errors.push("content is required".to_string());
        }
        errors
    }
}

async fn create_post(
    _: RequireApiKey,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostPayload>,
) -> Result<(StatusCode, Json<ApiResponse<crate::db::BlogPost>>), ApiError> {
    reject_if_invalid(payload.validation_errors())?;

    if state.db.slug_exists(&payload.slug, None).await? {
        return Err(ApiError::Conflict(format!(
            "blog post slug '{}' already exists",
            payload.slug
        )));
    }

    let post = state
        .db
        .create_post(
            &payload.title,
            &payload.slug,
            &payload.excerpt,
            &payload.content,
            &payload.tags,
            payload.published,
        )
        .await?;

    info!("Created blog post '{}'", post.slug);
    Ok((StatusCode::CREATED, ok(post)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostPayload {
    title: Option<String>,
    slug: Option<String>,
    excerpt: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    published: Option<bool>,
}

impl UpdatePostPayload {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                errors.push("title must not be empty".to_string());
            }
        }
        if let Some(slug) = &self.slug {
            if !slug_regex().is_match(slug) {
                errors.push("slug must be lowercase letters, digits and hyphens".to_string());
            }
        }
        if let Some(content) = &self.content {
            if content.trim().is_empty() {
                errors.push("content must not be empty".to_string());
            }
        }
        errors
    }
}

async fn update_post(
    _: RequireApiKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostPayload>,
) -> Result<Json<ApiResponse<crate::db::BlogPost>>, ApiError> {
    reject_if_invalid(payload.validation_errors())?;

    let mut post = state
        .db
        .get_post(id)
        .await?
        .ok_or(ApiError::NotFound("blog post"))?;

    if let Some(slug) = payload.slug {
        if slug != post.slug && state.db.slug_exists(&slug, Some(id)).await? {
            return Err(ApiError::Conflict(format!(
                "blog post slug '{}' already exists",
                slug
            )));
        }
        post.slug = slug;
    }
    if let Some(title) = payload.title {
        post.title = title;
    }
    if let Some(excerpt) = payload.excerpt {
        post.excerpt = excerpt;
    }
    if let Some(content) = payload.content {
        post.content = content;
    }
    if let Some(tags) = payload.tags {
        post.tags = tags;
    }
    if let Some(published) = payload.published {
        post.published = published;
    }

    if !state.db.update_post(&post).await? {
        return Err(ApiError::NotFound("blog post"));
    }

    // Reload so the response carries the refreshed updated_at
    let post = state
        .db
        .get_post(id)
        .await?
        .ok_or(ApiError::NotFound("blog post"))?;
    Ok(ok(post))
}

async fn delete_post(
    _: RequireApiKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !state.db.delete_post(id).await? {
        return Err(ApiError::NotFound("blog post"));
    }
    Ok(ok(json!({ "deleted": true })))
}

// ==================== Contacts ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateContactPayload {
    name: String,
    email: String,
    message: String,
    service_interested: Option<String>,
}

impl CreateContactPayload {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name is required".to_string());
        }
        if !email_regex().is_match(&self.email) {
            errors.push("email must be a valid address".to_string());
        }
        if self.message.trim().is_empty() {
            errors.push("message is required".to_string());
        }
        errors
    }
}

async fn create_contact(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactPayload>,
) -> Result<(StatusCode, Json<ApiResponse<crate::db::Contact>>), ApiError> {
    reject_if_invalid(payload.validation_errors())?;

    let contact = state
        .db
        .create_contact(
            &payload.name,
            &payload.email,
            &payload.message,
            payload.service_interested.as_deref(),
        )
        .await?;

    info!("New contact submission from {}", contact.email);
    Ok((StatusCode::CREATED, ok(contact)))
}

async fn list_contacts(
    _: RequireApiKey,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<crate::db::Contact>>>, ApiError> {
    let contacts = state.db.list_contacts().await?;
    Ok(ok(contacts))
}

async fn delete_contact(
    _: RequireApiKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !state.db.delete_contact(id).await? {
        return Err(ApiError::NotFound("contact"));
    }
    Ok(ok(json!({ "deleted": true })))
}
