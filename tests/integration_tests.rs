//! Integration tests for the marketing site API
//!
//! These tests drive the full router over a temporary database and verify
//! the complete request/response contracts: envelopes, validation, conflicts,
//! auth, and the translation fallback behavior end to end.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use site_api::config::Config;
use site_api::db::Database;
use site_api::i18n::{LocaleSelector, MemoryPreferenceStore, TranslationResolver};
use site_api::routes::{router, AppState};

const ADMIN_KEY: &str = "test-admin-key";

// ==================== Test Helpers ====================

/// Build an app over a fresh temporary database.
///
/// `require_key` controls whether the admin surface is guarded.
async fn test_app(require_key: bool) -> (Router, AppState, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test_site.db");
    let db = Database::connect(db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");

    let config = Config {
        environment: "test".to_string(),
        port: 0,
        database_path: db_path.to_str().unwrap().to_string(),
        api_key: require_key.then(|| ADMIN_KEY.to_string()),
    };

    let state = AppState {
        config: Arc::new(config),
        db,
    };
    (router(state.clone()), state, temp_dir)
}

fn request(method: Method, uri: &str, body: Option<Value>, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response should be JSON")
    };
    (status, value)
}

async fn seed_language(app: &Router, code: &str, name: &str, sort_order: i64) {
    let (status, _) = send(
        app,
        request(
            Method::POST,
            "/api/languages",
            Some(json!({
                "code": code,
                "name": name,
                "nativeName": name,
                "sortOrder": sort_order,
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn seed_translation(app: &Router, lang: &str, key: &str, value: &str) {
    let (status, _) = send(
        app,
        request(
            Method::POST,
            "/api/translations",
            Some(json!({ "lang": lang, "key": key, "value": value })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ==================== Health ====================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

// ==================== Language CRUD ====================

#[tokio::test]
async fn test_language_lifecycle() {
    let (app, _state, _temp) = test_app(false).await;

    // Create
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/languages",
            Some(json!({
                "code": "vi",
                "name": "Vietnamese",
                "nativeName": "Tiếng Việt",
                "sortOrder": 2,
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["code"], "vi");
    assert_eq!(body["data"]["nativeName"], "Tiếng Việt");
    assert_eq!(body["data"]["isActive"], true);
    let id = body["data"]["id"].as_i64().expect("id");

    // Update
    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/languages/{}", id),
            Some(json!({ "isActive": false })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["data"]["code"], "vi", "Untouched fields survive");

    // Delete
    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/api/languages/{}", id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Gone now
    let (status, body) = send(
        &app,
        request(Method::DELETE, &format!("/api/languages/{}", id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_languages_listed_in_sort_order() {
    let (app, _state, _temp) = test_app(false).await;

    seed_language(&app, "vi", "Vietnamese", 2).await;
    seed_language(&app, "en", "English", 1).await;

    let (status, body) = send(&app, request(Method::GET, "/api/languages", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    let codes: Vec<&str> = body["data"]
        .as_array()
        .expect("array")
        .iter()
        .map(|l| l["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["en", "vi"]);
}

#[tokio::test]
async fn test_language_duplicate_code_conflict() {
    let (app, state, _temp) = test_app(false).await;

    seed_language(&app, "en", "English", 1).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/languages",
            Some(json!({ "code": "en", "name": "English again", "nativeName": "English" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("en"));

    // Conflict is detected before any write
    let languages = state.db.list_languages(false).await.expect("list");
    assert_eq!(languages.len(), 1);
}

#[tokio::test]
async fn test_language_validation_reports_all_fields() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/languages",
            Some(json!({ "code": "x", "name": "", "nativeName": "" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"].as_array().expect("errors").len(), 3);
}

// ==================== Translation Store ====================

#[tokio::test]
async fn test_translation_upsert_is_idempotent() {
    let (app, _state, _temp) = test_app(false).await;

    let payload = json!({ "lang": "en", "key": "nav.home", "value": "Home" });

    let (status, first) = send(
        &app,
        request(Method::POST, "/api/translations", Some(payload.clone()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["category"], "general");

    let (status, second) = send(
        &app,
        request(Method::POST, "/api/translations", Some(payload), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(second["data"]["value"], "Home");

    let (_, map) = send(
        &app,
        request(Method::GET, "/api/translations?lang=en", None, None),
    )
    .await;
    assert_eq!(map["data"].as_object().expect("map").len(), 1);
}

#[tokio::test]
async fn test_translation_upsert_overwrites() {
    let (app, _state, _temp) = test_app(false).await;

    seed_translation(&app, "en", "hero.title", "Welcome").await;
    seed_translation(&app, "en", "hero.title", "Hello").await;

    let (_, body) = send(
        &app,
        request(Method::GET, "/api/translations?lang=en", None, None),
    )
    .await;
    assert_eq!(body["data"]["hero.title"], "Hello");
}

#[tokio::test]
async fn test_translation_map_requires_lang() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, body) = send(&app, request(Method::GET, "/api/translations", None, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().unwrap().contains("lang"));
}

#[tokio::test]
async fn test_translation_map_empty_locale_is_empty_object() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/translations?lang=vi", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"].as_object().expect("map").is_empty());
}

#[tokio::test]
async fn test_translation_map_category_filter() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/translations",
            Some(json!({ "lang": "en", "key": "nav.home", "value": "Home", "category": "nav" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    seed_translation(&app, "en", "hero.title", "Welcome").await;

    let (_, body) = send(
        &app,
        request(
            Method::GET,
            "/api/translations?lang=en&category=nav",
            None,
            None,
        ),
    )
    .await;

    let map = body["data"].as_object().expect("map");
    assert_eq!(map.len(), 1);
    assert!(map.contains_key("nav.home"));
}

#[tokio::test]
async fn test_translation_delete_is_idempotent() {
    let (app, _state, _temp) = test_app(false).await;

    let (_, body) = send(
        &app,
        request(
            Method::POST,
            "/api/translations",
            Some(json!({ "lang": "en", "key": "nav.home", "value": "Home" })),
            None,
        ),
    )
    .await;
    let id = body["data"]["id"].as_i64().expect("id");

    let (status, body) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/translations/{}", id),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);

    // Absence of the id is not an error
    let (status, body) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/translations/{}", id),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], false);
}

#[tokio::test]
async fn test_bulk_import_skips_bad_entries() {
    let (app, _state, _temp) = test_app(false).await;

    let entries = json!([
        { "lang": "en", "key": "nav.home", "value": "Home" },
        { "lang": "", "key": "nav.about", "value": "About" },
        { "lang": "vi", "key": "", "value": "x" },
        { "lang": "vi", "key": "nav.home", "value": "Trang chủ" },
    ]);

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/translations/bulk", Some(entries), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["imported"], 2);
    assert_eq!(body["data"]["skipped"], 2);
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 2);

    // The valid entries landed despite the failures in between
    let (_, en) = send(
        &app,
        request(Method::GET, "/api/translations?lang=en", None, None),
    )
    .await;
    assert_eq!(en["data"]["nav.home"], "Home");
    let (_, vi) = send(
        &app,
        request(Method::GET, "/api/translations?lang=vi", None, None),
    )
    .await;
    assert_eq!(vi["data"]["nav.home"], "Trang chủ");
}

// ==================== Translation Resolution ====================

#[tokio::test]
async fn test_resolver_scenario_fallback_chain() {
    let (app, state, _temp) = test_app(false).await;

    // Registry: en and vi, both active. Store: only the en value exists.
    seed_language(&app, "en", "English", 1).await;
    seed_language(&app, "vi", "Vietnamese", 2).await;
    seed_translation(&app, "en", "nav.home", "Home").await;

    let resolver = TranslationResolver::load(&state.db, "vi").await;
    assert_eq!(resolver.resolve("nav.home"), "Home");
    assert_eq!(resolver.resolve("nav.missing"), "nav.missing");
}

#[tokio::test]
async fn test_resolver_active_locale_wins_over_base() {
    let (app, state, _temp) = test_app(false).await;

    seed_translation(&app, "en", "nav.home", "Home").await;
    seed_translation(&app, "vi", "nav.home", "Trang chủ").await;

    let resolver = TranslationResolver::load(&state.db, "vi").await;
    assert_eq!(resolver.resolve("nav.home"), "Trang chủ");

    let resolver = TranslationResolver::load(&state.db, "en").await;
    assert_eq!(resolver.resolve("nav.home"), "Home");
}

#[tokio::test]
async fn test_no_flash_of_wrong_locale_on_first_paint() {
    let (app, state, _temp) = test_app(false).await;

    seed_language(&app, "en", "English", 1).await;
    seed_language(&app, "vi", "Vietnamese", 2).await;
    seed_translation(&app, "en", "hero.title", "Welcome").await;
    seed_translation(&app, "vi", "hero.title", "Chào mừng").await;

    let supported = state.db.active_language_codes().await.expect("codes");

    // A previous session stored "vi", but the server render must use "en".
    let store = MemoryPreferenceStore::with_locale("vi");
    let mut selector = LocaleSelector::new(supported, store);

    let resolver = TranslationResolver::load(&state.db, selector.active()).await;
    assert_eq!(resolver.resolve("hero.title"), "Welcome");

    // After mounting on the client the stored preference takes effect.
    selector.mounted();
    assert_eq!(selector.active(), "vi");
    let resolver = TranslationResolver::load(&state.db, selector.active()).await;
    assert_eq!(resolver.resolve("hero.title"), "Chào mừng");
}

#[tokio::test]
async fn test_locale_switch_guarded_by_registry() {
    let (app, state, _temp) = test_app(false).await;

    seed_language(&app, "en", "English", 1).await;
    seed_language(&app, "vi", "Vietnamese", 2).await;

    let supported = state.db.active_language_codes().await.expect("codes");
    let mut selector = LocaleSelector::new(supported, MemoryPreferenceStore::new());
    selector.mounted();

    selector.set_active("vi");
    assert_eq!(selector.active(), "vi");

    // Unsupported codes are silently ignored
    selector.set_active("de");
    assert_eq!(selector.active(), "vi");
}

// ==================== Blog Posts ====================

#[tokio::test]
async fn test_post_lifecycle() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/posts",
            Some(json!({
                "title": "Launching the new site",
                "slug": "launching-the-new-site",
                "excerpt": "We shipped.",
                "content": "Long form body",
                "tags": ["news", "launch"],
                "published": true,
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tags"], json!(["news", "launch"]));
    let id = body["data"]["id"].as_i64().expect("id");

    // Public read by slug
    let (status, body) = send(
        &app,
        request(Method::GET, "/api/posts/launching-the-new-site", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Launching the new site");

    // Unpublish via update
    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/posts/{}", id),
            Some(json!({ "published": false })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["published"], false);

    // Published filter excludes it now
    let (_, body) = send(
        &app,
        request(Method::GET, "/api/posts?published=true", None, None),
    )
    .await;
    assert!(body["data"].as_array().expect("array").is_empty());

    // Delete
    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/api/posts/{}", id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/posts/launching-the-new-site", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_duplicate_slug_conflict() {
    let (app, state, _temp) = test_app(false).await;

    let payload = json!({
        "title": "First",
        "slug": "hello",
        "content": "body",
    });
    let (status, _) = send(
        &app,
        request(Method::POST, "/api/posts", Some(payload), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/posts",
            Some(json!({ "title": "Second", "slug": "hello", "content": "body" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let posts = state.db.list_posts(false).await.expect("list");
    assert_eq!(posts.len(), 1, "No write happened on conflict");
}

#[tokio::test]
async fn test_post_missing_slug_is_404() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/posts/no-such-post", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

// ==================== Contacts ====================

#[tokio::test]
async fn test_contact_submission_roundtrip() {
    let (app, _state, _temp) = test_app(false).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/contacts",
            Some(json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "message": "I'd like to talk about a project.",
                "serviceInterested": "consulting",
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["serviceInterested"], "consulting");

    let (status, body) = send(&app, request(Method::GET, "/api/contacts", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("array").len(), 1);
    assert_eq!(body["data"][0]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_contact_validation_no_partial_write() {
    let (app, state, _temp) = test_app(false).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/contacts",
            Some(json!({ "name": "", "email": "nope", "message": "" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().expect("errors").len(), 3);

    let contacts = state.db.list_contacts().await.expect("list");
    assert!(contacts.is_empty(), "Validation failure writes nothing");
}

// ==================== Admin Auth ====================

#[tokio::test]
async fn test_admin_routes_require_api_key() {
    let (app, _state, _temp) = test_app(true).await;

    let payload = json!({ "code": "vi", "name": "Vietnamese", "nativeName": "Tiếng Việt" });

    // Missing key
    let (status, body) = send(
        &app,
        request(Method::POST, "/api/languages", Some(payload.clone()), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    // Wrong key
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/languages",
            Some(payload.clone()),
            Some("wrong-key"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Correct key
    let (status, _) = send(
        &app,
        request(Method::POST, "/api/languages", Some(payload), Some(ADMIN_KEY)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_public_routes_do_not_require_api_key() {
    let (app, _state, _temp) = test_app(true).await;

    let (status, _) = send(&app, request(Method::GET, "/api/languages", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/translations?lang=en", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/contacts",
            Some(json!({
                "name": "Visitor",
                "email": "visitor@example.com",
                "message": "Hello",
            })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
