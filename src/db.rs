use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;

/// A supported locale, managed through the admin CRUD surface.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub is_active: bool,
    pub sort_order: i64,
}

/// A single localized string, keyed by `(lang, key)`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: i64,
    pub lang: String,
    pub key: String,
    pub value: String,
    pub category: String,
}

/// An admin-authored blog post. Tags are a list in the API and a JSON text
/// column in storage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A visitor contact-form submission.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub service_interested: Option<String>,
    pub created_at: String,
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the content database and create tables on first run.
    ///
    /// The database is constructed once at process start and passed down;
    /// there is no ambient connection singleton.
    pub async fn connect(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        // WAL keeps readers unblocked while a writer holds the lock;
        // the busy timeout serializes racing writers instead of erroring.
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {}", database_path))?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS languages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                native_name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                sort_order INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create languages table")?;

        // (lang, key) is the natural key; upserts rely on the constraint.
        // lang is intentionally not a foreign key to languages.code.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lang TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'general',
                UNIQUE (lang, key)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create translations table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS blog_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                excerpt TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create blog_posts table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                service_interested TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create contacts table")?;

        Ok(())
    }

    // ==================== Languages ====================

    /// List languages ordered by sort_order, optionally only active ones.
    pub async fn list_languages(&self, active_only: bool) -> Result<Vec<Language>> {
        let sql = if active_only {
            "SELECT id, code, name, native_name, is_active, sort_order
             FROM languages WHERE is_active = 1
             ORDER BY sort_order, code"
        } else {
            "SELECT id, code, name, native_name, is_active, sort_order
             FROM languages
             ORDER BY sort_order, code"
        };

        sqlx::query_as::<_, Language>(sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list languages")
    }

    pub async fn get_language(&self, id: i64) -> Result<Option<Language>> {
        sqlx::query_as::<_, Language>(
            "SELECT id, code, name, native_name, is_active, sort_order
             FROM languages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load language")
    }

    /// Check whether a locale code is already taken, excluding one row
    /// (used when updating a language in place).
    pub async fn language_code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM languages WHERE code = ? AND id != ?",
        )
        .bind(code)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_one(&self.pool)
        .await
        .context("Failed to check language code")?;

        Ok(count > 0)
    }

    pub async fn create_language(
        &self,
        code: &str,
        name: &str,
        native_name: &str,
        is_active: bool,
        sort_order: i64,
    ) -> Result<Language> {
        let result = sqlx::query(
            "INSERT INTO languages (code, name, native_name, is_active, sort_order)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(code)
        .bind(name)
        .bind(native_name)
        .bind(is_active)
        .bind(sort_order)
        .execute(&self.pool)
        .await
        .context("Failed to create language")?;

        let id = result.last_insert_rowid();
        self.get_language(id)
            .await?
            .context("Language row missing after insert")
    }

    /// Persist a fully-populated language row. Returns false when the id
    /// no longer exists.
    pub async fn update_language(&self, language: &Language) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE languages
             SET code = ?, name = ?, native_name = ?, is_active = ?, sort_order = ?
             WHERE id = ?",
        )
        .bind(&language.code)
        .bind(&language.name)
        .bind(&language.native_name)
        .bind(language.is_active)
        .bind(language.sort_order)
        .bind(language.id)
        .execute(&self.pool)
        .await
        .context("Failed to update language")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_language(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM languages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete language")?;

        Ok(result.rows_affected() > 0)
    }

    /// Codes of all active languages, in presentation order. This is the
    /// supported-locale set the preference guard validates against.
    pub async fn active_language_codes(&self) -> Result<Vec<String>> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT code FROM languages WHERE is_active = 1 ORDER BY sort_order, code",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active language codes")?;

        Ok(codes)
    }

    // ==================== Translations ====================

    /// Load the full key→value map for a locale, optionally filtered by
    /// category. A locale with no rows yields an empty map, not an error.
    pub async fn translation_map(
        &self,
        lang: &str,
        category: Option<&str>,
    ) -> Result<HashMap<String, String>> {
        let rows = match category {
            Some(cat) => {
                sqlx::query(
                    "SELECT key, value FROM translations WHERE lang = ? AND category = ?",
                )
                .bind(lang)
                .bind(cat)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT key, value FROM translations WHERE lang = ?")
                    .bind(lang)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to load translation map")?;

        let mut map = HashMap::with_capacity(rows.len());
        for row in rows {
            map.insert(row.get::<String, _>("key"), row.get::<String, _>("value"));
        }
        Ok(map)
    }

    /// Insert or overwrite the `(lang, key)` pair. Idempotent under repeated
    /// identical calls; concurrent writers race with last-write-wins.
    pub async fn upsert_translation(
        &self,
        lang: &str,
        key: &str,
        value: &str,
        category: &str,
    ) -> Result<Translation> {
        sqlx::query(
            "INSERT INTO translations (lang, key, value, category)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (lang, key) DO UPDATE
             SET value = excluded.value, category = excluded.category",
        )
        .bind(lang)
        .bind(key)
        .bind(value)
        .bind(category)
        .execute(&self.pool)
        .await
        .context("Failed to upsert translation")?;

        sqlx::query_as::<_, Translation>(
            "SELECT id, lang, key, value, category
             FROM translations WHERE lang = ? AND key = ?",
        )
        .bind(lang)
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .context("Translation row missing after upsert")
    }

    /// Idempotent delete; absence of the id is not an error.
    pub async fn delete_translation(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM translations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete translation")?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== Blog posts ====================

    fn post_from_row(row: &SqliteRow) -> BlogPost {
        let tags_json: String = row.get("tags");
        BlogPost {
            id: row.get("id"),
            title: row.get("title"),
            slug: row.get("slug"),
            excerpt: row.get("excerpt"),
            content: row.get("content"),
            // Tolerate hand-edited rows: garbage tags degrade to none
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            published: row.get("published"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// List posts newest first, optionally only published ones.
    pub async fn list_posts(&self, published_only: bool) -> Result<Vec<BlogPost>> {
        let sql = if published_only {
            "SELECT id, title, slug, excerpt, content, tags, published, created_at, updated_at
             FROM blog_posts WHERE published = 1
             ORDER BY created_at DESC, id DESC"
        } else {
            "SELECT id, title, slug, excerpt, content, tags, published, created_at, updated_at
             FROM blog_posts
             ORDER BY created_at DESC, id DESC"
        };

        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list blog posts")?;

        Ok(rows.iter().map(Self::post_from_row).collect())
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<BlogPost>> {
        let row = sqlx::query(
            "SELECT id, title, slug, excerpt, content, tags, published, created_at, updated_at
             FROM blog_posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load blog post")?;

        Ok(row.as_ref().map(Self::post_from_row))
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query(
            "SELECT id, title, slug, excerpt, content, tags, published, created_at, updated_at
             FROM blog_posts WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load blog post by slug")?;

        Ok(row.as_ref().map(Self::post_from_row))
    }

    pub async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(exclude_id.unwrap_or(-1))
                .fetch_one(&self.pool)
                .await
                .context("Failed to check slug")?;

        Ok(count > 0)
    }

    pub async fn create_post(
        &self,
        title: &str,
        slug: &str,
        excerpt: &str,
        content: &str,
        tags: &[String],
        published: bool,
    ) -> Result<BlogPost> {
        let now = Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(tags).context("Failed to encode tags")?;

        let result = sqlx::query(
            "INSERT INTO blog_posts (title, slug, excerpt, content, tags, published, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(slug)
        .bind(excerpt)
        .bind(content)
        .bind(&tags_json)
        .bind(published)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("Failed to create blog post")?;

        let id = result.last_insert_rowid();
        self.get_post(id)
            .await?
            .context("Blog post row missing after insert")
    }

    /// Persist a fully-populated post row, refreshing `updated_at`.
    /// Returns false when the id no longer exists.
    pub async fn update_post(&self, post: &BlogPost) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(&post.tags).context("Failed to encode tags")?;

        let result = sqlx::query(
            "UPDATE blog_posts
             SET title = ?, slug = ?, excerpt = ?, content = ?, tags = ?, published = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&tags_json)
        .bind(post.published)
        .bind(&now)
        .bind(post.id)
        .execute(&self.pool)
        .await
        .context("Failed to update blog post")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_post(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete blog post")?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== Contacts ====================

    pub async fn create_contact(
        &self,
        name: &str,
        email: &str,
        message: &str,
        service_interested: Option<&str>,
    ) -> Result<Contact> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO contacts (name, email, message, service_interested, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(message)
        .bind(service_interested)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("Failed to create contact")?;

        let id = result.last_insert_rowid();

        sqlx::query_as::<_, Contact>(
            "SELECT id, name, email, message, service_interested, created_at
             FROM contacts WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Contact row missing after insert")
    }

    /// List submissions newest first.
    pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
        sqlx::query_as::<_, Contact>(
            "SELECT id, name, email, message, service_interested, created_at
             FROM contacts
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list contacts")
    }

    pub async fn delete_contact(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete contact")?;

        Ok(result.rows_affected() > 0)
    }
}
