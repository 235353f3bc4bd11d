//! Storage layer for jot.
//!
//! Provides persistence for tags, projects, and captured items using
//! `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` can move between threads but cannot be shared
//! without external synchronization. [`SharedDatabase`] wraps one in a mutex
//! and implements the core repository traits for async capture flows.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 format (e.g.,
//! `2024-01-15T10:30:00.000Z`), so lexicographic ordering matches
//! chronological ordering. Tag and project names are unique under
//! `COLLATE NOCASE`; creating a name that differs only in casing returns the
//! existing row instead of inserting a duplicate.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;
use uuid::Uuid;

use jot_core::{ProjectRef, ProjectRepository, RepoError, TagRef, TagRepository};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A stored tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// A stored project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Fields needed to store a new captured item.
///
/// `kind` must be one of `task`, `note`, or `inbox`; the schema enforces
/// this. Tag and project ids come from the provisioning step, so links to
/// entities that failed to provision are simply absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub raw_content: String,
    pub content: String,
    pub kind: String,
    pub suggested_reason: Option<String>,
    pub tag_ids: Vec<String>,
    pub project_ids: Vec<String>,
}

/// A captured item as stored, with its linked entity names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: String,
    pub raw_content: String,
    pub content: String,
    pub kind: String,
    pub suggested_reason: Option<String>,
    pub created_at: String,
    pub tags: Vec<String>,
    pub projects: Vec<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL COLLATE NOCASE UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL COLLATE NOCASE UNIQUE,
                created_at TEXT NOT NULL
            );

            -- Items table: one row per capture
            -- kind: 'task', 'note', or 'inbox' for untyped captures
            -- created_at: ISO 8601 format (e.g., '2024-01-15T10:30:00.000Z')
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                raw_content TEXT NOT NULL,
                content TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('task', 'note', 'inbox')),
                suggested_reason TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_created ON items(created_at);
            CREATE INDEX IF NOT EXISTS idx_items_kind ON items(kind);

            CREATE TABLE IF NOT EXISTS item_tags (
                item_id TEXT NOT NULL,
                tag_id TEXT NOT NULL,
                PRIMARY KEY (item_id, tag_id),
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id);

            CREATE TABLE IF NOT EXISTS item_projects (
                item_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                PRIMARY KEY (item_id, project_id),
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_item_projects_project ON item_projects(project_id);
            ",
        )?;
        Ok(())
    }

    /// Creates a tag, or returns the existing row on a case-insensitive
    /// name collision.
    pub fn create_tag(&mut self, name: &str) -> Result<TagRecord, DbError> {
        let id = Uuid::new_v4().to_string();
        let created_at = format_timestamp(Utc::now());
        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO NOTHING",
            params![id, name, created_at],
        )?;
        let record = tx.query_row(
            "SELECT id, name, created_at FROM tags WHERE name = ?",
            params![name],
            |row| {
                Ok(TagRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )?;
        tx.commit()?;
        if inserted == 1 {
            tracing::debug!(name, "created tag");
        }
        Ok(record)
    }

    /// Looks up a tag by name, case-insensitively.
    pub fn find_tag(&self, name: &str) -> Result<Option<TagRecord>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM tags WHERE name = ?")?;
        let mut rows = stmt.query_map(params![name], |row| {
            Ok(TagRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    /// Lists all tags ordered by name.
    pub fn list_tags(&self) -> Result<Vec<TagRecord>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM tags ORDER BY name COLLATE NOCASE ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TagRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    /// Creates a project, or returns the existing row on a case-insensitive
    /// name collision.
    pub fn create_project(&mut self, name: &str) -> Result<ProjectRecord, DbError> {
        let id = Uuid::new_v4().to_string();
        let created_at = format_timestamp(Utc::now());
        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO projects (id, name, created_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO NOTHING",
            params![id, name, created_at],
        )?;
        let record = tx.query_row(
            "SELECT id, name, created_at FROM projects WHERE name = ?",
            params![name],
            |row| {
                Ok(ProjectRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )?;
        tx.commit()?;
        if inserted == 1 {
            tracing::debug!(name, "created project");
        }
        Ok(record)
    }

    /// Looks up a project by name, case-insensitively.
    pub fn find_project(&self, name: &str) -> Result<Option<ProjectRecord>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM projects WHERE name = ?")?;
        let mut rows = stmt.query_map(params![name], |row| {
            Ok(ProjectRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    /// Lists all projects ordered by name.
    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at FROM projects ORDER BY name COLLATE NOCASE ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProjectRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Stores a captured item with its tag and project links.
    pub fn insert_item(&mut self, item: &NewItem) -> Result<ItemRecord, DbError> {
        let id = Uuid::new_v4().to_string();
        let created_at = format_timestamp(Utc::now());
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO items (id, raw_content, content, kind, suggested_reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                id,
                item.raw_content,
                item.content,
                item.kind,
                item.suggested_reason,
                created_at,
            ],
        )?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO item_tags (item_id, tag_id) VALUES (?, ?)")?;
            for tag_id in &item.tag_ids {
                stmt.execute(params![id, tag_id])?;
            }
        }
        {
            let mut stmt = tx
                .prepare("INSERT OR IGNORE INTO item_projects (item_id, project_id) VALUES (?, ?)")?;
            for project_id in &item.project_ids {
                stmt.execute(params![id, project_id])?;
            }
        }
        let tags = linked_names(&tx, "item_tags", "tag_id", "tags", &id)?;
        let projects = linked_names(&tx, "item_projects", "project_id", "projects", &id)?;
        tx.commit()?;
        Ok(ItemRecord {
            id,
            raw_content: item.raw_content.clone(),
            content: item.content.clone(),
            kind: item.kind.clone(),
            suggested_reason: item.suggested_reason.clone(),
            created_at,
            tags,
            projects,
        })
    }

    /// Lists all captured items, newest first, with their entity names.
    pub fn list_items(&self) -> Result<Vec<ItemRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, raw_content, content, kind, suggested_reason, created_at
            FROM items
            ORDER BY created_at DESC, id DESC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ItemRecord {
                id: row.get(0)?,
                raw_content: row.get(1)?,
                content: row.get(2)?,
                kind: row.get(3)?,
                suggested_reason: row.get(4)?,
                created_at: row.get(5)?,
                tags: Vec::new(),
                projects: Vec::new(),
            })
        })?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }

        let tags_by_item = self.grouped_names("item_tags", "tag_id", "tags")?;
        let projects_by_item = self.grouped_names("item_projects", "project_id", "projects")?;
        for item in &mut items {
            if let Some(tags) = tags_by_item.get(&item.id) {
                item.tags.clone_from(tags);
            }
            if let Some(projects) = projects_by_item.get(&item.id) {
                item.projects.clone_from(projects);
            }
        }
        Ok(items)
    }

    /// Entity names per item, in link order.
    fn grouped_names(
        &self,
        link_table: &str,
        link_column: &str,
        entity_table: &str,
    ) -> Result<HashMap<String, Vec<String>>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT link.item_id, entity.name
            FROM {link_table} link
            JOIN {entity_table} entity ON entity.id = link.{link_column}
            ORDER BY link.rowid ASC
            "
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let (item_id, name) = row?;
            grouped.entry(item_id).or_default().push(name);
        }
        Ok(grouped)
    }
}

/// Linked entity names for one item, in link order.
fn linked_names(
    conn: &Connection,
    link_table: &str,
    link_column: &str,
    entity_table: &str,
    item_id: &str,
) -> Result<Vec<String>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "
        SELECT entity.name
        FROM {link_table} link
        JOIN {entity_table} entity ON entity.id = link.{link_column}
        WHERE link.item_id = ?
        ORDER BY link.rowid ASC
        "
    ))?;
    let rows = stmt.query_map(params![item_id], |row| row.get(0))?;
    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_repo_error(err: DbError) -> RepoError {
    RepoError::storage(err.to_string())
}

/// A [`Database`] behind a mutex, implementing the core repository traits.
///
/// The mutex serializes access so the async traits can take `&self`; the
/// repository methods themselves never await while holding the lock.
pub struct SharedDatabase {
    inner: Mutex<Database>,
}

impl SharedDatabase {
    /// Wraps a database for shared use.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self {
            inner: Mutex::new(db),
        }
    }

    /// Returns the wrapped database.
    #[must_use]
    pub fn into_inner(self) -> Database {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TagRepository for SharedDatabase {
    async fn list_tags(&self) -> Result<Vec<TagRef>, RepoError> {
        let tags = self.lock().list_tags().map_err(to_repo_error)?;
        Ok(tags
            .into_iter()
            .map(|tag| TagRef {
                id: tag.id,
                name: tag.name,
            })
            .collect())
    }

    async fn create_tag(&self, name: &str) -> Result<TagRef, RepoError> {
        let tag = self.lock().create_tag(name).map_err(to_repo_error)?;
        Ok(TagRef {
            id: tag.id,
            name: tag.name,
        })
    }
}

#[async_trait]
impl ProjectRepository for SharedDatabase {
    async fn list_projects(&self) -> Result<Vec<ProjectRef>, RepoError> {
        let projects = self.lock().list_projects().map_err(to_repo_error)?;
        Ok(projects
            .into_iter()
            .map(|project| ProjectRef {
                id: project.id,
                name: project.name,
            })
            .collect())
    }

    async fn create_project(&self, name: &str) -> Result<ProjectRef, RepoError> {
        let project = self.lock().create_project(name).map_err(to_repo_error)?;
        Ok(ProjectRef {
            id: project.id,
            name: project.name,
        })
    }
}
