//! Audit trail.
//!
//! Mutations append one row per affected entity inside their own
//! transaction, so the trail never mentions a change that rolled back.

use rusqlite::{Connection, Row};
use serde::Serialize;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskDeleted,
    TasksReordered,
    PreferencesSaved,
}

impl EventType {
    pub const ALL: [Self; 6] = [
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskCompleted,
        Self::TaskDeleted,
        Self::TasksReordered,
        Self::PreferencesSaved,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskUpdated => "task_updated",
            Self::TaskCompleted => "task_completed",
            Self::TaskDeleted => "task_deleted",
            Self::TasksReordered => "tasks_reordered",
            Self::PreferencesSaved => "preferences_saved",
        }
    }

    /// Unknown spellings read back as `TaskUpdated`.
    fn from_db(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or(Self::TaskUpdated)
    }
}

/// Kind of row an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Task,
    Preferences,
    /// Batch operations over a user's whole board
    Board,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Preferences => "preferences",
            Self::Board => "board",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "preferences" => Self::Preferences,
            "board" => Self::Board,
            _ => Self::Task,
        }
    }
}

/// One audit row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub entity: EntityKind,
    /// Task id, or the owning user id for preferences and board events
    pub entity_id: String,
    pub event_type: EventType,
    /// User whose request caused the change
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Unix milliseconds
    pub created_at: i64,
}

impl Event {
    /// Unsaved event; the id is assigned on insert.
    #[must_use]
    pub fn new(entity: EntityKind, entity_id: &str, event_type: EventType, actor: &str) -> Self {
        Self {
            id: 0,
            entity,
            entity_id: entity_id.to_string(),
            event_type,
            actor: actor.to_string(),
            old_value: None,
            new_value: None,
            comment: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Attach the before and after value of the field that changed.
    #[must_use]
    pub fn with_values(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_value = old;
        self.new_value = new;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            entity: EntityKind::from_db(&row.get::<_, String>("entity_type")?),
            entity_id: row.get("entity_id")?,
            event_type: EventType::from_db(&row.get::<_, String>("event_type")?),
            actor: row.get("actor")?,
            old_value: row.get("old_value")?,
            new_value: row.get("new_value")?,
            comment: row.get("comment")?,
            created_at: row.get("created_at")?,
        })
    }
}

const EVENT_COLUMNS: &str =
    "id, entity_type, entity_id, event_type, actor, old_value, new_value, comment, created_at";

const DEFAULT_LIMIT: u32 = 100;

/// Append an event and return its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(conn: &Connection, event: &Event) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO events (entity_type, entity_id, event_type, actor, old_value, new_value, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            event.entity.as_str(),
            &event.entity_id,
            event.event_type.as_str(),
            &event.actor,
            &event.old_value,
            &event.new_value,
            &event.comment,
            event.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// History of one entity, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_events(
    conn: &Connection,
    entity: EntityKind,
    entity_id: &str,
    limit: Option<u32>,
) -> rusqlite::Result<Vec<Event>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY created_at DESC, id DESC
         LIMIT ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params![entity.as_str(), entity_id, limit.unwrap_or(DEFAULT_LIMIT)],
        Event::from_row,
    )?;
    rows.collect()
}

/// Everything one user changed, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_activity(
    conn: &Connection,
    actor: &str,
    limit: Option<u32>,
) -> rusqlite::Result<Vec<Event>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE actor = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params![actor, limit.unwrap_or(DEFAULT_LIMIT)],
        Event::from_row,
    )?;
    rows.collect()
}
