//! SQLite storage implementation.
//!
//! This module provides the main storage backend for YouSoul using SQLite.
//! It follows the MutationContext pattern for transaction discipline and audit logging.
//! Every read and write is scoped by the owning user id.

use crate::error::{Error, Result};
use crate::model::{
    AnticipatedMood, ColorPalette, CompletedMood, EmojiSet, NewTask, PreferencesPatch, Priority,
    ReorderItem, Task, TaskPatch, TaskStatus, UserPreferences, VisualizationIntensity, unix_now,
};
use crate::storage::events::{EntityKind, Event, EventType, get_activity, get_events, insert_event};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Column list shared by every task query, in [`map_task_row`] order.
const TASK_COLUMNS: &str = "id, user_id, title, description, status, priority, due_date, \
     due_time, anticipated_mood, completed_mood, reflection_note, reflection_photo_s3_uri, \
     order_index, completed_at, created_at, updated_at";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, tracking side effects.
///
/// Passed to mutation closures so they can record audit events that are
/// written in the same transaction as the change itself.
pub struct MutationContext {
    /// User performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    #[must_use]
    pub fn new(actor: &str) -> Self {
        Self {
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity: EntityKind, entity_id: &str, event_type: EventType) {
        self.events
            .push(Event::new(entity, entity_id, event_type, &self.actor));
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        entity: EntityKind,
        entity_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(entity, entity_id, event_type, &self.actor)
                .with_values(old_value, new_value),
        );
    }

    /// Record an event carrying a free-form comment.
    pub fn record_comment(
        &mut self,
        entity: EntityKind,
        entity_id: &str,
        event_type: EventType,
        comment: &str,
    ) {
        self.events.push(
            Event::new(entity, entity_id, event_type, &self.actor).with_comment(comment),
        );
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;
        debug!(op, actor, events = ctx.events.len(), "Mutation committed");

        Ok(result)
    }

    // ===============
    // Task Operations
    // ===============

    /// Create a task for `user_id`.
    ///
    /// Unset fields take the column defaults. A task created straight into
    /// `done` gets its completion timestamp immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_task(&mut self, user_id: &str, new: &NewTask) -> Result<Task> {
        let now = unix_now();
        let status = new.status.unwrap_or_default();
        let priority = new.priority.unwrap_or_default();
        let completed_at = (status == TaskStatus::Done).then_some(now);

        self.mutate("create_task", user_id, |tx, ctx| {
            tx.execute(
                "INSERT INTO tasks (user_id, title, description, status, priority, due_date, due_time,
                                    anticipated_mood, order_index, completed_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                rusqlite::params![
                    user_id,
                    new.title,
                    new.description,
                    status.as_str(),
                    priority.as_str(),
                    new.due_date,
                    new.due_time,
                    new.anticipated_mood.map(|m| m.as_str()),
                    new.order_index.unwrap_or(0),
                    completed_at,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            ctx.record_event(EntityKind::Task, &id.to_string(), EventType::TaskCreated);

            fetch_task(tx, user_id, id)?.ok_or(Error::TaskNotFound { id })
        })
    }

    /// Get a task by id, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_task(&self, user_id: &str, id: i64) -> Result<Option<Task>> {
        fetch_task(&self.conn, user_id, id)
    }

    /// List all tasks for a user: order index ascending, newest first on ties.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1
             ORDER BY order_index ASC, created_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], map_task_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// List one kanban column.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks_by_status(&self, user_id: &str, status: TaskStatus) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1 AND status = ?2
             ORDER BY order_index ASC, created_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![user_id, status.as_str()], map_task_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// List tasks due on a calendar date (`YYYY-MM-DD`).
    ///
    /// All-day tasks come first, then timed tasks by clock time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks_due_on(&self, user_id: &str, date: &str) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1 AND due_date = ?2
             ORDER BY due_time IS NOT NULL, due_time ASC, order_index ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![user_id, date], map_task_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Apply a partial update to a task.
    ///
    /// Moving to `done` stamps `completed_at` only when the stored value is
    /// NULL and the patch does not carry one. An explicit `completed_at`
    /// (including `null`) always wins.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` if the task is absent or owned by another user.
    pub fn update_task(&mut self, user_id: &str, id: i64, patch: &TaskPatch) -> Result<Task> {
        let now = unix_now();

        // Build dynamic UPDATE query based on provided fields
        let mut set_clauses = vec!["updated_at = ?"];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(now)];

        if let Some(title) = &patch.title {
            set_clauses.push("title = ?");
            params.push(Box::new(title.clone()));
        }
        if let Some(description) = &patch.description {
            set_clauses.push("description = ?");
            params.push(Box::new(description.clone()));
        }
        if let Some(status) = patch.status {
            set_clauses.push("status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(priority) = patch.priority {
            set_clauses.push("priority = ?");
            params.push(Box::new(priority.as_str()));
        }
        if let Some(due_date) = &patch.due_date {
            set_clauses.push("due_date = ?");
            params.push(Box::new(due_date.clone()));
        }
        if let Some(due_time) = &patch.due_time {
            set_clauses.push("due_time = ?");
            params.push(Box::new(due_time.clone()));
        }
        if let Some(mood) = patch.anticipated_mood {
            set_clauses.push("anticipated_mood = ?");
            params.push(Box::new(mood.map(|m| m.as_str())));
        }
        if let Some(mood) = patch.completed_mood {
            set_clauses.push("completed_mood = ?");
            params.push(Box::new(mood.map(|m| m.as_str())));
        }
        if let Some(note) = &patch.reflection_note {
            set_clauses.push("reflection_note = ?");
            params.push(Box::new(note.clone()));
        }
        if let Some(uri) = &patch.reflection_photo_s3_uri {
            set_clauses.push("reflection_photo_s3_uri = ?");
            params.push(Box::new(uri.clone()));
        }
        if let Some(order_index) = patch.order_index {
            set_clauses.push("order_index = ?");
            params.push(Box::new(order_index));
        }
        match patch.completed_at {
            Some(completed_at) => {
                set_clauses.push("completed_at = ?");
                params.push(Box::new(completed_at));
            }
            None if patch.status == Some(TaskStatus::Done) => {
                set_clauses.push("completed_at = COALESCE(completed_at, ?)");
                params.push(Box::new(now));
            }
            None => {}
        }

        self.mutate("update_task", user_id, |tx, ctx| {
            let before = fetch_task(tx, user_id, id)?.ok_or(Error::TaskNotFound { id })?;

            let sql = format!(
                "UPDATE tasks SET {} WHERE id = ? AND user_id = ?",
                set_clauses.join(", ")
            );
            params.push(Box::new(id));
            params.push(Box::new(user_id.to_string()));

            let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            tx.execute(&sql, param_refs.as_slice())?;

            let after = fetch_task(tx, user_id, id)?.ok_or(Error::TaskNotFound { id })?;

            let entity_id = id.to_string();
            if before.status == after.status {
                ctx.record_event(EntityKind::Task, &entity_id, EventType::TaskUpdated);
            } else {
                let event_type = if after.status == TaskStatus::Done {
                    EventType::TaskCompleted
                } else {
                    EventType::TaskUpdated
                };
                ctx.record_change(
                    EntityKind::Task,
                    &entity_id,
                    event_type,
                    Some(before.status.as_str().to_string()),
                    Some(after.status.as_str().to_string()),
                );
            }

            Ok(after)
        })
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` if the task is absent or owned by another user.
    pub fn delete_task(&mut self, user_id: &str, id: i64) -> Result<()> {
        self.mutate("delete_task", user_id, |tx, ctx| {
            let rows = tx.execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;

            if rows == 0 {
                return Err(Error::TaskNotFound { id });
            }

            ctx.record_event(EntityKind::Task, &id.to_string(), EventType::TaskDeleted);
            Ok(())
        })
    }

    /// Write new order indexes for a batch of tasks in one transaction.
    ///
    /// Items naming unknown ids, or tasks owned by someone else, are skipped.
    /// Returns the number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns an error if any update fails; no index is changed in that case.
    pub fn reorder_tasks(&mut self, user_id: &str, items: &[ReorderItem]) -> Result<usize> {
        let now = unix_now();

        self.mutate("reorder_tasks", user_id, |tx, ctx| {
            let mut stmt = tx.prepare(
                "UPDATE tasks SET order_index = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            )?;

            let mut updated = 0;
            for item in items {
                updated += stmt.execute(rusqlite::params![item.order_index, now, item.id, user_id])?;
            }

            if updated > 0 {
                ctx.record_comment(
                    EntityKind::Board,
                    user_id,
                    EventType::TasksReordered,
                    &format!("{updated} of {} tasks reordered", items.len()),
                );
            }

            Ok(updated)
        })
    }

    // =====================
    // Preference Operations
    // =====================

    /// Get stored preferences. Never creates a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        fetch_preferences(&self.conn, user_id)
    }

    /// Insert or update preferences, keeping fields the patch leaves out.
    ///
    /// Returns the stored row and whether it was newly created.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn upsert_preferences(
        &mut self,
        user_id: &str,
        patch: &PreferencesPatch,
    ) -> Result<(UserPreferences, bool)> {
        let now = unix_now();

        self.mutate("upsert_preferences", user_id, |tx, ctx| {
            let existing = fetch_preferences(tx, user_id)?;
            let created = existing.is_none();
            let merged = existing
                .unwrap_or_else(|| UserPreferences::defaults_for(user_id))
                .apply(patch);

            tx.execute(
                "INSERT INTO user_preferences (user_id, emoji_set, color_palette, visualization_intensity, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                    emoji_set = excluded.emoji_set,
                    color_palette = excluded.color_palette,
                    visualization_intensity = excluded.visualization_intensity,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    user_id,
                    merged.emoji_set.as_str(),
                    merged.color_palette.as_str(),
                    merged.visualization_intensity.as_str(),
                    now,
                ],
            )?;

            ctx.record_event(EntityKind::Preferences, user_id, EventType::PreferencesSaved);

            let stored = fetch_preferences(tx, user_id)?
                .ok_or_else(|| Error::Other("preferences row missing after upsert".into()))?;
            Ok((stored, created))
        })
    }

    // ======
    // Events
    // ======

    /// Audit trail for one entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_events(
        &self,
        entity: EntityKind,
        entity_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Event>> {
        Ok(get_events(&self.conn, entity, entity_id, limit)?)
    }

    /// Everything `user_id` changed, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_activity(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<Event>> {
        Ok(get_activity(&self.conn, user_id, limit)?)
    }
}

fn fetch_task(conn: &Connection, user_id: &str, id: i64) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2");
    let task = conn
        .query_row(&sql, rusqlite::params![id, user_id], map_task_row)
        .optional()?;
    Ok(task)
}

fn fetch_preferences(conn: &Connection, user_id: &str) -> Result<Option<UserPreferences>> {
    let prefs = conn
        .query_row(
            "SELECT user_id, emoji_set, color_palette, visualization_intensity, created_at, updated_at
             FROM user_preferences WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(UserPreferences {
                    user_id: row.get(0)?,
                    emoji_set: EmojiSet::from_db(&row.get::<_, String>(1)?),
                    color_palette: ColorPalette::from_db(&row.get::<_, String>(2)?),
                    visualization_intensity: VisualizationIntensity::from_db(
                        &row.get::<_, String>(3)?,
                    ),
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(prefs)
}

/// Map a row selected with [`TASK_COLUMNS`] to a `Task`.
fn map_task_row(row: &Row) -> rusqlite::Result<Task> {
    let anticipated: Option<String> = row.get(8)?;
    let completed: Option<String> = row.get(9)?;

    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::from_db(&row.get::<_, String>(4)?),
        priority: Priority::from_db(&row.get::<_, String>(5)?),
        due_date: row.get(6)?,
        due_time: row.get(7)?,
        anticipated_mood: anticipated.as_deref().and_then(AnticipatedMood::parse),
        completed_mood: completed.as_deref().and_then(CompletedMood::parse),
        reflection_note: row.get(10)?,
        reflection_photo_s3_uri: row.get(11)?,
        order_index: row.get(12)?,
        completed_at: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
