//! SQLite persistence.
//!
//! One database holds every user's tasks and preferences; all queries take
//! the owning user id. Writes go through [`SqliteStorage::mutate`], which
//! wraps the change and its audit events in one IMMEDIATE transaction.
//!
//! - [`schema`] - DDL, pragmas and the schema version
//! - [`migrations`] - Column additions for databases created earlier
//! - [`events`] - Audit trail
//! - [`sqlite`] - Task and preference operations

pub mod events;
pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use events::{EntityKind, Event, EventType};
pub use sqlite::{MutationContext, SqliteStorage};
