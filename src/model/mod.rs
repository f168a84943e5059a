//! Data models for YouSoul.
//!
//! This module contains all domain models:
//! - Task (kanban card with mood tracking and reflection)
//! - UserPreferences (display preferences, one row per user)
//! - User (authenticated profile)

pub mod preferences;
pub mod task;
pub mod user;

pub use preferences::{
    ColorPalette, EmojiSet, PreferencesPatch, UserPreferences, VisualizationIntensity,
};
pub use task::{
    AnticipatedMood, CompletedMood, NewTask, Priority, ReorderItem, Task, TaskPatch, TaskStatus,
};
pub use user::User;

/// Current time as Unix seconds, the timestamp unit used on the wire and in storage.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
