//! Task model for YouSoul.
//!
//! A task is a kanban card that carries an anticipated mood before the work
//! and a completed mood plus reflection after it.

use serde::{Deserialize, Serialize};

/// Kanban column a task sits in.
///
/// Any status may move to any other; `Done` is not terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [Self; 4] = [Self::Backlog, Self::Todo, Self::InProgress, Self::Done];

    /// Get the string representation for storage and the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Column heading shown on the board.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Parse an exact stored spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Parse from storage, falling back to `Backlog` for unknown values.
    #[must_use]
    pub fn from_db(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Backlog
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    /// Parse from storage, falling back to `Medium`.
    #[must_use]
    pub fn from_db(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// How the user expects to feel about a task before doing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnticipatedMood {
    Energized,
    Calm,
    Tense,
    Drained,
    Curious,
}

impl AnticipatedMood {
    pub const ALL: [Self; 5] = [
        Self::Energized,
        Self::Calm,
        Self::Tense,
        Self::Drained,
        Self::Curious,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Energized => "energized",
            Self::Calm => "calm",
            Self::Tense => "tense",
            Self::Drained => "drained",
            Self::Curious => "curious",
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Energized => "\u{1F525}",
            Self::Calm => "\u{1F60C}",
            Self::Tense => "\u{1F630}",
            Self::Drained => "\u{1F634}",
            Self::Curious => "\u{1F914}",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Energized => "Energized",
            Self::Calm => "Calm",
            Self::Tense => "Tense",
            Self::Drained => "Drained",
            Self::Curious => "Curious",
        }
    }

    /// Accent color used for calendar events and card borders.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Energized => "#FFB347",
            Self::Calm => "#98D8AA",
            Self::Tense => "#FF6B6B",
            Self::Drained => "#9CA3AF",
            Self::Curious => "#A78BFA",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// How the user felt after completing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletedMood {
    Proud,
    Relieved,
    Satisfied,
    Meh,
    Exhausted,
}

impl CompletedMood {
    pub const ALL: [Self; 5] = [
        Self::Proud,
        Self::Relieved,
        Self::Satisfied,
        Self::Meh,
        Self::Exhausted,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proud => "proud",
            Self::Relieved => "relieved",
            Self::Satisfied => "satisfied",
            Self::Meh => "meh",
            Self::Exhausted => "exhausted",
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Proud => "\u{1F389}",
            Self::Relieved => "\u{1F62E}\u{200D}\u{1F4A8}",
            Self::Satisfied => "\u{1F60A}",
            Self::Meh => "\u{1F610}",
            Self::Exhausted => "\u{1F62B}",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Proud => "Proud",
            Self::Relieved => "Relieved",
            Self::Satisfied => "Satisfied",
            Self::Meh => "Meh",
            Self::Exhausted => "Exhausted",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// A task record as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Storage-assigned identifier
    pub id: i64,

    /// Owner of the task
    pub user_id: String,

    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,

    /// Calendar date, `YYYY-MM-DD`
    pub due_date: Option<String>,

    /// Clock time, `HH:mm`
    pub due_time: Option<String>,

    pub anticipated_mood: Option<AnticipatedMood>,
    pub completed_mood: Option<CompletedMood>,
    pub reflection_note: Option<String>,

    /// `s3://bucket/path` reference to the reflection photo
    pub reflection_photo_s3_uri: Option<String>,

    /// Manual ordering within the task's status column
    #[serde(default)]
    pub order_index: i64,

    /// Completion timestamp (Unix seconds)
    pub completed_at: Option<i64>,

    /// Creation timestamp (Unix seconds)
    pub created_at: i64,

    /// Last update timestamp (Unix seconds)
    pub updated_at: i64,
}

impl Task {
    /// Whether the task still needs doing.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status != TaskStatus::Done
    }
}

/// Payload for creating a task.
///
/// Unset fields take the storage defaults: status `backlog`, priority
/// `medium`, order index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anticipated_mood: Option<AnticipatedMood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the due date, and optionally a time on that date.
    #[must_use]
    pub fn with_due(mut self, date: &str, time: Option<&str>) -> Self {
        self.due_date = Some(date.to_string());
        self.due_time = time.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_mood(mut self, mood: AnticipatedMood) -> Self {
        self.anticipated_mood = Some(mood);
        self
    }

    #[must_use]
    pub fn with_order_index(mut self, order_index: i64) -> Self {
        self.order_index = Some(order_index);
        self
    }
}

/// Partial update for a task.
///
/// Outer `None` leaves a field untouched. For nullable columns,
/// `Some(None)` clears the value and serializes as JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anticipated_mood: Option<Option<AnticipatedMood>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_mood: Option<Option<CompletedMood>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_note: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_photo_s3_uri: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<i64>>,
}

impl TaskPatch {
    /// Patch that only moves the task to another column.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch recording how the task felt once done.
    #[must_use]
    pub fn reflection(mood: CompletedMood, note: Option<&str>) -> Self {
        Self {
            completed_mood: Some(Some(mood)),
            reflection_note: Some(note.map(str::to_string)),
            ..Self::default()
        }
    }
}

/// One entry of a bulk reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItem {
    pub id: i64,
    pub order_index: i64,
}

impl ReorderItem {
    #[must_use]
    pub const fn new(id: i64, order_index: i64) -> Self {
        Self { id, order_index }
    }
}
