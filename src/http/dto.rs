//! Request bodies.
//!
//! Bodies arrive with loose string fields so that bad values produce the
//! validation errors (with suggestions) rather than a generic JSON error.
//! Each body converts into the typed model via [`crate::validate`].

use crate::error::{Error, Result};
use crate::model::{NewTask, ReorderItem, TaskPatch};
use crate::reflections::S3Uri;
use crate::validate::{
    normalize_anticipated_mood, normalize_completed_mood, normalize_priority, normalize_status,
    validate_due_date, validate_due_time, validate_title,
};
use serde::{Deserialize, Deserializer};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Empty strings clear a nullable text field.
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Apply `f` to a tri-state field, keeping "absent" and "clear" as they are.
fn map_nullable<T>(
    field: Option<Option<String>>,
    f: impl FnOnce(&str) -> Result<T>,
) -> Result<Option<Option<T>>> {
    match field {
        None => Ok(None),
        Some(value) => match blank_to_none(value) {
            None => Ok(Some(None)),
            Some(v) => f(&v).map(|t| Some(Some(t))),
        },
    }
}

/// `POST /api/tasks`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub due_time: Option<String>,
    pub anticipated_mood: Option<String>,
    pub order_index: Option<i64>,
}

impl CreateTaskBody {
    /// # Errors
    ///
    /// Returns a validation error for a missing title or any bad value.
    pub fn into_new_task(self) -> Result<NewTask> {
        let title = self
            .title
            .ok_or(Error::RequiredField { field: "title" })?;

        let due_date = blank_to_none(self.due_date)
            .map(|d| validate_due_date(&d))
            .transpose()?;
        let due_time = blank_to_none(self.due_time)
            .map(|t| validate_due_time(&t))
            .transpose()?;
        if due_time.is_some() && due_date.is_none() {
            return Err(Error::InvalidArgument("dueTime requires a dueDate".into()));
        }

        Ok(NewTask {
            title: validate_title(&title)?,
            description: blank_to_none(self.description),
            status: blank_to_none(self.status)
                .map(|s| normalize_status(&s))
                .transpose()?,
            priority: blank_to_none(self.priority)
                .map(|p| normalize_priority(&p))
                .transpose()?,
            due_date,
            due_time,
            anticipated_mood: blank_to_none(self.anticipated_mood)
                .map(|m| normalize_anticipated_mood(&m))
                .transpose()?,
            order_index: self.order_index,
        })
    }
}

/// `PATCH /api/tasks/:id`
///
/// Nullable fields are tri-state: absent keeps the value, `null` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskBody {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub anticipated_mood: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub completed_mood: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reflection_note: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reflection_photo_s3_uri: Option<Option<String>>,
    pub order_index: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub completed_at: Option<Option<i64>>,
}

impl UpdateTaskBody {
    /// # Errors
    ///
    /// Returns a validation error for any bad value.
    pub fn into_patch(self) -> Result<TaskPatch> {
        Ok(TaskPatch {
            title: self.title.map(|t| validate_title(&t)).transpose()?,
            description: self.description.map(blank_to_none),
            status: self.status.map(|s| normalize_status(&s)).transpose()?,
            priority: self.priority.map(|p| normalize_priority(&p)).transpose()?,
            due_date: map_nullable(self.due_date, validate_due_date)?,
            due_time: map_nullable(self.due_time, validate_due_time)?,
            anticipated_mood: map_nullable(self.anticipated_mood, normalize_anticipated_mood)?,
            completed_mood: map_nullable(self.completed_mood, normalize_completed_mood)?,
            reflection_note: self.reflection_note.map(blank_to_none),
            reflection_photo_s3_uri: map_nullable(self.reflection_photo_s3_uri, |uri| {
                S3Uri::parse(uri).map(|u| u.to_string())
            })?,
            order_index: self.order_index,
            completed_at: self.completed_at,
        })
    }
}

/// `POST /api/tasks/reorder`
///
/// `items` stays untyped so a non-array gets a specific message.
#[derive(Debug, Default, Deserialize)]
pub struct ReorderBody {
    #[serde(default)]
    pub items: serde_json::Value,
}

impl ReorderBody {
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `items` is not an array of
    /// `{id, orderIndex}` objects.
    pub fn into_items(self) -> Result<Vec<ReorderItem>> {
        if !self.items.is_array() {
            return Err(Error::InvalidArgument("Items must be an array".into()));
        }
        serde_json::from_value(self.items)
            .map_err(|e| Error::InvalidArgument(format!("Invalid reorder item: {e}")))
    }
}

/// `POST /api/reflections/upload-url`
#[derive(Debug, Default, Deserialize)]
pub struct UploadUrlBody {
    pub filename: Option<String>,
}

/// `GET /api/reflections/download-url`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlQuery {
    pub s3_uri: Option<String>,
}

/// `GET /api/activity`
#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<u32>,
}

impl ActivityQuery {
    pub const MAX_LIMIT: u32 = 500;
    const DEFAULT_LIMIT: u32 = 50;

    /// # Errors
    ///
    /// Returns `InvalidArgument` for 0 or anything above [`Self::MAX_LIMIT`].
    pub fn limit(&self) -> Result<u32> {
        match self.limit {
            None => Ok(Self::DEFAULT_LIMIT),
            Some(n) if (1..=Self::MAX_LIMIT).contains(&n) => Ok(n),
            Some(n) => Err(Error::InvalidArgument(format!(
                "limit must be between 1 and {}, got {n}",
                Self::MAX_LIMIT
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnticipatedMood, Priority, TaskStatus};

    fn patch(json: &str) -> Result<TaskPatch> {
        serde_json::from_str::<UpdateTaskBody>(json).unwrap().into_patch()
    }

    #[test]
    fn test_create_requires_title() {
        let body: CreateTaskBody = serde_json::from_str(r#"{"priority":"high"}"#).unwrap();
        assert!(matches!(
            body.into_new_task(),
            Err(Error::RequiredField { field: "title" })
        ));
    }

    #[test]
    fn test_create_normalizes_values() {
        let body: CreateTaskBody = serde_json::from_str(
            r#"{"title":" Run ","status":"wip","priority":"urgent","dueDate":"2026-10-19",
                "dueTime":"07:00","anticipatedMood":"Energized","description":""}"#,
        )
        .unwrap();
        let new = body.into_new_task().unwrap();
        assert_eq!(new.title, "Run");
        assert_eq!(new.status, Some(TaskStatus::InProgress));
        assert_eq!(new.priority, Some(Priority::High));
        assert_eq!(new.anticipated_mood, Some(AnticipatedMood::Energized));
        assert!(new.description.is_none());
    }

    #[test]
    fn test_create_blank_status_and_priority_use_defaults() {
        let body: CreateTaskBody =
            serde_json::from_str(r#"{"title":"x","status":"","priority":"  "}"#).unwrap();
        let new = body.into_new_task().unwrap();
        assert_eq!(new.status, None);
        assert_eq!(new.priority, None);
    }

    #[test]
    fn test_create_rejects_time_without_date() {
        let body: CreateTaskBody =
            serde_json::from_str(r#"{"title":"x","dueTime":"07:00"}"#).unwrap();
        assert!(body.into_new_task().is_err());
    }

    #[test]
    fn test_patch_absent_vs_null() {
        let p = patch(r#"{"dueTime":null,"status":"done"}"#).unwrap();
        assert_eq!(p.due_time, Some(None));
        assert_eq!(p.due_date, None);
        assert_eq!(p.status, Some(TaskStatus::Done));
        assert_eq!(p.completed_at, None);

        let p = patch(r#"{"completedAt":null}"#).unwrap();
        assert_eq!(p.completed_at, Some(None));
    }

    #[test]
    fn test_patch_validates() {
        assert!(matches!(
            patch(r#"{"status":"archived"}"#),
            Err(Error::InvalidStatus { .. })
        ));
        assert!(patch(r#"{"dueDate":"tomorrow"}"#).is_err());
        assert!(patch(r#"{"completedMood":"ecstatic"}"#).is_err());
        assert!(patch(r#"{"reflectionPhotoS3Uri":"http://x/y"}"#).is_err());
        assert!(patch(r#"{"title":""}"#).is_err());
    }

    #[test]
    fn test_reorder_items_must_be_array() {
        let body: ReorderBody = serde_json::from_str(r#"{"items":{"id":1}}"#).unwrap();
        assert!(body.into_items().is_err());

        let body: ReorderBody = serde_json::from_str("{}").unwrap();
        assert!(body.into_items().is_err());

        let body: ReorderBody =
            serde_json::from_str(r#"{"items":[{"id":1,"orderIndex":5}]}"#).unwrap();
        assert_eq!(body.into_items().unwrap(), vec![ReorderItem::new(1, 5)]);
    }

    #[test]
    fn test_activity_limit() {
        assert_eq!(ActivityQuery::default().limit().unwrap(), 50);
        assert_eq!(ActivityQuery { limit: Some(5) }.limit().unwrap(), 5);
        assert!(ActivityQuery { limit: Some(0) }.limit().is_err());
        assert!(ActivityQuery { limit: Some(501) }.limit().is_err());
    }
}
