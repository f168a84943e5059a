//! Route handlers.

use super::AppState;
use super::dto::{
    ActivityQuery, CreateTaskBody, DownloadUrlQuery, ReorderBody, UpdateTaskBody, UploadUrlBody,
};
use super::response::{ApiJson, Envelope, Success, data, parse_task_id};
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::model::{PreferencesPatch, Task, User, UserPreferences};
use crate::storage::Event;
use crate::reflections::{PRESIGN_TTL_SECS, S3Uri, reflection_path};
use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

type ApiResult<T> = Result<Json<Envelope<T>>>;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "app": super::APP_NAME }))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> Error {
    Error::RouteNotFound {
        path: uri.path().to_string(),
    }
}

pub async fn me(AuthUser(user): AuthUser) -> Json<Envelope<User>> {
    data(user)
}

// ── Tasks ────────────────────────────────────────────────────

pub async fn list_tasks(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Task>> {
    let user_id = user.0.id;
    let tasks = state.with_storage(move |s| s.list_tasks(&user_id)).await?;
    Ok(data(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Task> {
    let id = parse_task_id(&raw_id)?;
    let user_id = user.0.id;
    let task = state
        .with_storage(move |s| s.get_task(&user_id, id))
        .await?
        .ok_or(Error::TaskNotFound { id })?;
    Ok(data(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<CreateTaskBody>,
) -> Result<(StatusCode, Json<Envelope<Task>>)> {
    let new = body.into_new_task()?;
    let user_id = user.0.id;
    let task = state
        .with_storage(move |s| s.create_task(&user_id, &new))
        .await?;

    info!(user_id = %task.user_id, task_id = task.id, status = %task.status, "Task created");
    Ok((StatusCode::CREATED, data(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    ApiJson(body): ApiJson<UpdateTaskBody>,
) -> ApiResult<Task> {
    let id = parse_task_id(&raw_id)?;
    let patch = body.into_patch()?;
    let user_id = user.0.id;
    let task = state
        .with_storage(move |s| s.update_task(&user_id, id, &patch))
        .await?;

    info!(user_id = %task.user_id, task_id = id, status = %task.status, "Task updated");
    Ok(data(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Success> {
    let id = parse_task_id(&raw_id)?;
    let user_id = user.0.id;
    state
        .with_storage(move |s| s.delete_task(&user_id, id))
        .await?;

    info!(task_id = id, "Task deleted");
    Ok(data(Success::OK))
}

#[derive(Debug, Serialize)]
pub struct ReorderResult {
    pub success: bool,
    pub updated: usize,
}

pub async fn reorder_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<ReorderBody>,
) -> ApiResult<ReorderResult> {
    let items = body.into_items()?;
    let requested = items.len();
    let user_id = user.0.id;
    let updated = state
        .with_storage(move |s| s.reorder_tasks(&user_id, &items))
        .await?;

    info!(requested, updated, "Tasks reordered");
    Ok(data(ReorderResult {
        success: true,
        updated,
    }))
}

// ── Preferences ──────────────────────────────────────────────

pub async fn get_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<UserPreferences> {
    let user_id = user.0.id;
    let lookup_id = user_id.clone();
    let stored = state
        .with_storage(move |s| s.get_preferences(&lookup_id))
        .await?;
    Ok(data(
        stored.unwrap_or_else(|| UserPreferences::defaults_for(&user_id)),
    ))
}

pub async fn put_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(patch): ApiJson<PreferencesPatch>,
) -> Result<(StatusCode, Json<Envelope<UserPreferences>>)> {
    let user_id = user.0.id;
    let (prefs, created) = state
        .with_storage(move |s| s.upsert_preferences(&user_id, &patch))
        .await?;

    info!(user_id = %prefs.user_id, created, "Preferences saved");
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, data(prefs)))
}

// ── Activity ─────────────────────────────────────────────────

pub async fn activity(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Vec<Event>> {
    let limit = query.limit()?;
    let user_id = user.0.id;
    let events = state
        .with_storage(move |s| s.get_activity(&user_id, Some(limit)))
        .await?;
    Ok(data(events))
}

// ── Reflections ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrl {
    pub upload_url: String,
    pub path: String,
    pub s3_uri: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrl {
    pub download_url: String,
    pub expires_at: i64,
}

pub async fn reflection_upload_url(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<UploadUrlBody>,
) -> ApiResult<UploadUrl> {
    let bucket = &state.config.bucket;
    let path = reflection_path(user.id(), body.filename.as_deref())?;
    let signed = state
        .presigner
        .presign_put(bucket, &path, PRESIGN_TTL_SECS)?;

    info!(path = %path, "Upload URL issued");
    Ok(data(UploadUrl {
        upload_url: signed.url,
        s3_uri: S3Uri::new(bucket.as_str(), path.as_str()).to_string(),
        path,
        expires_at: signed.expires_at,
    }))
}

pub async fn reflection_download_url(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DownloadUrlQuery>,
) -> ApiResult<DownloadUrl> {
    let raw = query
        .s3_uri
        .filter(|v| !v.trim().is_empty())
        .ok_or(Error::RequiredField { field: "s3Uri" })?;
    let uri = S3Uri::parse(&raw)?;

    // Photos are stored under the owner's id
    if !uri.path.starts_with(&format!("{}/", user.id())) {
        return Err(Error::InvalidArgument(
            "s3Uri does not reference one of your photos".into(),
        ));
    }

    let signed = state
        .presigner
        .presign_get(&uri.bucket, &uri.path, PRESIGN_TTL_SECS)?;
    Ok(data(DownloadUrl {
        download_url: signed.url,
        expires_at: signed.expires_at,
    }))
}
