//! API client and client-side stores.
//!
//! [`ApiClient`] talks to the HTTP API. [`TasksStore`] and
//! [`PreferencesStore`] keep the local copy a UI renders from, applying
//! reorders and preference changes optimistically.

use crate::board::{KanbanBoard, MovePlan};
use crate::calendar::{CalendarEvent, DaySummary, calendar_events, split_event_start};
use crate::error::{Error, Result};
use crate::model::{
    CompletedMood, NewTask, PreferencesPatch, ReorderItem, Task, TaskPatch, TaskStatus, User,
    UserPreferences,
};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, warn};

/// Message recorded when the task list cannot be loaded.
pub const FETCH_FAILED: &str = "Failed to fetch tasks";

/// Operations the stores need from the backend.
pub trait TasksApi: Send + Sync {
    fn me(&self) -> impl Future<Output = Result<User>> + Send;

    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>>> + Send;

    fn create_task(&self, new: &NewTask) -> impl Future<Output = Result<Task>> + Send;

    fn update_task(&self, id: i64, patch: &TaskPatch) -> impl Future<Output = Result<Task>> + Send;

    fn delete_task(&self, id: i64) -> impl Future<Output = Result<()>> + Send;

    /// Returns the number of rows the server updated.
    fn reorder_tasks(&self, items: &[ReorderItem]) -> impl Future<Output = Result<usize>> + Send;

    fn get_preferences(&self) -> impl Future<Output = Result<UserPreferences>> + Send;

    fn put_preferences(
        &self,
        patch: &PreferencesPatch,
    ) -> impl Future<Output = Result<UserPreferences>> + Send;
}

/// How the client identifies itself.
#[derive(Debug, Clone)]
enum ClientAuth {
    None,
    /// Identity headers, as an authenticating proxy would set them
    Headers(User),
    Bearer(String),
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ReorderResponse {
    updated: usize,
}

/// HTTP implementation of [`TasksApi`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    auth: ClientAuth,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `Config` when `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid API URL '{base_url}': {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            auth: ClientAuth::None,
        })
    }

    /// Send identity headers for `user` on every request.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.auth = ClientAuth::Headers(user);
        self
    }

    /// Send `Authorization: Bearer <token>` on every request.
    #[must_use]
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.auth = ClientAuth::Bearer(token.to_string());
        self
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid API path '{path}': {e}")))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            ClientAuth::None => req,
            ClientAuth::Bearer(token) => req.bearer_auth(token),
            ClientAuth::Headers(user) => {
                let mut req = req.header(crate::auth::USER_ID_HEADER, &user.id);
                if let Some(name) = &user.name {
                    req = req.header(crate::auth::USER_NAME_HEADER, name);
                }
                if let Some(email) = &user.email {
                    req = req.header(crate::auth::USER_EMAIL_HEADER, email);
                }
                if let Some(image) = &user.image {
                    req = req.header(crate::auth::USER_IMAGE_HEADER, image);
                }
                req
            }
        }
    }

    /// Send a request and unwrap the `{data}` envelope.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = self.authorize(req).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            debug!(status = status.as_u16(), %message, "API error");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: DataEnvelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

impl TasksApi for ApiClient {
    async fn me(&self) -> Result<User> {
        self.send(self.client.get(self.url("api/me")?)).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.send(self.client.get(self.url("api/tasks")?)).await
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task> {
        self.send(self.client.post(self.url("api/tasks")?).json(new))
            .await
    }

    async fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        self.send(
            self.client
                .patch(self.url(&format!("api/tasks/{id}"))?)
                .json(patch),
        )
        .await
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        let _: serde_json::Value = self
            .send(self.client.delete(self.url(&format!("api/tasks/{id}"))?))
            .await?;
        Ok(())
    }

    async fn reorder_tasks(&self, items: &[ReorderItem]) -> Result<usize> {
        let body = serde_json::json!({ "items": items });
        let response: ReorderResponse = self
            .send(self.client.post(self.url("api/tasks/reorder")?).json(&body))
            .await?;
        Ok(response.updated)
    }

    async fn get_preferences(&self) -> Result<UserPreferences> {
        self.send(self.client.get(self.url("api/preferences")?))
            .await
    }

    async fn put_preferences(&self, patch: &PreferencesPatch) -> Result<UserPreferences> {
        self.send(self.client.put(self.url("api/preferences")?).json(patch))
            .await
    }
}

/// Local task list backed by a [`TasksApi`].
#[derive(Debug)]
pub struct TasksStore<A> {
    api: A,
    tasks: Vec<Task>,
    loading: bool,
    error: Option<String>,
}

impl<A: TasksApi> TasksStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last fetch failure, cleared by the next fetch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Replace the local list with the server's.
    ///
    /// # Errors
    ///
    /// Returns the API error; the local list is left as it was.
    pub async fn fetch(&mut self) -> Result<()> {
        self.loading = true;
        self.error = None;

        let result = self.api.list_tasks().await;
        self.loading = false;

        match result {
            Ok(tasks) => {
                self.tasks = tasks;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Task fetch failed");
                self.error = Some(FETCH_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Create a task and append it locally.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn create(&mut self, new: &NewTask) -> Result<Task> {
        let task = self.api.create_task(new).await?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Update a task and replace the local copy in place.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn update(&mut self, id: i64, patch: &TaskPatch) -> Result<Task> {
        let task = self.api.update_task(id, patch).await?;
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == id) {
            *slot = task.clone();
        }
        Ok(task)
    }

    /// Delete a task and drop it locally.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.api.delete_task(id).await?;
        self.tasks.retain(|t| t.id != id);
        Ok(())
    }

    /// Apply new order indexes locally, then persist them.
    ///
    /// On any failure the list is restored to the snapshot taken before the
    /// local change.
    ///
    /// # Errors
    ///
    /// Returns the API error after restoring the snapshot.
    pub async fn reorder(&mut self, items: &[ReorderItem]) -> Result<()> {
        let snapshot = self.tasks.clone();

        for task in &mut self.tasks {
            if let Some(item) = items.iter().find(|i| i.id == task.id) {
                task.order_index = item.order_index;
            }
        }

        match self.api.reorder_tasks(items).await {
            Ok(updated) => {
                debug!(requested = items.len(), updated, "Reorder persisted");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Reorder failed, restoring previous order");
                self.tasks = snapshot;
                Err(e)
            }
        }
    }

    /// Board view of the local list.
    #[must_use]
    pub fn board(&self) -> KanbanBoard {
        KanbanBoard::from_tasks(&self.tasks)
    }

    /// Drag a card to `position` in the `to` column.
    ///
    /// Changes the status first when the column differs, then persists the
    /// renumbered columns. The returned plan says whether to prompt for a
    /// completion reflection.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` for a task not in the list, or the API error.
    pub async fn move_task(
        &mut self,
        task_id: i64,
        to: TaskStatus,
        position: usize,
    ) -> Result<MovePlan> {
        let plan = self.board().plan_move(task_id, to, position)?;
        if let Some(status) = plan.status_change {
            self.update(task_id, &TaskPatch::status(status)).await?;
        }
        self.reorder(&plan.reorder).await?;
        Ok(plan)
    }

    /// Record how a finished task felt.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn record_reflection(
        &mut self,
        task_id: i64,
        mood: CompletedMood,
        note: Option<&str>,
    ) -> Result<Task> {
        self.update(task_id, &TaskPatch::reflection(mood, note))
            .await
    }

    /// Move a task to the slot a calendar event was dropped on.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unparsable start, or the API error.
    pub async fn reschedule(&mut self, task_id: i64, event_start: &str) -> Result<Task> {
        let (date, time) = split_event_start(event_start)?;
        let patch = TaskPatch {
            due_date: Some(Some(date)),
            due_time: Some(time),
            ..TaskPatch::default()
        };
        self.update(task_id, &patch).await
    }

    #[must_use]
    pub fn calendar_events(&self) -> Vec<CalendarEvent> {
        calendar_events(&self.tasks)
    }

    #[must_use]
    pub fn day_summary(&self, date: &str) -> DaySummary {
        DaySummary::for_date(&self.tasks, date)
    }
}

/// Local preferences backed by a [`TasksApi`].
#[derive(Debug)]
pub struct PreferencesStore<A> {
    api: A,
    preferences: UserPreferences,
    loaded: bool,
}

impl<A: TasksApi> PreferencesStore<A> {
    /// Start from the defaults until [`load`](Self::load) succeeds.
    pub fn new(api: A, user_id: &str) -> Self {
        Self {
            api,
            preferences: UserPreferences::defaults_for(user_id),
            loaded: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Whether the current value came from the server.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load from the server, keeping the defaults on failure.
    pub async fn load(&mut self) {
        match self.api.get_preferences().await {
            Ok(prefs) => {
                self.preferences = prefs;
                self.loaded = true;
            }
            Err(e) => debug!(error = %e, "Using default preferences"),
        }
    }

    /// Apply a change locally, then persist it.
    ///
    /// A failed write is logged and the local value is kept.
    pub async fn update(&mut self, patch: &PreferencesPatch) {
        self.preferences = self.preferences.apply(patch);

        match self.api.put_preferences(patch).await {
            Ok(stored) => self.preferences = stored,
            Err(e) => warn!(error = %e, "Preferences not saved"),
        }
    }
}
