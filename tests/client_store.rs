//! Client store tests: optimistic updates and rollback against a fake API,
//! plus the real `ApiClient` against a served router.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use yousoul::auth::HeaderIdentity;
use yousoul::client::{ApiClient, FETCH_FAILED, PreferencesStore, TasksApi, TasksStore};
use yousoul::error::{Error, Result};
use yousoul::http::{AppState, build_router};
use yousoul::model::{
    AnticipatedMood, ColorPalette, CompletedMood, EmojiSet, NewTask, PreferencesPatch, Priority,
    ReorderItem, Task, TaskPatch, TaskStatus, User, UserPreferences,
};
use yousoul::reflections::SignedUrlPresigner;
use yousoul::storage::SqliteStorage;

/// In-memory stand-in for the API with switchable failures.
#[derive(Default)]
struct FakeApi {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicI64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reorder_calls: Mutex<Vec<Vec<ReorderItem>>>,
}

impl FakeApi {
    fn failing_writes() -> Self {
        let api = Self::default();
        api.fail_writes.store(true, Ordering::SeqCst);
        api
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 500,
                message: "Internal server error".into(),
            });
        }
        Ok(())
    }
}

fn task(id: i64, status: TaskStatus, order_index: i64) -> Task {
    Task {
        id,
        user_id: "u1".into(),
        title: format!("task {id}"),
        description: None,
        status,
        priority: Priority::Medium,
        due_date: None,
        due_time: None,
        anticipated_mood: None,
        completed_mood: None,
        reflection_note: None,
        reflection_photo_s3_uri: None,
        order_index,
        completed_at: None,
        created_at: 0,
        updated_at: 0,
    }
}

impl TasksApi for FakeApi {
    async fn me(&self) -> Result<User> {
        Ok(User::new("u1"))
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 503,
                message: "down".into(),
            });
        }
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task> {
        self.check_write()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = task(id, new.status.unwrap_or_default(), 0);
        created.title.clone_from(&new.title);
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        self.check_write()?;
        let mut tasks = self.tasks.lock().unwrap();
        let found = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::TaskNotFound { id })?;
        if let Some(status) = patch.status {
            found.status = status;
        }
        if let Some(mood) = patch.completed_mood {
            found.completed_mood = mood;
        }
        if let Some(note) = &patch.reflection_note {
            found.reflection_note.clone_from(note);
        }
        if let Some(date) = &patch.due_date {
            found.due_date.clone_from(date);
        }
        if let Some(time) = &patch.due_time {
            found.due_time.clone_from(time);
        }
        Ok(found.clone())
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        self.check_write()?;
        self.tasks.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn reorder_tasks(&self, items: &[ReorderItem]) -> Result<usize> {
        self.reorder_calls.lock().unwrap().push(items.to_vec());
        self.check_write()?;
        Ok(items.len())
    }

    async fn get_preferences(&self) -> Result<UserPreferences> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 503,
                message: "down".into(),
            });
        }
        Ok(UserPreferences {
            emoji_set: EmojiSet::Minimal,
            ..UserPreferences::defaults_for("u1")
        })
    }

    async fn put_preferences(&self, patch: &PreferencesPatch) -> Result<UserPreferences> {
        self.check_write()?;
        Ok(UserPreferences::defaults_for("u1").apply(patch))
    }
}

#[tokio::test]
async fn reorder_failure_restores_snapshot() {
    let mut store = TasksStore::new(FakeApi::failing_writes());
    store.set_tasks(vec![
        task(1, TaskStatus::Todo, 0),
        task(2, TaskStatus::Todo, 1),
        task(3, TaskStatus::Done, 0),
    ]);
    let before = store.tasks().to_vec();

    let result = store
        .reorder(&[ReorderItem::new(1, 1), ReorderItem::new(2, 0)])
        .await;

    assert!(matches!(result, Err(Error::Api { status: 500, .. })));
    assert_eq!(store.tasks(), before.as_slice());
    assert_eq!(store.api().reorder_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn reorder_success_keeps_new_order() {
    let mut store = TasksStore::new(FakeApi::default());
    store.set_tasks(vec![task(1, TaskStatus::Todo, 0), task(2, TaskStatus::Todo, 1)]);

    store
        .reorder(&[ReorderItem::new(1, 1), ReorderItem::new(2, 0)])
        .await
        .unwrap();

    let ids: Vec<i64> = store
        .board()
        .column(TaskStatus::Todo)
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn fetch_failure_records_error() {
    let api = FakeApi::default();
    api.fail_reads.store(true, Ordering::SeqCst);
    let mut store = TasksStore::new(api);
    store.set_tasks(vec![task(7, TaskStatus::Backlog, 0)]);

    assert!(store.fetch().await.is_err());
    assert_eq!(store.error(), Some(FETCH_FAILED));
    assert!(!store.is_loading());
    assert_eq!(store.tasks().len(), 1);

    store.api().fail_reads.store(false, Ordering::SeqCst);
    store.fetch().await.unwrap();
    assert_eq!(store.error(), None);
    assert!(store.tasks().is_empty());
}

#[tokio::test]
async fn create_update_delete_track_local_list() {
    let mut store = TasksStore::new(FakeApi::default());

    let a = store.create(&NewTask::new("A")).await.unwrap();
    let b = store.create(&NewTask::new("B")).await.unwrap();
    assert_eq!(store.tasks().len(), 2);
    assert_eq!(store.tasks()[1].id, b.id);

    store
        .update(a.id, &TaskPatch::status(TaskStatus::InProgress))
        .await
        .unwrap();
    assert_eq!(store.tasks()[0].status, TaskStatus::InProgress);

    store.delete(a.id).await.unwrap();
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].id, b.id);
}

#[tokio::test]
async fn failed_create_leaves_list_alone() {
    let mut store = TasksStore::new(FakeApi::failing_writes());
    assert!(store.create(&NewTask::new("Nope")).await.is_err());
    assert!(store.tasks().is_empty());
}

#[tokio::test]
async fn move_to_done_changes_status_then_reorders() {
    let api = FakeApi::default();
    api.tasks.lock().unwrap().extend([
        task(1, TaskStatus::InProgress, 0),
        task(2, TaskStatus::Done, 0),
    ]);
    let mut store = TasksStore::new(api);
    store.fetch().await.unwrap();

    let plan = store.move_task(1, TaskStatus::Done, 1).await.unwrap();
    assert!(plan.celebrates());

    let done: Vec<i64> = store
        .board()
        .column(TaskStatus::Done)
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(done, vec![2, 1]);

    let reflected = store
        .record_reflection(1, CompletedMood::Relieved, Some("Phew"))
        .await
        .unwrap();
    assert_eq!(reflected.completed_mood, Some(CompletedMood::Relieved));
    assert_eq!(reflected.reflection_note.as_deref(), Some("Phew"));
}

#[tokio::test]
async fn reschedule_from_calendar_drop() {
    let api = FakeApi::default();
    api.tasks.lock().unwrap().push(task(1, TaskStatus::Todo, 0));
    let mut store = TasksStore::new(api);
    store.fetch().await.unwrap();

    let timed = store.reschedule(1, "2026-10-20T09:30:00").await.unwrap();
    assert_eq!(timed.due_date.as_deref(), Some("2026-10-20"));
    assert_eq!(timed.due_time.as_deref(), Some("09:30"));

    let all_day = store.reschedule(1, "2026-10-21").await.unwrap();
    assert_eq!(all_day.due_date.as_deref(), Some("2026-10-21"));
    assert_eq!(all_day.due_time, None);

    assert!(store.reschedule(1, "tomorrow").await.is_err());
}

#[tokio::test]
async fn day_summary_counts_moods() {
    let mut store = TasksStore::new(FakeApi::default());
    let mut a = task(1, TaskStatus::Todo, 0);
    a.due_date = Some("2026-10-19".into());
    a.anticipated_mood = Some(AnticipatedMood::Tense);
    let mut b = task(2, TaskStatus::Todo, 1);
    b.due_date = Some("2026-10-19".into());
    b.anticipated_mood = Some(AnticipatedMood::Tense);
    store.set_tasks(vec![a, b, task(3, TaskStatus::Todo, 2)]);

    let summary = store.day_summary("2026-10-19");
    assert_eq!(summary.tasks.len(), 2);
    assert_eq!(summary.distribution.tense, 2);
    assert_eq!(store.calendar_events().len(), 2);
}

#[tokio::test]
async fn preferences_fall_back_to_defaults() {
    let api = FakeApi::default();
    api.fail_reads.store(true, Ordering::SeqCst);
    let mut store = PreferencesStore::new(api, "u1");

    store.load().await;
    assert!(!store.is_loaded());
    assert_eq!(store.preferences(), &UserPreferences::defaults_for("u1"));

    store.api().fail_reads.store(false, Ordering::SeqCst);
    store.load().await;
    assert!(store.is_loaded());
    assert_eq!(store.preferences().emoji_set, EmojiSet::Minimal);
}

#[tokio::test]
async fn preferences_keep_local_value_when_save_fails() {
    let mut store = PreferencesStore::new(FakeApi::failing_writes(), "u1");

    store
        .update(&PreferencesPatch {
            color_palette: Some(ColorPalette::Mono),
            ..PreferencesPatch::default()
        })
        .await;

    assert_eq!(store.preferences().color_palette, ColorPalette::Mono);
}

async fn serve() -> String {
    let storage = SqliteStorage::open_memory().unwrap();
    let presigner =
        Arc::new(SignedUrlPresigner::new("http://storage.test/objects", "secret").unwrap());
    let app = build_router(AppState::new(storage, Arc::new(HeaderIdentity), presigner));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn api_client_round_trip() {
    let base = serve().await;
    let client = ApiClient::new(&base).unwrap().with_user(User::new("u1"));

    assert_eq!(client.me().await.unwrap().id, "u1");

    let mut store = TasksStore::new(client.clone());
    let first = store
        .create(&NewTask::new("Stretch").with_mood(AnticipatedMood::Calm))
        .await
        .unwrap();
    let second = store.create(&NewTask::new("Email")).await.unwrap();
    assert_eq!(first.anticipated_mood, Some(AnticipatedMood::Calm));

    store
        .reorder(&[ReorderItem::new(first.id, 1), ReorderItem::new(second.id, 0)])
        .await
        .unwrap();
    store.fetch().await.unwrap();
    assert_eq!(store.tasks()[0].id, second.id);

    let err = store
        .update(9999, &TaskPatch::status(TaskStatus::Done))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: 404, .. }));

    let mut prefs = PreferencesStore::new(client, "u1");
    prefs.load().await;
    assert!(prefs.is_loaded());
    prefs
        .update(&PreferencesPatch {
            emoji_set: Some(EmojiSet::Expressive),
            ..PreferencesPatch::default()
        })
        .await;
    assert_eq!(prefs.preferences().emoji_set, EmojiSet::Expressive);
    assert!(prefs.preferences().created_at.is_some());
}

#[tokio::test]
async fn api_client_without_identity_gets_401() {
    let base = serve().await;
    let client = ApiClient::new(&base).unwrap();
    let err = client.list_tasks().await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 401, ref message } if message == "Unauthenticated"));
}
