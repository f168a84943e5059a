//! Calendar projection and the daily mood summary.
//!
//! Tasks with a due date become calendar events: timed tasks span one hour,
//! undated times render as all-day. The day summary counts anticipated moods
//! and picks a tip for the dominant one.

use crate::error::{Error, Result};
use crate::model::{AnticipatedMood, Priority, Task, TaskStatus};
use crate::validate::{validate_due_date, validate_due_time};
use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta};
use serde::Serialize;
use std::collections::BTreeMap;

/// Calendar id for tasks without an anticipated mood.
pub const DEFAULT_CALENDAR_ID: &str = "default";

const FRESH_START_TIP: &str = "Start fresh today - set your intentions mindfully.";

/// A task rendered on the schedule calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:mm`
    pub start: String,
    pub end: String,
    pub calendar_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anticipated_mood: Option<AnticipatedMood>,
    pub status: TaskStatus,
    pub priority: Priority,
}

impl CalendarEvent {
    /// Project a task; `None` when it has no due date.
    #[must_use]
    pub fn from_task(task: &Task) -> Option<Self> {
        let date = task.due_date.as_deref()?;

        let (start, end) = match task.due_time.as_deref() {
            Some(time) => {
                let end_time = add_hour(time).unwrap_or_else(|| time.to_string());
                (format!("{date} {time}"), format!("{date} {end_time}"))
            }
            None => (date.to_string(), date.to_string()),
        };

        Some(Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            start,
            end,
            calendar_id: task
                .anticipated_mood
                .map_or(DEFAULT_CALENDAR_ID, |m| m.as_str())
                .to_string(),
            anticipated_mood: task.anticipated_mood,
            status: task.status,
            priority: task.priority,
        })
    }
}

/// Every dated task as a calendar event, in input order.
#[must_use]
pub fn calendar_events(tasks: &[Task]) -> Vec<CalendarEvent> {
    tasks.iter().filter_map(CalendarEvent::from_task).collect()
}

/// Add one hour to an `HH:mm` time, wrapping at midnight.
///
/// The date is not advanced: `23:30` becomes `00:30` on the same day.
#[must_use]
pub fn add_hour(time: &str) -> Option<String> {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some((parsed + TimeDelta::hours(1)).format("%H:%M").to_string())
}

/// Whether a calendar start string carries a clock time.
#[must_use]
pub fn has_time_component(value: &str) -> bool {
    (value.contains(' ') || value.contains('T')) && value.contains(':')
}

/// Split a dragged event start back into due date and optional due time.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:mm` and `YYYY-MM-DDTHH:mm[:ss]`.
///
/// # Errors
///
/// Returns `InvalidArgument` when either half does not parse.
pub fn split_event_start(value: &str) -> Result<(String, Option<String>)> {
    let value = value.trim();
    if !has_time_component(value) {
        return Ok((validate_due_date(value)?, None));
    }

    let (date, time) = value
        .split_once([' ', 'T'])
        .ok_or_else(|| Error::InvalidArgument(format!("invalid event start '{value}'")))?;
    // Drop seconds from ISO timestamps
    let time = time.get(..5).unwrap_or(time);

    Ok((validate_due_date(date)?, Some(validate_due_time(time)?)))
}

/// Tasks due on `date`.
#[must_use]
pub fn tasks_for_date<'a>(tasks: &'a [Task], date: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.due_date.as_deref() == Some(date))
        .collect()
}

/// Dated tasks keyed by due date, earliest date first.
#[must_use]
pub fn group_by_due_date(tasks: &[Task]) -> BTreeMap<String, Vec<&Task>> {
    let mut groups: BTreeMap<String, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(date) = &task.due_date {
            groups.entry(date.clone()).or_default().push(task);
        }
    }
    groups
}

/// Count of tasks per anticipated mood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoodDistribution {
    pub energized: usize,
    pub calm: usize,
    pub tense: usize,
    pub drained: usize,
    pub curious: usize,
}

impl MoodDistribution {
    #[must_use]
    pub const fn get(&self, mood: AnticipatedMood) -> usize {
        match mood {
            AnticipatedMood::Energized => self.energized,
            AnticipatedMood::Calm => self.calm,
            AnticipatedMood::Tense => self.tense,
            AnticipatedMood::Drained => self.drained,
            AnticipatedMood::Curious => self.curious,
        }
    }

    fn bump(&mut self, mood: AnticipatedMood) {
        let slot = match mood {
            AnticipatedMood::Energized => &mut self.energized,
            AnticipatedMood::Calm => &mut self.calm,
            AnticipatedMood::Tense => &mut self.tense,
            AnticipatedMood::Drained => &mut self.drained,
            AnticipatedMood::Curious => &mut self.curious,
        };
        *slot += 1;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        AnticipatedMood::ALL.iter().map(|&m| self.get(m)).sum()
    }

    /// Mood with the highest non-zero count; earlier moods win ties.
    #[must_use]
    pub fn dominant(&self) -> Option<AnticipatedMood> {
        let mut best: Option<(AnticipatedMood, usize)> = None;
        for mood in AnticipatedMood::ALL {
            let count = self.get(mood);
            if count > 0 && best.is_none_or(|(_, top)| count > top) {
                best = Some((mood, count));
            }
        }
        best.map(|(mood, _)| mood)
    }
}

/// Count anticipated moods across `tasks`.
#[must_use]
pub fn mood_distribution<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> MoodDistribution {
    let mut dist = MoodDistribution::default();
    for mood in tasks.into_iter().filter_map(|t| t.anticipated_mood) {
        dist.bump(mood);
    }
    dist
}

fn tips_for(mood: AnticipatedMood) -> &'static [&'static str] {
    match mood {
        AnticipatedMood::Energized => &[
            "Your morning looks energizing - great time for creative work!",
            "High energy day ahead! Tackle challenging tasks early.",
            "Feeling energized? Perfect for brainstorming sessions.",
        ],
        AnticipatedMood::Calm => &[
            "A peaceful day ahead - ideal for deep focus work.",
            "Calm vibes today - great for reflection and planning.",
            "Your schedule looks balanced and mindful.",
        ],
        AnticipatedMood::Tense => &[
            "Some challenging moments ahead - remember to breathe.",
            "A few tense tasks today - schedule short breaks between them.",
            "Take it one step at a time today.",
        ],
        AnticipatedMood::Drained => &[
            "Light load today - be gentle with yourself.",
            "Low-energy day ahead - prioritize rest when you can.",
            "Today's pace is sustainable - no rush needed.",
        ],
        AnticipatedMood::Curious => &[
            "Curiosity-driven day ahead - embrace exploration!",
            "Great day for learning something new.",
            "Your curious tasks will spark creativity.",
        ],
    }
}

/// Tip for the dominant mood; `seed` picks among that mood's tips.
#[must_use]
pub fn smart_tip(dist: &MoodDistribution, seed: usize) -> &'static str {
    match dist.dominant() {
        Some(mood) => {
            let tips = tips_for(mood);
            tips[seed % tips.len()]
        }
        None => FRESH_START_TIP,
    }
}

/// What the welcome header shows for one day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    pub tasks: Vec<Task>,
    /// Tasks due that day that are not done
    pub pending_today: usize,
    /// Not-done tasks across every date
    pub pending_total: usize,
    pub distribution: MoodDistribution,
    pub tip: &'static str,
}

impl DaySummary {
    /// Summarize `date`. The tip rotates with the day of the year.
    #[must_use]
    pub fn for_date(tasks: &[Task], date: &str) -> Self {
        let today = tasks_for_date(tasks, date);
        let distribution = mood_distribution(today.iter().copied());
        let seed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|d| d.ordinal0() as usize)
            .unwrap_or(0);

        Self {
            date: date.to_string(),
            pending_today: today.iter().filter(|t| t.is_pending()).count(),
            pending_total: tasks.iter().filter(|t| t.is_pending()).count(),
            tasks: today.into_iter().cloned().collect(),
            distribution,
            tip: smart_tip(&distribution, seed),
        }
    }
}
