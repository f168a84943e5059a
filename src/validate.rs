//! Input validation and normalization for task payloads.
//!
//! Provides O(1) validation sets and synonym maps so clients can send
//! natural spellings for statuses and priorities. Three-tier resolution:
//! exact match → synonym lookup → error with suggestion.

use crate::error::{Error, Result};
use crate::model::{AnticipatedMood, CompletedMood, Priority, TaskStatus};
use chrono::{NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Longest accepted task title, in characters.
pub const MAX_TITLE_CHARS: usize = 500;

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| TaskStatus::ALL.iter().map(TaskStatus::as_str).collect());

pub static VALID_PRIORITIES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| Priority::ALL.iter().map(Priority::as_str).collect());

pub static VALID_ANTICIPATED_MOODS: LazyLock<HashSet<&str>> =
    LazyLock::new(|| AnticipatedMood::ALL.iter().map(AnticipatedMood::as_str).collect());

pub static VALID_COMPLETED_MOODS: LazyLock<HashSet<&str>> =
    LazyLock::new(|| CompletedMood::ALL.iter().map(CompletedMood::as_str).collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("in_progress", "in-progress"),
        ("inprogress", "in-progress"),
        ("wip", "in-progress"),
        ("doing", "in-progress"),
        ("started", "in-progress"),
        ("complete", "done"),
        ("completed", "done"),
        ("finished", "done"),
        ("closed", "done"),
        ("open", "todo"),
        ("new", "todo"),
        ("to-do", "todo"),
        ("later", "backlog"),
        ("someday", "backlog"),
    ]
    .into_iter()
    .collect()
});

pub static PRIORITY_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("urgent", "high"),
        ("critical", "high"),
        ("important", "high"),
        ("normal", "medium"),
        ("default", "medium"),
        ("med", "medium"),
        ("minor", "low"),
        ("trivial", "low"),
    ]
    .into_iter()
    .collect()
});

static NO_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(HashMap::new);

/// Normalize a status string via exact match or synonym lookup.
///
/// # Errors
///
/// Returns `Error::InvalidStatus` carrying the closest suggestion, if any.
pub fn normalize_status(input: &str) -> Result<TaskStatus> {
    let lower = input.trim().to_lowercase();

    let canonical = if VALID_STATUSES.contains(lower.as_str()) {
        Some(lower.as_str())
    } else {
        STATUS_SYNONYMS.get(lower.as_str()).copied()
    };

    canonical.and_then(TaskStatus::parse).ok_or_else(|| Error::InvalidStatus {
        value: input.to_string(),
        suggestion: find_closest_match(&lower, &VALID_STATUSES, &STATUS_SYNONYMS),
    })
}

/// Normalize a priority string via exact match or synonym lookup.
///
/// # Errors
///
/// Returns `Error::InvalidPriority` carrying the closest suggestion, if any.
pub fn normalize_priority(input: &str) -> Result<Priority> {
    let lower = input.trim().to_lowercase();

    let canonical = if VALID_PRIORITIES.contains(lower.as_str()) {
        Some(lower.as_str())
    } else {
        PRIORITY_SYNONYMS.get(lower.as_str()).copied()
    };

    canonical.and_then(Priority::parse).ok_or_else(|| Error::InvalidPriority {
        value: input.to_string(),
        suggestion: find_closest_match(&lower, &VALID_PRIORITIES, &PRIORITY_SYNONYMS),
    })
}

/// Normalize an anticipated mood (exact spellings only, any case).
///
/// # Errors
///
/// Returns `Error::InvalidMood` when the value is not a known mood.
pub fn normalize_anticipated_mood(input: &str) -> Result<AnticipatedMood> {
    let lower = input.trim().to_lowercase();
    AnticipatedMood::parse(&lower).ok_or_else(|| Error::InvalidMood {
        field: "anticipatedMood",
        value: input.to_string(),
        suggestion: find_closest_match(&lower, &VALID_ANTICIPATED_MOODS, &NO_SYNONYMS),
    })
}

/// Normalize a completed mood (exact spellings only, any case).
///
/// # Errors
///
/// Returns `Error::InvalidMood` when the value is not a known mood.
pub fn normalize_completed_mood(input: &str) -> Result<CompletedMood> {
    let lower = input.trim().to_lowercase();
    CompletedMood::parse(&lower).ok_or_else(|| Error::InvalidMood {
        field: "completedMood",
        value: input.to_string(),
        suggestion: find_closest_match(&lower, &VALID_COMPLETED_MOODS, &NO_SYNONYMS),
    })
}

/// Validate and trim a task title.
///
/// # Errors
///
/// Returns `Error::RequiredField` for blank titles and `Error::InvalidArgument`
/// for titles over [`MAX_TITLE_CHARS`].
pub fn validate_title(input: &str) -> Result<String> {
    let title = input.trim();
    if title.is_empty() {
        return Err(Error::RequiredField { field: "title" });
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(Error::InvalidArgument(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Validate a `YYYY-MM-DD` due date.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` when the string is not a real calendar date.
pub fn validate_due_date(input: &str) -> Result<String> {
    let trimmed = input.trim();
    // chrono accepts unpadded fields; the wire format is strictly padded
    if trimmed.len() != 10 {
        return Err(invalid_due_date(input));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| invalid_due_date(input))
}

/// Validate an `HH:mm` due time.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` when the string is not a 24h clock time.
pub fn validate_due_time(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.len() != 5 {
        return Err(invalid_due_time(input));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| invalid_due_time(input))
}

fn invalid_due_date(input: &str) -> Error {
    Error::InvalidArgument(format!("dueDate must be YYYY-MM-DD, got '{input}'"))
}

fn invalid_due_time(input: &str) -> Error {
    Error::InvalidArgument(format!("dueTime must be HH:mm, got '{input}'"))
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist > 3 {
            continue;
        }
        let better = match best {
            Some((_, best_dist)) => dist < best_dist,
            None => true,
        };
        if better {
            // For synonyms, show what it maps to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}
