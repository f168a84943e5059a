//! Kanban board bookkeeping.
//!
//! Groups a user's tasks into the four status columns and turns a drag from
//! one slot to another into the writes that persist it: an optional status
//! change plus a renumbering of the affected columns.

use crate::error::{Error, Result};
use crate::model::{ReorderItem, Task, TaskStatus};
use serde::Serialize;

/// One status column, sorted by order index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub title: &'static str,
    pub tasks: Vec<Task>,
}

/// Tasks grouped into columns in board order.
#[derive(Debug, Clone, Serialize)]
pub struct KanbanBoard {
    columns: Vec<BoardColumn>,
}

/// The writes needed to persist a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub task_id: i64,
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// `Some` only when the task changes column
    pub status_change: Option<TaskStatus>,
    /// New order indexes for the destination column, then the source column
    /// when it differs
    pub reorder: Vec<ReorderItem>,
}

impl MovePlan {
    /// Whether the move should prompt for a completion reflection.
    #[must_use]
    pub fn celebrates(&self) -> bool {
        celebrates(self.from, self.to)
    }
}

impl KanbanBoard {
    /// Group tasks by status. Ties on order index keep input order.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let columns = TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let mut tasks: Vec<Task> =
                    tasks.iter().filter(|t| t.status == status).cloned().collect();
                tasks.sort_by_key(|t| t.order_index);
                BoardColumn {
                    status,
                    title: status.label(),
                    tasks,
                }
            })
            .collect();
        Self { columns }
    }

    #[must_use]
    pub fn columns(&self) -> &[BoardColumn] {
        &self.columns
    }

    /// Tasks in one column.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.columns
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.tasks.as_slice())
            .unwrap_or_default()
    }

    /// Column currently holding `task_id`.
    #[must_use]
    pub fn find_column(&self, task_id: i64) -> Option<TaskStatus> {
        self.columns
            .iter()
            .find(|c| c.tasks.iter().any(|t| t.id == task_id))
            .map(|c| c.status)
    }

    /// Plan moving `task_id` to `to_position` in the `to` column.
    ///
    /// Positions past the end of the column append.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` when the task is not on the board.
    pub fn plan_move(&self, task_id: i64, to: TaskStatus, to_position: usize) -> Result<MovePlan> {
        let from = self
            .find_column(task_id)
            .ok_or(Error::TaskNotFound { id: task_id })?;

        let mut source: Vec<i64> = self.column(from).iter().map(|t| t.id).collect();
        source.retain(|&id| id != task_id);

        let reorder = if from == to {
            let at = to_position.min(source.len());
            source.insert(at, task_id);
            renumber(&source)
        } else {
            let mut dest: Vec<i64> = self.column(to).iter().map(|t| t.id).collect();
            let at = to_position.min(dest.len());
            dest.insert(at, task_id);
            let mut items = renumber(&dest);
            items.extend(renumber(&source));
            items
        };

        Ok(MovePlan {
            task_id,
            from,
            to,
            status_change: (from != to).then_some(to),
            reorder,
        })
    }
}

/// True when a task enters `done` from another column.
#[must_use]
pub fn celebrates(from: TaskStatus, to: TaskStatus) -> bool {
    to == TaskStatus::Done && from != TaskStatus::Done
}

fn renumber(ids: &[i64]) -> Vec<ReorderItem> {
    ids.iter()
        .zip(0_i64..)
        .map(|(&id, index)| ReorderItem::new(id, index))
        .collect()
}
