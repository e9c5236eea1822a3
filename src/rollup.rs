//! Derived progress and status values for a project.
//!
//! All functions are pure over the project's current task list. The `_at`
//! variants take the reference instant explicitly; the plain ones use the
//! current time.

use std::collections::BTreeMap;

use jiff::{Timestamp, Unit, Zoned};
use serde::Serialize;

use crate::models::{
    project::{Project, ProjectStatus},
    task::{Task, TaskStatus},
};

/// Task count per status. Statuses without tasks are left out.
pub fn task_stats(project: &Project) -> BTreeMap<TaskStatus, usize> {
    let mut stats = BTreeMap::new();
    for task in project.tasks() {
        *stats.entry(task.status).or_insert(0) += 1;
    }
    stats
}

pub fn is_overdue(project: &Project) -> bool {
    is_overdue_at(project, Timestamp::now())
}

/// Past its due date with at least one task not completed. A project without
/// tasks is never overdue.
pub fn is_overdue_at(project: &Project, now: Timestamp) -> bool {
    project.due_date() < now && !project.tasks().iter().all(Task::is_completed)
}

pub fn days_remaining(project: &Project) -> i64 {
    days_remaining_at(project, &Zoned::now())
}

/// Whole days from `now` until the due date, negative once it has passed.
pub fn days_remaining_at(project: &Project, now: &Zoned) -> i64 {
    let due = project.due_date().to_zoned(now.time_zone().clone());
    now.until((Unit::Day, &due))
        .map(|span| i64::from(span.get_days()))
        .unwrap_or(0)
}

pub fn overdue_tasks_count(project: &Project) -> usize {
    overdue_tasks_count_at(project, Timestamp::now())
}

pub fn overdue_tasks_count_at(project: &Project, now: Timestamp) -> usize {
    project
        .tasks()
        .iter()
        .filter(|task| !task.is_completed() && task.due_date < now)
        .count()
}

/// Share of completed tasks, from 0 to 100. Zero when there are no tasks.
pub fn completion_percentage(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks.iter().filter(|t| t.is_completed()).count();
    completed as f64 / tasks.len() as f64 * 100.0
}

pub fn derive_status(current: ProjectStatus, percentage: f64) -> ProjectStatus {
    if percentage >= 100.0 {
        ProjectStatus::Completed
    } else if percentage > 0.0 {
        ProjectStatus::InProgress
    } else {
        current
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub urgent: usize,
    pub completion_percentage: f64,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        Self {
            total: tasks.len(),
            completed: count(TaskStatus::Completed),
            in_progress: count(TaskStatus::InProgress),
            overdue: count(TaskStatus::Overdue),
            urgent: tasks.iter().filter(|t| t.is_urgent).count(),
            completion_percentage: completion_percentage(tasks),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
}

impl TaskFilter {
    /// `Overdue` means not completed and past the task's own due date,
    /// whatever its status says.
    pub fn matches(self, task: &Task, now: Timestamp) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.is_completed(),
            TaskFilter::Completed => task.is_completed(),
            TaskFilter::Overdue => !task.is_completed() && task.due_date < now,
        }
    }

    pub fn apply<'a>(self, tasks: &'a [Task], now: Timestamp) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t, now)).collect()
    }
}
