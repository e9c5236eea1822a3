use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// UUID to identify the task
    pub id: Uuid,
    /// Title of the task, not validated
    pub title: String,
    /// Free-form description, may be empty
    pub description: String,
    /// Deadline for this task
    pub due_date: Timestamp,
    /// Priority of the task
    pub priority: Priority,
    /// Current status of the task
    pub status: TaskStatus,
    /// Whether the task was flagged as urgent
    pub is_urgent: bool,
    /// Tasks that must precede this one
    pub dependencies: BTreeSet<Uuid>,
    /// The project of this task if it belongs to any
    pub project_id: Option<Uuid>,
    /// Parent task for sub-task hierarchies
    pub parent_task_id: Option<Uuid>,
    /// Team members working on the task
    pub assigned_members: BTreeSet<Uuid>,
    /// Display position within the project
    pub order: i32,
}

impl Task {
    /// Creates a task due in 24 hours with the default priority and status.
    pub fn new(title: impl Into<String>, project_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            due_date: Timestamp::now() + SignedDuration::from_hours(24),
            priority: Priority::default(),
            status: TaskStatus::default(),
            is_urgent: false,
            dependencies: BTreeSet::new(),
            project_id,
            parent_task_id: None,
            assigned_members: BTreeSet::new(),
            order: 0,
        }
    }

    /// True when the status is `Completed`.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// Lifecycle of a task. Serialized with the labels of the export document.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Overdue,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown task status '{0}'")]
pub struct UnknownTaskStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownTaskStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownTaskStatus(value.to_string()))
    }
}

/// Parent to children index built from `parent_task_id`.
///
/// Children keep the order in which they appear in the source slice. A parent
/// id that does not resolve to any task in the slice still gets an entry.
#[derive(Debug, Default)]
pub struct TaskHierarchy {
    children: BTreeMap<Uuid, Vec<Uuid>>,
    roots: Vec<Uuid>,
}

impl TaskHierarchy {
    pub fn build(tasks: &[Task]) -> Self {
        let mut hierarchy = TaskHierarchy::default();
        for task in tasks {
            match task.parent_task_id {
                Some(parent_id) => hierarchy.children.entry(parent_id).or_default().push(task.id),
                None => hierarchy.roots.push(task.id),
            }
        }
        hierarchy
    }

    pub fn children_of(&self, parent_id: Uuid) -> &[Uuid] {
        self.children
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tasks without a parent
    pub fn roots(&self) -> &[Uuid] {
        &self.roots
    }
}
