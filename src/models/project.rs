use std::collections::BTreeSet;
use std::fmt;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::dependencies;
use crate::models::task::{Task, TaskStatus};
use crate::rollup;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProjectValidationError {
    #[error("Project name cannot be empty")]
    EmptyName,

    #[error("Project address cannot be empty")]
    EmptyAddress,

    #[error("Due date must be after start date")]
    InvalidDateRange,

    #[error("Progress must be between 0 and 100")]
    InvalidProgress,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Task '{0}' not found")]
    TaskNotFound(Uuid),

    #[error("No task at position {0}")]
    PositionOutOfRange(usize),
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectStatus {
    #[default]
    Planning,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectType {
    House,
    Duplex,
    Townhouse,
    Commercial,
    #[default]
    Other,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::House => "House",
            ProjectType::Duplex => "Duplex",
            ProjectType::Townhouse => "Townhouse",
            ProjectType::Commercial => "Commercial",
            ProjectType::Other => "Other",
        }
    }
}

/// Everything needed to build a [`Project`].
#[derive(Debug, Clone)]
pub struct ProjectParameters {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub project_type: ProjectType,
    pub start_date: Timestamp,
    pub due_date: Timestamp,
    pub progress_percentage: f64,
    pub tasks: Vec<Task>,
    pub is_urgent: bool,
    pub status: ProjectStatus,
    pub assigned_team_members: BTreeSet<Uuid>,
}

impl ProjectParameters {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        start_date: Timestamp,
        due_date: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            address: address.into(),
            project_type: ProjectType::default(),
            start_date,
            due_date,
            progress_percentage: 0.0,
            tasks: Vec::new(),
            is_urgent: false,
            status: ProjectStatus::default(),
            assigned_team_members: BTreeSet::new(),
        }
    }

    /// Starts now and is due in 30 days.
    pub fn starting_now(name: impl Into<String>, address: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self::new(name, address, now, now + SignedDuration::from_hours(30 * 24))
    }
}

/// A construction project owning its tasks.
///
/// Fields are only reachable through accessors so the construction
/// invariants hold for the lifetime of the value. Every task mutation
/// recomputes `progress_percentage` and `status` from the task list.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    id: Uuid,
    name: String,
    description: String,
    address: String,
    project_type: ProjectType,
    start_date: Timestamp,
    due_date: Timestamp,
    progress_percentage: f64,
    tasks: Vec<Task>,
    is_urgent: bool,
    status: ProjectStatus,
    assigned_team_members: BTreeSet<Uuid>,
}

impl Project {
    pub fn new(parameters: ProjectParameters) -> Result<Project, ProjectValidationError> {
        if let Err(error) = Self::validate(&parameters) {
            debug!(project_id = %parameters.id, %error, "rejected project");
            return Err(error);
        }

        Ok(Project {
            id: parameters.id,
            name: parameters.name,
            description: parameters.description,
            address: parameters.address,
            project_type: parameters.project_type,
            start_date: parameters.start_date,
            due_date: parameters.due_date,
            progress_percentage: parameters.progress_percentage,
            tasks: parameters.tasks,
            is_urgent: parameters.is_urgent,
            status: parameters.status,
            assigned_team_members: parameters.assigned_team_members,
        })
    }

    fn validate(parameters: &ProjectParameters) -> Result<(), ProjectValidationError> {
        if parameters.name.trim().is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }
        if parameters.address.trim().is_empty() {
            return Err(ProjectValidationError::EmptyAddress);
        }
        if parameters.due_date <= parameters.start_date {
            return Err(ProjectValidationError::InvalidDateRange);
        }
        // NaN fails both comparisons and is rejected too
        if !(0.0..=100.0).contains(&parameters.progress_percentage) {
            return Err(ProjectValidationError::InvalidProgress);
        }
        Ok(())
    }

    /// Turns the project back into parameters, e.g. to edit and rebuild it.
    pub fn to_parameters(&self) -> ProjectParameters {
        ProjectParameters {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            project_type: self.project_type,
            start_date: self.start_date,
            due_date: self.due_date,
            progress_percentage: self.progress_percentage,
            tasks: self.tasks.clone(),
            is_urgent: self.is_urgent,
            status: self.status,
            assigned_team_members: self.assigned_team_members.clone(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn project_type(&self) -> ProjectType {
        self.project_type
    }

    pub fn start_date(&self) -> Timestamp {
        self.start_date
    }

    pub fn due_date(&self) -> Timestamp {
        self.due_date
    }

    pub fn progress_percentage(&self) -> f64 {
        self.progress_percentage
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_urgent(&self) -> bool {
        self.is_urgent
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn assigned_team_members(&self) -> &BTreeSet<Uuid> {
        &self.assigned_team_members
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    pub fn get_task(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    fn task_index(&self, task_id: Uuid) -> Result<usize, ProjectError> {
        self.tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or(ProjectError::TaskNotFound(task_id))
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.recompute_progress();
    }

    pub fn remove_task(&mut self, task_id: Uuid) -> Result<Task, ProjectError> {
        let index = self.task_index(task_id)?;
        let removed = self.tasks.remove(index);
        self.recompute_progress();
        Ok(removed)
    }

    /// Replaces the task with the same id.
    pub fn update_task(&mut self, task: Task) -> Result<(), ProjectError> {
        let index = self.task_index(task.id)?;
        self.tasks[index] = task;
        self.recompute_progress();
        Ok(())
    }

    pub fn set_task_status(&mut self, task_id: Uuid, status: TaskStatus) -> Result<(), ProjectError> {
        let index = self.task_index(task_id)?;
        self.tasks[index].status = status;
        self.recompute_progress();
        Ok(())
    }

    /// Completed tasks go back to in progress, anything else becomes completed.
    pub fn toggle_task_completion(&mut self, task_id: Uuid) -> Result<TaskStatus, ProjectError> {
        let index = self.task_index(task_id)?;
        let status = if self.tasks[index].is_completed() {
            TaskStatus::InProgress
        } else {
            TaskStatus::Completed
        };
        self.tasks[index].status = status;
        self.recompute_progress();
        Ok(status)
    }

    /// Moves the task at `from` to position `to` and renumbers `order` to
    /// match the new positions. `to` is clamped to the last position.
    pub fn reorder_tasks(&mut self, from: usize, to: usize) -> Result<(), ProjectError> {
        if from >= self.tasks.len() {
            return Err(ProjectError::PositionOutOfRange(from));
        }
        let task = self.tasks.remove(from);
        let to = to.min(self.tasks.len());
        self.tasks.insert(to, task);
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.order = index as i32;
        }
        Ok(())
    }

    pub fn recompute_progress(&mut self) {
        let percentage = rollup::completion_percentage(&self.tasks);
        let status = rollup::derive_status(self.status, percentage);
        debug!(
            project_id = %self.id,
            percentage,
            status = %status,
            "recomputed project progress"
        );
        self.progress_percentage = percentage;
        self.status = status;
    }

    pub fn validate_dependencies(&self) -> bool {
        dependencies::validate(&self.tasks)
    }
}
