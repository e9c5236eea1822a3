use std::collections::BTreeSet;

use jiff::Timestamp;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dependencies,
    models::{
        project::{Project, ProjectError},
        store::Store,
        task::{Priority, Task, TaskStatus},
    },
    storage::{Storage, StorageError},
};

/// Id of the project holding the task.
fn project_id_of_task(store: &Store, task_id: Uuid) -> Option<Uuid> {
    store.get_task(task_id).map(|(project, _)| project.id())
}

/// Project holding the task, mutably.
fn project_of_task_mut(store: &mut Store, task_id: Uuid) -> Option<&mut Project> {
    let project_id = project_id_of_task(store, task_id)?;
    store.get_project_mut(project_id)
}

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Task '{0}' not found in the project")]
    TaskNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AddTaskParameters {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: Option<Timestamp>,
    pub priority: Priority,
    pub is_urgent: bool,
    pub parent_task_id: Option<Uuid>,
    pub dependencies: BTreeSet<Uuid>,
}

impl AddTaskParameters {
    pub fn new(project_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::default(),
            is_urgent: false,
            parent_task_id: None,
            dependencies: BTreeSet::new(),
        }
    }
}

/// Appends a task to the project. Parent and dependencies must be tasks of
/// the same project. A brand new task cannot close a cycle since nothing
/// depends on it yet.
pub fn add_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: AddTaskParameters,
) -> Result<Task, AddTaskError> {
    let project = store
        .get_project_mut(parameters.project_id)
        .ok_or(AddTaskError::ProjectNotFound(parameters.project_id))?;

    let referenced = parameters.parent_task_id.iter().chain(&parameters.dependencies);
    for task_id in referenced {
        if project.get_task(*task_id).is_none() {
            return Err(AddTaskError::TaskNotFound(*task_id));
        }
    }

    let mut task = Task::new(parameters.title, Some(project.id()));
    task.description = parameters.description;
    if let Some(due_date) = parameters.due_date {
        task.due_date = due_date;
    }
    task.priority = parameters.priority;
    task.is_urgent = parameters.is_urgent;
    task.parent_task_id = parameters.parent_task_id;
    task.dependencies = parameters.dependencies;
    task.order = project.tasks().len() as i32;

    project.add_task(task.clone());

    storage.save(store)?;

    info!(task_id = %task.id, project_id = ?task.project_id, "added task");
    Ok(task)
}

#[derive(Debug, Error)]
pub enum UpdateTaskError {
    #[error("Task '{0}' not found")]
    TaskNotFound(Uuid),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Fields left as `None` keep their current value.
#[derive(Default)]
pub struct UpdateTaskParameters {
    pub task_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Timestamp>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub is_urgent: Option<bool>,
}

pub fn update_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: UpdateTaskParameters,
) -> Result<Task, UpdateTaskError> {
    let task_id = parameters.task_id;
    let project =
        project_of_task_mut(store, task_id).ok_or(UpdateTaskError::TaskNotFound(task_id))?;
    let mut task = project
        .get_task(task_id)
        .cloned()
        .ok_or(UpdateTaskError::TaskNotFound(task_id))?;

    if let Some(title) = parameters.title {
        task.title = title;
    }
    if let Some(description) = parameters.description {
        task.description = description;
    }
    if let Some(due_date) = parameters.due_date {
        task.due_date = due_date;
    }
    if let Some(priority) = parameters.priority {
        task.priority = priority;
    }
    if let Some(status) = parameters.status {
        task.status = status;
    }
    if let Some(is_urgent) = parameters.is_urgent {
        task.is_urgent = is_urgent;
    }

    project.update_task(task.clone())?;

    storage.save(store)?;

    info!(%task_id, "updated task");
    Ok(task)
}

#[derive(Debug, Error)]
pub enum RemoveTaskError {
    #[error("Task '{0}' not found")]
    TaskNotFound(Uuid),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct RemoveTaskParameters {
    pub task_id: Uuid,
}

/// Removes the task and clears references to it from the remaining tasks of
/// the project: dependency edges are dropped and sub-tasks become top level.
pub fn remove_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: RemoveTaskParameters,
) -> Result<Task, RemoveTaskError> {
    let task_id = parameters.task_id;
    let project =
        project_of_task_mut(store, task_id).ok_or(RemoveTaskError::TaskNotFound(task_id))?;

    let removed = project.remove_task(task_id)?;

    let referencing: Vec<Task> = project
        .tasks()
        .iter()
        .filter(|t| t.dependencies.contains(&task_id) || t.parent_task_id == Some(task_id))
        .cloned()
        .collect();
    for task in referencing {
        let mut task = dependencies::remove_dependency(&task, task_id);
        if task.parent_task_id == Some(task_id) {
            task.parent_task_id = None;
        }
        project.update_task(task)?;
    }

    storage.save(store)?;

    info!(%task_id, "removed task");
    Ok(removed)
}

#[derive(Debug, Error)]
pub enum ToggleTaskCompletionError {
    #[error("Task '{0}' not found")]
    TaskNotFound(Uuid),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct ToggleTaskCompletionParameters {
    pub task_id: Uuid,
}

/// Returns the status the task ended up with.
pub fn toggle_task_completion(
    store: &mut Store,
    storage: &impl Storage,
    parameters: ToggleTaskCompletionParameters,
) -> Result<TaskStatus, ToggleTaskCompletionError> {
    let task_id = parameters.task_id;
    let project = project_of_task_mut(store, task_id)
        .ok_or(ToggleTaskCompletionError::TaskNotFound(task_id))?;

    let status = project.toggle_task_completion(task_id)?;

    storage.save(store)?;

    info!(%task_id, %status, "toggled task completion");
    Ok(status)
}

#[derive(Debug, Error)]
pub enum AddTaskDependencyError {
    #[error("Task '{0}' not found")]
    TaskNotFound(Uuid),

    #[error("Task '{depends_on_id}' is not in the same project as task '{task_id}'")]
    DifferentProjects { task_id: Uuid, depends_on_id: Uuid },

    #[error("Task '{task_id}' cannot depend on '{depends_on_id}': it would create a dependency cycle")]
    DependencyCycle { task_id: Uuid, depends_on_id: Uuid },

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AddTaskDependencyParameters {
    pub task_id: Uuid,
    pub depends_on_id: Uuid,
}

/// Makes `task_id` depend on `depends_on_id`. The edge is rejected when the
/// project's tasks would no longer validate.
pub fn add_task_dependency(
    store: &mut Store,
    storage: &impl Storage,
    parameters: AddTaskDependencyParameters,
) -> Result<Task, AddTaskDependencyError> {
    let AddTaskDependencyParameters {
        task_id,
        depends_on_id,
    } = parameters;

    let project_id = project_id_of_task(store, task_id)
        .ok_or(AddTaskDependencyError::TaskNotFound(task_id))?;
    let depends_on_project_id = project_id_of_task(store, depends_on_id)
        .ok_or(AddTaskDependencyError::TaskNotFound(depends_on_id))?;
    if project_id != depends_on_project_id {
        return Err(AddTaskDependencyError::DifferentProjects {
            task_id,
            depends_on_id,
        });
    }

    let project = store
        .get_project_mut(project_id)
        .ok_or(AddTaskDependencyError::TaskNotFound(task_id))?;
    let (task, depends_on) = match (project.get_task(task_id), project.get_task(depends_on_id)) {
        (Some(task), Some(depends_on)) => (task, depends_on),
        _ => return Err(AddTaskDependencyError::TaskNotFound(task_id)),
    };
    let updated = dependencies::add_dependency(task, depends_on);

    let candidate: Vec<Task> = project
        .tasks()
        .iter()
        .map(|t| if t.id == task_id { updated.clone() } else { t.clone() })
        .collect();
    if !dependencies::validate(&candidate) {
        debug!(%task_id, %depends_on_id, "rejected dependency edge");
        return Err(AddTaskDependencyError::DependencyCycle {
            task_id,
            depends_on_id,
        });
    }

    project.update_task(updated.clone())?;

    storage.save(store)?;

    info!(%task_id, %depends_on_id, "added task dependency");
    Ok(updated)
}

#[derive(Debug, Error)]
pub enum RemoveTaskDependencyError {
    #[error("Task '{0}' not found")]
    TaskNotFound(Uuid),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct RemoveTaskDependencyParameters {
    pub task_id: Uuid,
    pub dependency_id: Uuid,
}

pub fn remove_task_dependency(
    store: &mut Store,
    storage: &impl Storage,
    parameters: RemoveTaskDependencyParameters,
) -> Result<Task, RemoveTaskDependencyError> {
    let task_id = parameters.task_id;
    let project = project_of_task_mut(store, task_id)
        .ok_or(RemoveTaskDependencyError::TaskNotFound(task_id))?;
    let task = project
        .get_task(task_id)
        .ok_or(RemoveTaskDependencyError::TaskNotFound(task_id))?;

    let updated = dependencies::remove_dependency(task, parameters.dependency_id);
    project.update_task(updated.clone())?;

    storage.save(store)?;

    info!(%task_id, dependency_id = %parameters.dependency_id, "removed task dependency");
    Ok(updated)
}

#[derive(Debug, Error)]
pub enum ReorderTasksError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct ReorderTasksParameters {
    pub project_id: Uuid,
    pub from: usize,
    pub to: usize,
}

/// Moves a task within the project's list and returns the tasks in their
/// new order.
pub fn reorder_tasks(
    store: &mut Store,
    storage: &impl Storage,
    parameters: ReorderTasksParameters,
) -> Result<Vec<Task>, ReorderTasksError> {
    let project_id = parameters.project_id;
    let project = store
        .get_project_mut(project_id)
        .ok_or(ReorderTasksError::ProjectNotFound(project_id))?;

    project.reorder_tasks(parameters.from, parameters.to)?;
    let tasks = project.tasks().to_vec();

    storage.save(store)?;

    info!(%project_id, from = parameters.from, to = parameters.to, "reordered tasks");
    Ok(tasks)
}
