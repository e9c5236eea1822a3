use jiff::Timestamp;
use slug::slugify;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{
        project::{Project, ProjectParameters, ProjectStatus, ProjectType, ProjectValidationError},
        store::Store,
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum CreateProjectError {
    #[error("Invalid project: {0}")]
    Validation(#[from] ProjectValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CreateProjectParameters {
    pub name: String,
    pub description: String,
    pub address: String,
    pub project_type: ProjectType,
    pub start_date: Timestamp,
    pub due_date: Timestamp,
    pub is_urgent: bool,
}

pub fn create_project(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CreateProjectParameters,
) -> Result<Project, CreateProjectError> {
    let mut project_parameters = ProjectParameters::new(
        parameters.name,
        parameters.address,
        parameters.start_date,
        parameters.due_date,
    );
    project_parameters.description = parameters.description;
    project_parameters.project_type = parameters.project_type;
    project_parameters.is_urgent = parameters.is_urgent;

    let project = Project::new(project_parameters)?;

    store.add_project(project.clone());
    storage.save(store)?;

    info!(project_id = %project.id(), name = project.name(), "created project");
    Ok(project)
}

#[derive(Debug, Error)]
pub enum UpdateProjectError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Invalid project: {0}")]
    Validation(#[from] ProjectValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Fields left as `None` keep their current value.
#[derive(Default)]
pub struct UpdateProjectParameters {
    pub project_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub project_type: Option<ProjectType>,
    pub start_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
    pub progress_percentage: Option<f64>,
    pub is_urgent: Option<bool>,
    pub status: Option<ProjectStatus>,
}

/// Rebuilds the project with the edited fields through the validating
/// constructor. A rejected edit leaves the stored project untouched.
pub fn update_project(
    store: &mut Store,
    storage: &impl Storage,
    parameters: UpdateProjectParameters,
) -> Result<Project, UpdateProjectError> {
    let project_id = parameters.project_id;
    let current = store
        .get_project_mut(project_id)
        .ok_or(UpdateProjectError::ProjectNotFound(project_id))?;

    let mut edited = current.to_parameters();
    if let Some(name) = parameters.name {
        edited.name = name;
    }
    if let Some(description) = parameters.description {
        edited.description = description;
    }
    if let Some(address) = parameters.address {
        edited.address = address;
    }
    if let Some(project_type) = parameters.project_type {
        edited.project_type = project_type;
    }
    if let Some(start_date) = parameters.start_date {
        edited.start_date = start_date;
    }
    if let Some(due_date) = parameters.due_date {
        edited.due_date = due_date;
    }
    if let Some(progress_percentage) = parameters.progress_percentage {
        edited.progress_percentage = progress_percentage;
    }
    if let Some(is_urgent) = parameters.is_urgent {
        edited.is_urgent = is_urgent;
    }
    if let Some(status) = parameters.status {
        edited.status = status;
    }

    let updated = Project::new(edited)?;
    *current = updated.clone();

    storage.save(store)?;

    info!(%project_id, "updated project");
    Ok(updated)
}

#[derive(Debug, Error)]
pub enum DeleteProjectError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteProjectParameters {
    pub project_id: Uuid,
}

pub struct DeleteProjectResult {
    pub project: Project,
    pub removed_activities_count: usize,
}

/// Removes the project and every activity logged against it.
pub fn delete_project(
    store: &mut Store,
    storage: &impl Storage,
    parameters: DeleteProjectParameters,
) -> Result<DeleteProjectResult, DeleteProjectError> {
    let project = store
        .remove_project(parameters.project_id)
        .ok_or(DeleteProjectError::ProjectNotFound(parameters.project_id))?;

    let activities_before = store.activities.len();
    store
        .activities
        .retain(|a| a.project_id() != parameters.project_id);
    let removed_activities_count = activities_before - store.activities.len();

    storage.save(store)?;

    info!(
        project_id = %project.id(),
        removed_activities_count,
        "deleted project"
    );
    Ok(DeleteProjectResult {
        project,
        removed_activities_count,
    })
}

#[derive(Debug, Error, PartialEq)]
pub enum FindProjectError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Project name is ambiguous. Multiple projects found: {}", .0.join(", "))]
    AmbiguousProjectName(Vec<String>),
}

/// Resolves a project by id, by slug, or by a unique part of its name.
pub fn find_project<'a>(store: &'a Store, query: &str) -> Result<&'a Project, FindProjectError> {
    if let Ok(project_id) = query.parse::<Uuid>() {
        return store
            .get_project(project_id)
            .ok_or_else(|| FindProjectError::ProjectNotFound(query.to_string()));
    }

    let query_slug = slugify(query);
    if let Some(project) = store
        .projects
        .iter()
        .find(|p| slugify(p.name()) == query_slug)
    {
        return Ok(project);
    }

    // Fuzzy match on the name
    let needle = query.to_lowercase();
    let matching_projects: Vec<_> = store
        .projects
        .iter()
        .filter(|p| p.name().to_lowercase().contains(&needle))
        .collect();

    match matching_projects.as_slice() {
        [] => Err(FindProjectError::ProjectNotFound(query.to_string())),
        [project] => Ok(*project),
        _ => {
            let names = matching_projects.iter().map(|p| p.name().to_string()).collect();
            Err(FindProjectError::AmbiguousProjectName(names))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::{Activity, ActivityType};
    use crate::storage::MemoryStorage;

    fn at(value: &str) -> Timestamp {
        value.parse().unwrap()
    }

    fn parameters(name: &str) -> CreateProjectParameters {
        CreateProjectParameters {
            name: name.to_string(),
            description: String::new(),
            address: "77 Bay Rd".to_string(),
            project_type: ProjectType::House,
            start_date: at("2026-07-01T08:00:00Z"),
            due_date: at("2027-01-29T17:00:00Z"),
            is_urgent: false,
        }
    }

    #[test]
    fn test_create_project_persists() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();

        let project = create_project(&mut store, &storage, parameters("Bay house")).unwrap();

        assert_eq!(store.get_project(project.id()), Some(&project));
        assert_eq!(storage.snapshot(), store);
        assert_eq!(project.project_type(), ProjectType::House);
    }

    #[test]
    fn test_create_project_rejects_invalid_input() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();
        let mut invalid = parameters("Bay house");
        invalid.due_date = invalid.start_date;

        let result = create_project(&mut store, &storage, invalid);

        assert!(matches!(
            result,
            Err(CreateProjectError::Validation(ProjectValidationError::InvalidDateRange))
        ));
        assert!(store.projects.is_empty());
        assert!(storage.snapshot().projects.is_empty());
    }

    #[test]
    fn test_update_project_rebuilds_with_edits() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();
        let project = create_project(&mut store, &storage, parameters("Bay house")).unwrap();

        let updated = update_project(
            &mut store,
            &storage,
            UpdateProjectParameters {
                project_id: project.id(),
                name: Some("Bay house extension".to_string()),
                progress_percentage: Some(40.0),
                status: Some(ProjectStatus::OnHold),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.id(), project.id());
        assert_eq!(updated.name(), "Bay house extension");
        assert_eq!(updated.address(), "77 Bay Rd");
        assert_eq!(updated.progress_percentage(), 40.0);
        assert_eq!(updated.status(), ProjectStatus::OnHold);
        assert_eq!(storage.snapshot().get_project(project.id()), Some(&updated));
    }

    #[test]
    fn test_rejected_update_keeps_the_stored_project() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();
        let project = create_project(&mut store, &storage, parameters("Bay house")).unwrap();

        let result = update_project(
            &mut store,
            &storage,
            UpdateProjectParameters {
                project_id: project.id(),
                name: Some("Renamed".to_string()),
                due_date: Some(project.start_date()),
                ..Default::default()
            },
        );

        assert!(matches!(
            result,
            Err(UpdateProjectError::Validation(ProjectValidationError::InvalidDateRange))
        ));
        assert_eq!(store.get_project(project.id()), Some(&project));
        assert_eq!(storage.snapshot().get_project(project.id()), Some(&project));
    }

    #[test]
    fn test_update_missing_project() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();
        let missing = Uuid::new_v4();

        let result = update_project(
            &mut store,
            &storage,
            UpdateProjectParameters {
                project_id: missing,
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(UpdateProjectError::ProjectNotFound(id)) if id == missing));
    }

    #[test]
    fn test_delete_project_cascades_to_activities() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();
        let kept = create_project(&mut store, &storage, parameters("Kept")).unwrap();
        let doomed = create_project(&mut store, &storage, parameters("Doomed")).unwrap();
        for project_id in [kept.id(), doomed.id(), doomed.id()] {
            store.add_activity(
                Activity::new(
                    Uuid::new_v4(),
                    project_id,
                    "",
                    1.0,
                    at("2026-07-02T08:00:00Z"),
                    ActivityType::Meeting,
                )
                .unwrap(),
            );
        }

        let result = delete_project(
            &mut store,
            &storage,
            DeleteProjectParameters {
                project_id: doomed.id(),
            },
        )
        .unwrap();

        assert_eq!(result.project.id(), doomed.id());
        assert_eq!(result.removed_activities_count, 2);
        assert_eq!(store.projects.len(), 1);
        assert_eq!(storage.snapshot().activities.len(), 1);
    }

    #[test]
    fn test_delete_missing_project() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();
        let missing = Uuid::new_v4();

        let result = delete_project(&mut store, &storage, DeleteProjectParameters { project_id: missing });

        assert!(matches!(result, Err(DeleteProjectError::ProjectNotFound(id)) if id == missing));
    }

    #[test]
    fn test_find_project() {
        let storage = MemoryStorage::default();
        let mut store = Store::default();
        let bay = create_project(&mut store, &storage, parameters("Bay House")).unwrap();
        create_project(&mut store, &storage, parameters("Bay House Garage")).unwrap();
        create_project(&mut store, &storage, parameters("Hill Duplex")).unwrap();

        assert_eq!(find_project(&store, &bay.id().to_string()).unwrap().id(), bay.id());
        assert_eq!(find_project(&store, "bay-house").unwrap().id(), bay.id());
        assert_eq!(find_project(&store, "duplex").unwrap().name(), "Hill Duplex");
        assert!(matches!(
            find_project(&store, "bay"),
            Err(FindProjectError::AmbiguousProjectName(names)) if names.len() == 2
        ));
        assert_eq!(
            find_project(&store, "warehouse"),
            Err(FindProjectError::ProjectNotFound("warehouse".to_string()))
        );
    }
}
