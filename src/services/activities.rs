use jiff::Timestamp;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{
        activity::{Activity, ActivityType, ActivityValidationError},
        store::Store,
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum LogActivityError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Invalid activity: {0}")]
    Validation(#[from] ActivityValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct LogActivityParameters {
    pub project_id: Uuid,
    pub description: String,
    pub hours_spent: f64,
    /// Defaults to now
    pub date: Option<Timestamp>,
    pub activity_type: ActivityType,
}

pub fn log_activity(
    store: &mut Store,
    storage: &impl Storage,
    parameters: LogActivityParameters,
) -> Result<Activity, LogActivityError> {
    if store.get_project(parameters.project_id).is_none() {
        return Err(LogActivityError::ProjectNotFound(parameters.project_id));
    }

    let activity = Activity::new(
        Uuid::new_v4(),
        parameters.project_id,
        parameters.description,
        parameters.hours_spent,
        parameters.date.unwrap_or_else(Timestamp::now),
        parameters.activity_type,
    )?;

    store.add_activity(activity.clone());
    storage.save(store)?;

    info!(
        activity_id = %activity.id(),
        project_id = %activity.project_id(),
        hours = activity.hours_spent(),
        "logged activity"
    );
    Ok(activity)
}

#[derive(Debug, Error)]
pub enum DeleteActivityError {
    #[error("Activity '{0}' not found")]
    ActivityNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteActivityParameters {
    pub activity_id: Uuid,
}

pub fn delete_activity(
    store: &mut Store,
    storage: &impl Storage,
    parameters: DeleteActivityParameters,
) -> Result<Activity, DeleteActivityError> {
    let activity = store
        .remove_activity(parameters.activity_id)
        .ok_or(DeleteActivityError::ActivityNotFound(parameters.activity_id))?;

    storage.save(store)?;

    info!(activity_id = %activity.id(), "deleted activity");
    Ok(activity)
}
