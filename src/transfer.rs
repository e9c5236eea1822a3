//! Export/import document exchanged with backup and sharing collaborators.
//!
//! Field names are camelCase and dates are seconds relative to
//! 2001-01-01T00:00:00Z, so documents written by the original mobile app
//! decode unchanged.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::{
    activity::{Activity, ActivityType},
    project::{Project, ProjectParameters, ProjectStatus, ProjectType, ProjectValidationError},
    task::{Priority, Task, TaskStatus},
};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to encode export document: {0}")]
    EncodingFailed(#[source] serde_json::Error),

    #[error("Failed to decode export document: {0}")]
    DecodingFailed(#[from] DecodeFailure),

    #[error("Invalid data in export document: {0}")]
    InvalidData(String),
}

#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error(transparent)]
    Malformed(#[from] serde_json::Error),

    #[error("project '{project_id}' was rejected: {source}")]
    RejectedProject {
        project_id: Uuid,
        #[source]
        source: ProjectValidationError,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExport {
    pub projects: Vec<ProjectData>,
    pub activities: Vec<ActivityData>,
    #[serde(with = "reference_date")]
    pub export_date: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub id: Uuid,
    pub name: String,
    pub progress_percentage: f64,
    pub is_urgent: bool,
    pub tasks: Vec<TaskData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "reference_date::option")]
    pub start_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "reference_date::option")]
    pub due_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskData {
    pub id: Uuid,
    pub title: String,
    #[serde(with = "reference_date")]
    pub due_date: Timestamp,
    pub status: String,
    pub is_urgent: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityData {
    pub id: Uuid,
    pub project_id: Uuid,
    pub description: String,
    pub hours_spent: f64,
    #[serde(with = "reference_date")]
    pub date: Timestamp,
    #[serde(rename = "type")]
    pub activity_type: String,
}

impl ProjectExport {
    pub fn create(projects: &[Project], activities: &[Activity], export_date: Timestamp) -> Self {
        Self {
            projects: projects.iter().map(ProjectData::from_project).collect(),
            activities: activities.iter().map(ActivityData::from_activity).collect(),
            export_date,
        }
    }
}

impl ProjectData {
    fn from_project(project: &Project) -> Self {
        Self {
            id: project.id(),
            name: project.name().to_string(),
            progress_percentage: project.progress_percentage(),
            is_urgent: project.is_urgent(),
            tasks: project
                .tasks()
                .iter()
                .map(|task| TaskData {
                    id: task.id,
                    title: task.title.clone(),
                    due_date: task.due_date,
                    status: task.status.as_str().to_string(),
                    is_urgent: task.is_urgent,
                })
                .collect(),
            description: Some(project.description().to_string()),
            address: Some(project.address().to_string()),
            project_type: Some(project.project_type()),
            start_date: Some(project.start_date()),
            due_date: Some(project.due_date()),
            status: Some(project.status()),
        }
    }

    /// Rebuilds the project through its validating constructor. Fields the
    /// document leaves out get the constructor defaults.
    fn into_project(self) -> Result<Project, DecodeFailure> {
        let project_id = self.id;
        let mut parameters = ProjectParameters::starting_now(self.name, self.address.unwrap_or_default());
        parameters.id = project_id;
        parameters.description = self.description.unwrap_or_default();
        parameters.project_type = self.project_type.unwrap_or_default();
        if let Some(start_date) = self.start_date {
            parameters.start_date = start_date;
        }
        if let Some(due_date) = self.due_date {
            parameters.due_date = due_date;
        }
        parameters.progress_percentage = self.progress_percentage;
        parameters.is_urgent = self.is_urgent;
        parameters.status = self.status.unwrap_or_default();
        parameters.tasks = self
            .tasks
            .into_iter()
            .map(|data| data.into_task(project_id))
            .collect();

        Project::new(parameters)
            .map_err(|source| DecodeFailure::RejectedProject { project_id, source })
    }
}

impl TaskData {
    fn into_task(self, project_id: Uuid) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: String::new(),
            due_date: self.due_date,
            priority: Priority::default(),
            status: self.status.parse().unwrap_or(TaskStatus::InProgress),
            is_urgent: self.is_urgent,
            dependencies: Default::default(),
            project_id: Some(project_id),
            parent_task_id: None,
            assigned_members: Default::default(),
            order: 0,
        }
    }
}

impl ActivityData {
    fn from_activity(activity: &Activity) -> Self {
        Self {
            id: activity.id(),
            project_id: activity.project_id(),
            description: activity.description().to_string(),
            hours_spent: activity.hours_spent(),
            date: activity.date(),
            activity_type: activity.activity_type().as_str().to_string(),
        }
    }

    fn into_activity(self) -> Result<Activity, TransferError> {
        let activity_type = self.activity_type.parse().unwrap_or(ActivityType::Other);
        Activity::new(
            self.id,
            self.project_id,
            self.description,
            self.hours_spent,
            self.date,
            activity_type,
        )
        .map_err(|err| TransferError::InvalidData(format!("activity '{}': {}", self.id, err)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedData {
    pub projects: Vec<Project>,
    pub activities: Vec<Activity>,
    pub export_date: Timestamp,
}

pub fn export_data(projects: &[Project], activities: &[Activity]) -> Result<Vec<u8>, TransferError> {
    export_data_at(projects, activities, Timestamp::now())
}

pub fn export_data_at(
    projects: &[Project],
    activities: &[Activity],
    export_date: Timestamp,
) -> Result<Vec<u8>, TransferError> {
    let export = ProjectExport::create(projects, activities, export_date);
    serde_json::to_vec_pretty(&export).map_err(TransferError::EncodingFailed)
}

/// Decodes a document and rebuilds every entity. Nothing is returned unless
/// every project and activity is valid.
pub fn import_data(data: &[u8]) -> Result<ImportedData, TransferError> {
    let result = decode(data);
    if let Err(err) = &result {
        warn!(error = %err, "rejected export document");
    }
    result
}

fn decode(data: &[u8]) -> Result<ImportedData, TransferError> {
    let export: ProjectExport = serde_json::from_slice(data).map_err(DecodeFailure::from)?;

    let projects = export
        .projects
        .into_iter()
        .map(ProjectData::into_project)
        .collect::<Result<Vec<_>, _>>()?;

    let activities = export
        .activities
        .into_iter()
        .map(ActivityData::into_activity)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ImportedData {
        projects,
        activities,
        export_date: export.export_date,
    })
}

/// Dates as floating point seconds since 2001-01-01T00:00:00Z.
mod reference_date {
    use jiff::Timestamp;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

    const REFERENCE_UNIX_SECONDS: i128 = 978_307_200;
    const NANOS_PER_SECOND: i128 = 1_000_000_000;

    pub fn to_seconds(timestamp: &Timestamp) -> f64 {
        let nanos = timestamp.as_nanosecond() - REFERENCE_UNIX_SECONDS * NANOS_PER_SECOND;
        nanos as f64 / NANOS_PER_SECOND as f64
    }

    pub fn from_seconds(seconds: f64) -> Result<Timestamp, String> {
        if !seconds.is_finite() {
            return Err(format!("date {seconds} is not a finite number"));
        }
        // `as` saturates, so the sum below is the only place that can overflow
        let nanos = (seconds * NANOS_PER_SECOND as f64).round() as i128;
        let unix_nanos = nanos
            .checked_add(REFERENCE_UNIX_SECONDS * NANOS_PER_SECOND)
            .ok_or_else(|| format!("date {seconds} is out of range"))?;
        Timestamp::from_nanosecond(unix_nanos).map_err(|err| err.to_string())
    }

    pub fn serialize<S>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_seconds(timestamp).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        from_seconds(seconds).map_err(D::Error::custom)
    }

    pub mod option {
        use jiff::Timestamp;
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S>(timestamp: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match timestamp {
                Some(timestamp) => serializer.serialize_some(&super::to_seconds(timestamp)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<f64>::deserialize(deserializer)?
                .map(super::from_seconds)
                .transpose()
                .map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use serde_json::{Value, json};

    use super::*;

    fn at(value: &str) -> Timestamp {
        value.parse().unwrap()
    }

    fn sample() -> (Vec<Project>, Vec<Activity>) {
        let mut params = ProjectParameters::new(
            "Office Renovation",
            "123 Main St",
            at("2026-04-01T08:00:00Z"),
            at("2026-05-31T17:00:00Z"),
        );
        params.project_type = ProjectType::Commercial;
        params.is_urgent = true;
        let mut project = Project::new(params).unwrap();
        project.add_task(Task {
            due_date: at("2026-04-10T17:00:00Z"),
            status: TaskStatus::Completed,
            ..Task::new("Strip out", Some(project.id()))
        });
        project.add_task(Task {
            due_date: at("2026-04-20T17:00:00Z"),
            is_urgent: true,
            ..Task::new("Rewire", Some(project.id()))
        });

        let activity = Activity::new(
            Uuid::new_v4(),
            project.id(),
            "Electrician walkthrough",
            2.5,
            at("2026-04-02T10:00:00Z"),
            ActivityType::Meeting,
        )
        .unwrap();

        (vec![project], vec![activity])
    }

    #[test]
    fn test_document_shape() {
        let (projects, activities) = sample();
        let bytes = export_data_at(&projects, &activities, at("2001-01-02T00:00:00Z")).unwrap();
        let document: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(document["exportDate"], json!(86400.0));
        let project = &document["projects"][0];
        assert_eq!(project["name"], "Office Renovation");
        assert_eq!(project["progressPercentage"], json!(50.0));
        assert_eq!(project["isUrgent"], json!(true));
        assert_eq!(project["tasks"][0]["status"], "Completed");
        assert_eq!(project["tasks"][1]["status"], "In Progress");
        assert!(project["tasks"][0]["dueDate"].is_f64());
        let activity = &document["activities"][0];
        assert_eq!(activity["type"], "Meeting");
        assert_eq!(activity["hoursSpent"], json!(2.5));
        assert_eq!(activity["projectId"], json!(projects[0].id()));
    }

    #[test]
    fn test_round_trip_rebuilds_entities() {
        let (projects, activities) = sample();
        let bytes = export_data_at(&projects, &activities, at("2026-04-03T00:00:00Z")).unwrap();

        let imported = import_data(&bytes).unwrap();

        assert_eq!(imported.export_date, at("2026-04-03T00:00:00Z"));
        assert_eq!(imported.activities, activities);
        let project = &imported.projects[0];
        assert_eq!(project.id(), projects[0].id());
        assert_eq!(project.address(), "123 Main St");
        assert_eq!(project.project_type(), ProjectType::Commercial);
        assert_eq!(project.due_date(), projects[0].due_date());
        assert_eq!(project.progress_percentage(), 50.0);
        assert_eq!(project.status(), ProjectStatus::InProgress);
        assert_eq!(project.tasks().len(), 2);
        assert_eq!(project.tasks()[0].status, TaskStatus::Completed);
        assert_eq!(project.tasks()[1].due_date, at("2026-04-20T17:00:00Z"));
        assert_eq!(project.tasks()[1].project_id, Some(project.id()));
    }

    #[test]
    fn test_document_without_address_is_rejected() {
        let document = json!({
            "projects": [{
                "id": Uuid::new_v4(),
                "name": "Legacy",
                "progressPercentage": 0.0,
                "isUrgent": false,
                "tasks": []
            }],
            "activities": [],
            "exportDate": 0.0
        });

        let result = import_data(document.to_string().as_bytes());

        match result {
            Err(TransferError::DecodingFailed(DecodeFailure::RejectedProject { source, .. })) => {
                assert_eq!(source, ProjectValidationError::EmptyAddress);
            }
            other => panic!("Expected RejectedProject, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_labels_fall_back() {
        let project_id = Uuid::new_v4();
        let document = json!({
            "projects": [{
                "id": project_id,
                "name": "Legacy",
                "address": "9 Hill St",
                "progressPercentage": 0.0,
                "isUrgent": false,
                "tasks": [{
                    "id": Uuid::new_v4(),
                    "title": "Old task",
                    "dueDate": 700000000.0,
                    "status": "Blocked",
                    "isUrgent": false
                }]
            }],
            "activities": [{
                "id": Uuid::new_v4(),
                "projectId": project_id,
                "description": "",
                "hoursSpent": 1.0,
                "date": 700000000.0,
                "type": "Lunch"
            }],
            "exportDate": 700000000.0
        });

        let imported = import_data(document.to_string().as_bytes()).unwrap();

        assert_eq!(imported.projects[0].tasks()[0].status, TaskStatus::InProgress);
        assert_eq!(imported.activities[0].activity_type(), ActivityType::Other);
        let start = imported.projects[0].start_date();
        assert_eq!(
            imported.projects[0].due_date().duration_since(start),
            SignedDuration::from_hours(30 * 24)
        );
    }

    #[test]
    fn test_malformed_document_fails_to_decode() {
        let result = import_data(b"{ \"projects\": 3 }");
        assert!(matches!(
            result,
            Err(TransferError::DecodingFailed(DecodeFailure::Malformed(_)))
        ));
    }

    #[test]
    fn test_one_bad_activity_fails_the_whole_import() {
        let (projects, activities) = sample();
        let bytes = export_data_at(&projects, &activities, at("2026-04-03T00:00:00Z")).unwrap();
        let mut document: Value = serde_json::from_slice(&bytes).unwrap();
        document["activities"][0]["hoursSpent"] = json!(-4.0);

        let result = import_data(document.to_string().as_bytes());

        assert!(matches!(result, Err(TransferError::InvalidData(_))));
    }

    #[test]
    fn test_reference_date_conversion() {
        assert_eq!(reference_date::from_seconds(0.0).unwrap(), at("2001-01-01T00:00:00Z"));
        assert_eq!(reference_date::to_seconds(&at("2000-12-31T23:59:30Z")), -30.0);
        assert!(reference_date::from_seconds(f64::NAN).is_err());
        assert!(reference_date::from_seconds(1e30).is_err());
        assert!(reference_date::from_seconds(-1e30).is_err());
    }

    #[test]
    fn test_out_of_range_date_fails_to_decode() {
        let result = import_data(br#"{"projects":[],"activities":[],"exportDate":1e30}"#);
        assert!(matches!(
            result,
            Err(TransferError::DecodingFailed(DecodeFailure::Malformed(_)))
        ));
    }
}
