use uuid::Uuid;

use crate::models::{activity::Activity, project::Project, task::Task};

/// In-memory record set handed between the record store and the core.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Store {
    pub projects: Vec<Project>,
    pub activities: Vec<Activity>,
}

impl Store {
    pub fn get_project(&self, project_id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id() == project_id)
    }

    pub fn get_project_mut(&mut self, project_id: Uuid) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id() == project_id)
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.push(project);
    }

    pub fn remove_project(&mut self, project_id: Uuid) -> Option<Project> {
        let index = self.projects.iter().position(|p| p.id() == project_id)?;
        Some(self.projects.remove(index))
    }

    /// Finds a task across all projects.
    pub fn get_task(&self, task_id: Uuid) -> Option<(&Project, &Task)> {
        self.projects
            .iter()
            .find_map(|p| p.get_task(task_id).map(|t| (p, t)))
    }

    pub fn get_activity(&self, activity_id: Uuid) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id() == activity_id)
    }

    pub fn add_activity(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    pub fn remove_activity(&mut self, activity_id: Uuid) -> Option<Activity> {
        let index = self.activities.iter().position(|a| a.id() == activity_id)?;
        Some(self.activities.remove(index))
    }

    pub fn get_activities_for_project(
        &self,
        project_id: Uuid,
    ) -> impl Iterator<Item = &Activity> + '_ {
        self.activities
            .iter()
            .filter(move |a| a.project_id() == project_id)
    }
}
