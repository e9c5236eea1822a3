use std::collections::BTreeMap;

use jiff::{Timestamp, Zoned};
use serde::Serialize;

use crate::analytics::TimeFrame;
use crate::models::{
    activity::{Activity, ActivityType},
    project::Project,
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportPeriod {
    Week,
    Month,
    Quarter,
    Year,
    Custom { from: Timestamp, to: Timestamp },
}

impl ReportPeriod {
    pub fn title(&self) -> &'static str {
        match self {
            ReportPeriod::Week => "Weekly Report",
            ReportPeriod::Month => "Monthly Report",
            ReportPeriod::Quarter => "Quarterly Report",
            ReportPeriod::Year => "Yearly Report",
            ReportPeriod::Custom { .. } => "Custom Period Report",
        }
    }

    /// Custom ranges are inclusive on both ends. The named periods follow
    /// the dashboard time frames.
    pub fn contains(&self, date: Timestamp, now: &Zoned) -> bool {
        match *self {
            ReportPeriod::Week => TimeFrame::Week.contains(date, now),
            ReportPeriod::Month => TimeFrame::Month.contains(date, now),
            ReportPeriod::Quarter => TimeFrame::Quarter.contains(date, now),
            ReportPeriod::Year => TimeFrame::Year.contains(date, now),
            ReportPeriod::Custom { from, to } => from <= date && date <= to,
        }
    }
}

impl From<TimeFrame> for ReportPeriod {
    fn from(time_frame: TimeFrame) -> Self {
        match time_frame {
            TimeFrame::Week => ReportPeriod::Week,
            TimeFrame::Month => ReportPeriod::Month,
            TimeFrame::Quarter => ReportPeriod::Quarter,
            TimeFrame::Year => ReportPeriod::Year,
        }
    }
}

/// Read-only values for a project report. `activities` are taken as given;
/// use [`ProjectReport::for_project`] to select them from a larger list.
pub struct ProjectReport<'a> {
    pub project: &'a Project,
    pub activities: Vec<&'a Activity>,
    pub period: ReportPeriod,
}

impl<'a> ProjectReport<'a> {
    pub fn new(project: &'a Project, activities: Vec<&'a Activity>, period: ReportPeriod) -> Self {
        Self {
            project,
            activities,
            period,
        }
    }

    /// Keeps the activities logged against `project` inside `period`.
    pub fn for_project(
        project: &'a Project,
        all_activities: &'a [Activity],
        period: ReportPeriod,
        now: &Zoned,
    ) -> Self {
        let activities = all_activities
            .iter()
            .filter(|a| a.project_id() == project.id() && period.contains(a.date(), now))
            .collect();
        Self::new(project, activities, period)
    }

    pub fn total_hours(&self) -> f64 {
        self.activities.iter().map(|a| a.hours_spent()).sum()
    }

    pub fn hours_per_type(&self) -> BTreeMap<ActivityType, f64> {
        let mut hours = BTreeMap::new();
        for activity in &self.activities {
            *hours.entry(activity.activity_type()).or_insert(0.0) += activity.hours_spent();
        }
        hours
    }

    pub fn completed_tasks_count(&self) -> usize {
        self.project.tasks().iter().filter(|t| t.is_completed()).count()
    }

    pub fn task_completion_rate(&self) -> f64 {
        let total = self.project.tasks().len();
        if total == 0 {
            return 0.0;
        }
        self.completed_tasks_count() as f64 / total as f64 * 100.0
    }
}
