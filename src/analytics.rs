//! Dashboard metrics aggregated over all projects and logged activities.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use jiff::{Timestamp, ToSpan, Zoned};
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    activity::{Activity, ActivityType},
    project::Project,
    task::Task,
};

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    #[default]
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeFrame {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeFrame::Week => "week",
            TimeFrame::Month => "month",
            TimeFrame::Quarter => "quarter",
            TimeFrame::Year => "year",
        }
    }

    /// Week, month and year are calendar-aligned with `now`. Quarter is the
    /// rolling window from three months before `now` up to `now`, inclusive.
    pub fn contains(self, date: Timestamp, now: &Zoned) -> bool {
        let zoned = date.to_zoned(now.time_zone().clone());
        let (day, today) = (zoned.date(), now.date());
        match self {
            TimeFrame::Week => {
                let (week, this_week) = (day.iso_week_date(), today.iso_week_date());
                week.year() == this_week.year() && week.week() == this_week.week()
            }
            TimeFrame::Month => day.year() == today.year() && day.month() == today.month(),
            TimeFrame::Quarter => {
                let start = now
                    .checked_sub(3.months())
                    .map(|z| z.timestamp())
                    .unwrap_or_else(|_| now.timestamp());
                start <= date && date <= now.timestamp()
            }
            TimeFrame::Year => day.year() == today.year(),
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown time frame '{0}' (expected week, month, quarter or year)")]
pub struct UnknownTimeFrame(pub String);

impl FromStr for TimeFrame {
    type Err = UnknownTimeFrame;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "week" => Ok(TimeFrame::Week),
            "month" => Ok(TimeFrame::Month),
            "quarter" => Ok(TimeFrame::Quarter),
            "year" => Ok(TimeFrame::Year),
            _ => Err(UnknownTimeFrame(value.to_string())),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    ActiveProjects,
    TotalHours,
    CompletionRate,
    UrgentTasks,
}

/// Period-over-period change for a metric, as a percentage.
pub trait TrendSource {
    fn trend(&self, metric: Metric) -> Option<f64>;
}

/// Reports no trend for any metric.
pub struct NoTrends;

impl TrendSource for NoTrends {
    fn trend(&self, _metric: Metric) -> Option<f64> {
        None
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub time_frame: TimeFrame,
    pub active_projects_count: usize,
    pub total_hours: f64,
    pub task_completion_rate: f64,
    pub urgent_tasks_count: usize,
    pub hours_per_type: BTreeMap<ActivityType, f64>,
    pub trends: BTreeMap<String, f64>,
}

pub struct ProjectAnalytics<'a> {
    projects: &'a [Project],
    activities: &'a [Activity],
    time_frame: TimeFrame,
    now: Zoned,
}

impl<'a> ProjectAnalytics<'a> {
    pub fn new(projects: &'a [Project], activities: &'a [Activity], time_frame: TimeFrame) -> Self {
        Self::at(projects, activities, time_frame, Zoned::now())
    }

    pub fn at(
        projects: &'a [Project],
        activities: &'a [Activity],
        time_frame: TimeFrame,
        now: Zoned,
    ) -> Self {
        Self {
            projects,
            activities,
            time_frame,
            now,
        }
    }

    fn all_tasks(&self) -> impl Iterator<Item = &'a Task> + 'a {
        self.projects.iter().flat_map(|p| p.tasks().iter())
    }

    fn activities_in_frame(&self) -> impl Iterator<Item = &'a Activity> + '_ {
        self.activities
            .iter()
            .filter(|a| self.is_in_time_frame(a.date()))
    }

    pub fn is_in_time_frame(&self, date: Timestamp) -> bool {
        self.time_frame.contains(date, &self.now)
    }

    /// Projects with at least one task
    pub fn active_projects_count(&self) -> usize {
        self.projects.iter().filter(|p| !p.tasks().is_empty()).count()
    }

    pub fn total_hours(&self) -> f64 {
        self.activities_in_frame().map(Activity::hours_spent).sum()
    }

    pub fn task_completion_rate(&self) -> f64 {
        let (total, completed) = self
            .all_tasks()
            .fold((0usize, 0usize), |(total, completed), task| {
                (total + 1, completed + usize::from(task.is_completed()))
            });
        if total == 0 {
            return 0.0;
        }
        completed as f64 / total as f64 * 100.0
    }

    pub fn urgent_tasks_count(&self) -> usize {
        self.all_tasks().filter(|t| t.is_urgent).count()
    }

    pub fn hours_per_type(&self) -> BTreeMap<ActivityType, f64> {
        let mut hours = BTreeMap::new();
        for activity in self.activities_in_frame() {
            *hours.entry(activity.activity_type()).or_insert(0.0) += activity.hours_spent();
        }
        hours
    }

    pub fn summary(&self) -> AnalyticsSummary {
        self.summary_with(&NoTrends)
    }

    pub fn summary_with(&self, trends: &impl TrendSource) -> AnalyticsSummary {
        let metrics = [
            Metric::ActiveProjects,
            Metric::TotalHours,
            Metric::CompletionRate,
            Metric::UrgentTasks,
        ];
        AnalyticsSummary {
            time_frame: self.time_frame,
            active_projects_count: self.active_projects_count(),
            total_hours: self.total_hours(),
            task_completion_rate: self.task_completion_rate(),
            urgent_tasks_count: self.urgent_tasks_count(),
            hours_per_type: self.hours_per_type(),
            trends: metrics
                .into_iter()
                .filter_map(|m| trends.trend(m).map(|value| (format!("{m:?}"), value)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, tz::TimeZone};
    use uuid::Uuid;

    use super::*;
    use crate::models::{project::ProjectParameters, task::TaskStatus};

    // Sunday evening, the last day of ISO week 25
    fn now() -> Zoned {
        "2026-06-21T20:00:00Z"
            .parse::<Timestamp>()
            .unwrap()
            .to_zoned(TimeZone::UTC)
    }

    fn at(value: &str) -> Timestamp {
        value.parse().unwrap()
    }

    fn activity(project_id: Uuid, date: Timestamp, hours: f64, kind: ActivityType) -> Activity {
        Activity::new(Uuid::new_v4(), project_id, "logged", hours, date, kind).unwrap()
    }

    fn project(tasks: Vec<Task>) -> Project {
        let start = at("2026-01-05T08:00:00Z");
        let mut params =
            ProjectParameters::new("Townhouse row", "4 Quay St", start, at("2026-12-18T17:00:00Z"));
        params.tasks = tasks;
        Project::new(params).unwrap()
    }

    fn task(status: TaskStatus, urgent: bool) -> Task {
        Task {
            status,
            is_urgent: urgent,
            ..Task::new("work", None)
        }
    }

    #[test]
    fn test_week_sums_only_the_last_six_days() {
        let project_id = Uuid::new_v4();
        let now = now();
        let mut activities = Vec::new();
        for days_back in 0..=6 {
            let date = now.timestamp() - SignedDuration::from_hours(days_back * 24);
            activities.push(activity(project_id, date, 2.0, ActivityType::Development));
        }
        // Sunday of the previous ISO week
        activities.push(activity(project_id, at("2026-06-14T10:00:00Z"), 40.0, ActivityType::Testing));

        let analytics = ProjectAnalytics::at(&[], &activities, TimeFrame::Week, now);

        // 0..=6 days back from Sunday 20:00 reaches Monday 20:00
        assert_eq!(analytics.total_hours(), 14.0);
    }

    #[test]
    fn test_month_and_year_are_calendar_aligned() {
        let now = now();
        let june = at("2026-06-01T00:30:00Z");
        let may = at("2026-05-31T23:30:00Z");
        let last_year = at("2025-12-31T12:00:00Z");

        assert!(TimeFrame::Month.contains(june, &now));
        assert!(!TimeFrame::Month.contains(may, &now));
        assert!(TimeFrame::Year.contains(may, &now));
        assert!(!TimeFrame::Year.contains(last_year, &now));
    }

    #[test]
    fn test_quarter_is_a_rolling_window() {
        let now = now();
        assert!(TimeFrame::Quarter.contains(at("2026-03-25T00:00:00Z"), &now));
        assert!(TimeFrame::Quarter.contains(at("2026-03-21T20:00:00Z"), &now));
        assert!(!TimeFrame::Quarter.contains(at("2026-03-10T00:00:00Z"), &now));
        assert!(!TimeFrame::Quarter.contains(at("2026-06-22T00:00:00Z"), &now));
    }

    #[test]
    fn test_task_metrics_ignore_the_time_frame() {
        let projects = vec![
            project(vec![
                task(TaskStatus::Completed, true),
                task(TaskStatus::InProgress, false),
            ]),
            project(vec![
                task(TaskStatus::Completed, false),
                task(TaskStatus::Overdue, true),
            ]),
            project(vec![]),
        ];

        let analytics = ProjectAnalytics::at(&projects, &[], TimeFrame::Week, now());

        assert_eq!(analytics.active_projects_count(), 2);
        assert_eq!(analytics.task_completion_rate(), 50.0);
        assert_eq!(analytics.urgent_tasks_count(), 2);
        assert_eq!(analytics.total_hours(), 0.0);
    }

    #[test]
    fn test_no_tasks_means_zero_completion_rate() {
        let projects = vec![project(vec![])];
        let analytics = ProjectAnalytics::at(&projects, &[], TimeFrame::Year, now());
        assert_eq!(analytics.task_completion_rate(), 0.0);
        assert_eq!(analytics.active_projects_count(), 0);
    }

    struct FixedTrends;

    impl TrendSource for FixedTrends {
        fn trend(&self, metric: Metric) -> Option<f64> {
            match metric {
                Metric::TotalHours => Some(-5.0),
                _ => None,
            }
        }
    }

    #[test]
    fn test_summary_collects_metrics_and_trends() {
        let project = project(vec![task(TaskStatus::Completed, false)]);
        let activities = vec![
            activity(project.id(), at("2026-06-16T09:00:00Z"), 3.5, ActivityType::Meeting),
            activity(project.id(), at("2026-06-17T09:00:00Z"), 1.5, ActivityType::Meeting),
            activity(project.id(), at("2026-06-18T09:00:00Z"), 4.0, ActivityType::Planning),
        ];
        let projects = vec![project];
        let analytics = ProjectAnalytics::at(&projects, &activities, TimeFrame::Week, now());

        let plain = analytics.summary();
        assert!(plain.trends.is_empty());
        assert_eq!(plain.total_hours, 9.0);
        assert_eq!(plain.hours_per_type.get(&ActivityType::Meeting), Some(&5.0));
        assert_eq!(plain.hours_per_type.get(&ActivityType::Planning), Some(&4.0));

        let with_trends = analytics.summary_with(&FixedTrends);
        assert_eq!(with_trends.trends.get("TotalHours"), Some(&-5.0));
        assert_eq!(with_trends.trends.len(), 1);
    }

    #[test]
    fn test_time_frame_parsing() {
        assert_eq!("Quarter".parse::<TimeFrame>().unwrap(), TimeFrame::Quarter);
        assert!("fortnight".parse::<TimeFrame>().is_err());
    }
}
