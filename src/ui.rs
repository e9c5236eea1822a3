use std::collections::BTreeMap;

use colored::*;
use jiff::{Timestamp, Zoned};

use buildplan::{
    analytics::AnalyticsSummary,
    dependencies,
    models::{
        activity::ActivityType,
        project::{Project, ProjectStatus},
        task::{Task, TaskHierarchy, TaskStatus},
    },
    report::ProjectReport,
    rollup::{self, TaskSummary},
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Print `left` with `right` pushed against the right edge of the terminal.
/// `left_visible_len` is the length of `left` without ANSI codes.
fn print_aligned(left: ColoredString, left_visible_len: usize, right: &str) {
    let terminal_width = get_terminal_width();
    let right_visible_len = right.chars().count();
    let total_content = left_visible_len + right_visible_len;

    if !right.is_empty() && total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", left, " ".repeat(padding), right.dimmed());
    } else if right.is_empty() {
        println!("{}", left);
    } else {
        // Not enough space for right alignment
        println!("{}  {}", left, right.dimmed());
    }
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize, noun: &str) {
    let noun = if count == 1 {
        noun.to_string()
    } else {
        format!("{}s", noun)
    };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, noun);
}

/// Render a section header (e.g., "Hours per type")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

fn colored_project_status(status: ProjectStatus) -> ColoredString {
    match status {
        ProjectStatus::Planning => status.as_str().blue(),
        ProjectStatus::InProgress => status.as_str().yellow(),
        ProjectStatus::OnHold => status.as_str().magenta(),
        ProjectStatus::Completed => status.as_str().green(),
    }
}

fn colored_task_status(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::InProgress => status.as_str().yellow(),
        TaskStatus::Completed => status.as_str().green(),
        TaskStatus::Overdue => status.as_str().red(),
    }
}

/// "12 days left", "due today" or "3 days overdue"
pub fn format_days_remaining(days: i64) -> String {
    match days {
        0 => "due today".to_string(),
        1 => "1 day left".to_string(),
        -1 => "1 day overdue".to_string(),
        d if d > 0 => format!("{} days left", d),
        d => format!("{} days overdue", -d),
    }
}

/// Hours with at most one decimal, e.g. "12.5h"
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{:.0}h", hours)
    } else {
        format!("{:.1}h", hours)
    }
}

fn format_date(timestamp: Timestamp, now: &Zoned) -> String {
    timestamp
        .to_zoned(now.time_zone().clone())
        .strftime("%b %d, %Y")
        .to_string()
}

/// A text progress bar, e.g. "[######----]"
fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Render one project with status, progress and the time left
pub fn render_project_line(project: &Project, now: &Zoned) {
    let overdue = rollup::is_overdue_at(project, now.timestamp());
    let glyph = if project.is_completed() {
        "✓".dimmed()
    } else if overdue {
        "●".red()
    } else if project.is_urgent() {
        "!".yellow()
    } else {
        "○".normal()
    };

    let left_plain = format!("  {}  {}", " ", project.name());
    let left = format!("  {}  {}", glyph, project.name().bold());

    let right = format!(
        "{}  ·  {:.0}%  ·  {}",
        project.status(),
        project.progress_percentage(),
        format_days_remaining(rollup::days_remaining_at(project, now))
    );
    print_aligned(left.normal(), left_plain.chars().count(), &right);
}

/// Render the project list
pub fn render_projects(projects: &[Project], now: &Zoned) {
    if projects.is_empty() {
        println!("No projects");
        return;
    }
    render_view_header("Projects", projects.len(), "project");
    for project in projects {
        render_project_line(project, now);
    }
    println!();
}

/// Render a single task line with glyph, title, and right-aligned due date
pub fn render_task_line(task: &Task, depth: usize, now: &Zoned) {
    let is_overdue = !task.is_completed() && task.due_date < now.timestamp();
    let glyph = if task.is_completed() {
        "✓".dimmed()
    } else if is_overdue {
        "●".red()
    } else {
        "○".normal()
    };

    let indent = "  ".repeat(depth);
    let urgent = if task.is_urgent { " !" } else { "" };
    let left_plain = format!("  {}{}  {}{}", indent, " ", task.title, urgent);
    let left_section = format!("  {}{}  {}{}", indent, glyph, task.title, urgent);
    let styled_left = if task.is_completed() {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    let right = format!("{}  ·  {}", task.priority.label(), format_date(task.due_date, now));
    print_aligned(styled_left, left_plain.chars().count(), &right);
}

/// Render tasks nested under their parents. Only tasks in `visible` are
/// printed, children of a hidden parent are not shown.
pub fn render_task_tree(tasks: &[Task], visible: &[&Task], now: &Zoned) {
    let hierarchy = TaskHierarchy::build(tasks);
    let by_id: BTreeMap<_, _> = visible.iter().map(|t| (t.id, *t)).collect();

    fn walk(
        ids: &[uuid::Uuid],
        depth: usize,
        hierarchy: &TaskHierarchy,
        by_id: &BTreeMap<uuid::Uuid, &Task>,
        now: &Zoned,
    ) {
        for id in ids {
            if let Some(task) = by_id.get(id) {
                render_task_line(task, depth, now);
                walk(hierarchy.children_of(*id), depth + 1, hierarchy, by_id, now);
            }
        }
    }

    walk(hierarchy.roots(), 0, &hierarchy, &by_id, now);
}

/// Render tasks in the given order without nesting
pub fn render_task_list(tasks: &[&Task], now: &Zoned) {
    for task in tasks {
        render_task_line(task, 0, now);
    }
}

/// Render the statistics view of a project
pub fn render_stats(project: &Project, now: &Zoned) {
    let summary = TaskSummary::from_tasks(project.tasks());
    render_view_header(project.name(), summary.total, "task");

    println!("  Address      {}", project.address());
    println!("  Type         {}", project.project_type().as_str());
    println!("  Status       {}", colored_project_status(project.status()));
    println!(
        "  Schedule     {} → {}",
        format_date(project.start_date(), now),
        format_date(project.due_date(), now)
    );
    println!(
        "  Progress     {} {:.0}%",
        progress_bar(project.progress_percentage(), 20),
        project.progress_percentage()
    );
    let days = format_days_remaining(rollup::days_remaining_at(project, now));
    if rollup::is_overdue_at(project, now.timestamp()) {
        println!("  Due          {}", days.red());
    } else {
        println!("  Due          {}", days);
    }

    render_section_header("Tasks by status");
    let stats = rollup::task_stats(project);
    for status in TaskStatus::ALL {
        if let Some(count) = stats.get(&status) {
            println!("  {:<14}{}", colored_task_status(status), count);
        }
    }
    if stats.is_empty() {
        println!("  {}", "No tasks".dimmed());
    }

    render_section_header("Summary");
    println!("  Completion   {:.1}%", summary.completion_percentage);
    println!("  Urgent       {}", summary.urgent);
    println!(
        "  Past due     {}",
        rollup::overdue_tasks_count_at(project, now.timestamp())
    );

    let dependency_state = if project.validate_dependencies() {
        "valid".green()
    } else {
        "cycle detected".red()
    };
    println!("  Dependencies {}", dependency_state);
    let unresolved = dependencies::unresolved_dependencies(project.tasks());
    if !unresolved.is_empty() {
        println!(
            "  {}",
            format!("{} dependency reference(s) to unknown tasks", unresolved.len()).dimmed()
        );
    }
    println!();
}

fn render_hours_per_type(hours: &BTreeMap<ActivityType, f64>) {
    render_section_header("Hours per type");
    if hours.is_empty() {
        println!("  {}", "No activity logged".dimmed());
        return;
    }
    for (activity_type, hours) in hours {
        println!("  {:<14}{}", activity_type.as_str(), format_hours(*hours));
    }
}

fn format_trend(trend: Option<&f64>) -> String {
    match trend {
        Some(value) if *value >= 0.0 => format!("  ↑ {:.1}%", value).green().to_string(),
        Some(value) => format!("  ↓ {:.1}%", -value).red().to_string(),
        None => String::new(),
    }
}

/// Render the dashboard metrics
pub fn render_dashboard(summary: &AnalyticsSummary) {
    println!(
        "\n  {} ({})\n",
        "Dashboard".cyan().bold(),
        summary.time_frame
    );
    println!(
        "  Active projects   {}{}",
        summary.active_projects_count,
        format_trend(summary.trends.get("ActiveProjects"))
    );
    println!(
        "  Hours logged      {}{}",
        format_hours(summary.total_hours),
        format_trend(summary.trends.get("TotalHours"))
    );
    println!(
        "  Task completion   {:.1}%{}",
        summary.task_completion_rate,
        format_trend(summary.trends.get("CompletionRate"))
    );
    println!(
        "  Urgent tasks      {}{}",
        summary.urgent_tasks_count,
        format_trend(summary.trends.get("UrgentTasks"))
    );
    render_hours_per_type(&summary.hours_per_type);
    println!();
}

/// Render a project report
pub fn render_report(report: &ProjectReport<'_>, now: &Zoned) {
    println!(
        "\n  {} · {}\n",
        report.period.title().cyan().bold(),
        report.project.name().bold()
    );
    println!("  Generated         {}", format_date(now.timestamp(), now));
    println!("  Activities        {}", report.activities.len());
    println!("  Hours logged      {}", format_hours(report.total_hours()));
    println!(
        "  Tasks completed   {} of {}",
        report.completed_tasks_count(),
        report.project.tasks().len()
    );
    println!("  Completion rate   {:.1}%", report.task_completion_rate());
    render_hours_per_type(&report.hours_per_type());
    println!();
}
