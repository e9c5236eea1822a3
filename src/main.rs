use std::io::Read;
use std::path::PathBuf;

use buildplan::{
    analytics::{ProjectAnalytics, TimeFrame},
    dependencies::DependencyGraph,
    models::{store::Store, task::Task},
    report::{ProjectReport, ReportPeriod},
    rollup::TaskFilter,
    services::projects::find_project,
    storage::{Storage, document::DocumentStorage},
};
use clap::{Parser, Subcommand, ValueEnum};
use jiff::{Timestamp, Zoned, tz::TimeZone};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod ui;

#[derive(Parser)]
#[command(
    name = "buildplan",
    about = "Progress, dependency and activity views over a construction project export"
)]
struct Cli {
    /// Export document to read (defaults to stdin)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Pin the current time (RFC 3339, e.g. 2026-06-21T20:00:00Z)
    #[arg(long, global = true)]
    now: Option<Timestamp>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects with status, progress and days remaining
    Projects,

    /// Show task statistics for a project
    Stats {
        /// Project slug, id, or part of its name
        #[arg(short, long)]
        project: String,
    },

    /// List the tasks of a project
    Tasks {
        /// Project slug, id, or part of its name
        #[arg(short, long)]
        project: String,

        /// Which tasks to show
        #[arg(short, long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,

        /// Order prerequisites before the tasks that depend on them
        #[arg(long)]
        dependency_order: bool,
    },

    /// Show metrics across all projects
    Dashboard {
        /// week, month, quarter or year
        #[arg(short, long, default_value_t = TimeFrame::Week)]
        time_frame: TimeFrame,
    },

    /// Show a report for a project
    Report {
        /// Project slug, id, or part of its name
        #[arg(short, long)]
        project: String,

        #[arg(long, value_enum, default_value_t = PeriodArg::Month)]
        period: PeriodArg,

        /// Start of a custom period
        #[arg(long, required_if_eq("period", "custom"))]
        from: Option<Timestamp>,

        /// End of a custom period
        #[arg(long, required_if_eq("period", "custom"))]
        to: Option<Timestamp>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Active,
    Completed,
    Overdue,
}

impl From<FilterArg> for TaskFilter {
    fn from(filter: FilterArg) -> Self {
        match filter {
            FilterArg::All => TaskFilter::All,
            FilterArg::Active => TaskFilter::Active,
            FilterArg::Completed => TaskFilter::Completed,
            FilterArg::Overdue => TaskFilter::Overdue,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
    Quarter,
    Year,
    Custom,
}

fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn read_document(input: Option<PathBuf>) -> std::io::Result<Vec<u8>> {
    match input {
        Some(path) => std::fs::read(path),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let now = match cli.now {
        Some(timestamp) => timestamp.to_zoned(TimeZone::system()),
        None => Zoned::now(),
    };

    let document = read_document(cli.input)
        .unwrap_or_else(|e| exit_with(format!("Failed to read export document: {}", e)));

    let storage = DocumentStorage::new(document);
    let store = match storage.load() {
        Ok(store) => store,
        Err(e) => exit_with(e),
    };

    match cli.command {
        Commands::Projects => ui::render_projects(&store.projects, &now),
        Commands::Stats { project } => {
            let project = find_project(&store, &project).unwrap_or_else(|e| exit_with(e));
            ui::render_stats(project, &now);
        }
        Commands::Tasks {
            project,
            filter,
            dependency_order,
        } => {
            let project = find_project(&store, &project).unwrap_or_else(|e| exit_with(e));
            let visible = TaskFilter::from(filter).apply(project.tasks(), now.timestamp());

            if visible.is_empty() {
                println!("No tasks");
                return;
            }
            ui::render_view_header(project.name(), visible.len(), "task");

            if dependency_order {
                let graph = DependencyGraph::build(project.tasks());
                let Some(order) = graph.topological_order() else {
                    let cycle = graph.find_cycle().unwrap_or_default();
                    let titles: Vec<&str> = cycle
                        .iter()
                        .filter_map(|id| project.get_task(*id))
                        .map(|t| t.title.as_str())
                        .collect();
                    exit_with(format!(
                        "Tasks depend on each other in a cycle: {}",
                        titles.join(", ")
                    ));
                };
                let ordered: Vec<&Task> = order
                    .iter()
                    .filter_map(|id| visible.iter().find(|t| t.id == *id).copied())
                    .collect();
                ui::render_task_list(&ordered, &now);
            } else {
                ui::render_task_tree(project.tasks(), &visible, &now);
            }
            println!();
        }
        Commands::Dashboard { time_frame } => {
            let Store {
                projects,
                activities,
            } = &store;
            let analytics = ProjectAnalytics::at(projects, activities, time_frame, now.clone());
            ui::render_dashboard(&analytics.summary());
        }
        Commands::Report {
            project,
            period,
            from,
            to,
        } => {
            let project = find_project(&store, &project).unwrap_or_else(|e| exit_with(e));
            let period = match (period, from, to) {
                (PeriodArg::Week, _, _) => ReportPeriod::Week,
                (PeriodArg::Month, _, _) => ReportPeriod::Month,
                (PeriodArg::Quarter, _, _) => ReportPeriod::Quarter,
                (PeriodArg::Year, _, _) => ReportPeriod::Year,
                (PeriodArg::Custom, Some(from), Some(to)) if from <= to => {
                    ReportPeriod::Custom { from, to }
                }
                (PeriodArg::Custom, Some(_), Some(_)) => exit_with("--from must not be after --to"),
                (PeriodArg::Custom, _, _) => exit_with("A custom period needs --from and --to"),
            };
            let report = ProjectReport::for_project(project, &store.activities, period, &now);
            ui::render_report(&report, &now);
        }
    }
}
