pub mod activity;
pub mod project;
pub mod store;
pub mod task;

pub use activity::{Activity, ActivityType, ActivityValidationError};
pub use project::{
    Project, ProjectError, ProjectParameters, ProjectStatus, ProjectType, ProjectValidationError,
};
pub use store::Store;
pub use task::{Priority, Task, TaskHierarchy, TaskStatus};
