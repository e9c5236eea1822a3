//! Planning core for construction projects: projects and their tasks, task
//! dependency validation, progress rollup, activity analytics and reports,
//! and the export document used to move data in and out.

pub mod analytics;
pub mod dependencies;
pub mod models;
pub mod report;
pub mod rollup;
pub mod services;
pub mod storage;
pub mod transfer;
