pub mod activities;
pub mod projects;
pub mod tasks;
