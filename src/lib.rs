/// Nilai Dashboard - admin REST API for student grades
///
/// Student records, per-session grades, role-gated admin accounts and an
/// activity log, served over axum and stored in SQLite.
pub mod admin;
pub mod api;
pub mod auth;
pub mod backup;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod grade;
pub mod jobs;
pub mod server;
pub mod student;
pub mod validation;

pub use context::AppContext;
pub use error::{AppError, AppResult};
