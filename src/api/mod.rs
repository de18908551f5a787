/// API routes and handlers
pub mod admins;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod middleware;
pub mod nilai;
pub mod users;

use crate::context::AppContext;
use axum::Router;
use serde::{Deserialize, Serialize};

/// Acknowledgement body for mutations that do not echo a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Build API routes, all served under `/api`
pub fn routes() -> Router<AppContext> {
    let api = Router::new()
        .merge(auth::routes())
        .merge(admins::routes())
        .merge(dashboard::routes())
        .merge(users::routes())
        .merge(nilai::routes());

    Router::new().nest("/api", api).merge(health::routes())
}
