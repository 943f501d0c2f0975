//! Shared state for the API layer.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db::sqlite::open_database;
use crate::jobs::queue::ProcessingTrigger;

/// Shared context for all API routes.
///
/// Handlers open a connection per request; SQLite connections are not
/// shared across threads. The trigger is called explicitly by write
/// endpoints; document creation is the event that enqueues processing.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: PathBuf,
    pub trigger: Arc<dyn ProcessingTrigger>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, trigger: Arc<dyn ProcessingTrigger>) -> Self {
        Self { db_path, trigger }
    }

    pub fn open_db(&self) -> Result<Connection, ApiError> {
        open_database(&self.db_path).map_err(|e| ApiError::Internal(e.to_string()))
    }
}
