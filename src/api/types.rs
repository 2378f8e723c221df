//! Shared request context.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;

/// Shared state handed to every handler. The mutex serializes statement
/// execution over the single SQLite connection; handlers hold the guard
/// only for the duration of one operation.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
}

impl ApiContext {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}
