//! Explicit schema initialization.
//!
//! Migrations already run at startup; this endpoint re-runs them (a no-op
//! on an up-to-date database) and reports the resulting version, so
//! clients can verify the store is ready.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::sqlite;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub initialized: bool,
    pub schema_version: i64,
}

/// POST /api/init
pub async fn run(State(ctx): State<ApiContext>) -> Result<Json<InitResponse>, ApiError> {
    let conn = ctx.lock()?;
    sqlite::run_migrations(&conn)?;
    Ok(Json(InitResponse {
        initialized: true,
        schema_version: sqlite::schema_version(&conn),
    }))
}
