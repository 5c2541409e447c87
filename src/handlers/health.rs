// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::config::AppState;

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Status da API e do banco")
    )
)]
pub async fn health(State(app_state): State<AppState>) -> impl IntoResponse {
    let db = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&app_state.db_pool)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Falha no ping do banco: {e}");
            "fail"
        }
    };

    Json(json!({ "api": "ok", "db": db }))
}
