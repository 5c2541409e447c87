// src/handlers/historico.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::historico::{HistoricoServico, ServicoStatus, ServicoTipo},
};

/// Entrada para registrar um serviço executado / agendado para o lead.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HistoricoIn {
    pub servico: ServicoTipo,

    #[schema(value_type = String, format = DateTime, example = "2026-09-01T14:00:00Z")]
    pub data_servico: DateTime<Utc>,

    #[serde(default)]
    pub status: ServicoStatus,

    #[schema(value_type = Option<f64>, example = 350.0)]
    pub ticket: Option<Decimal>,

    pub observacoes: Option<String>,
}

// POST /api/leads/{id}/historico
#[utoipa::path(
    post,
    path = "/api/leads/{id}/historico",
    tag = "Histórico",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = HistoricoIn,
    responses(
        (status = 201, description = "Registro de serviço criado", body = HistoricoServico),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn create_historico(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HistoricoIn>,
) -> Result<impl IntoResponse, AppError> {
    let registro = app_state
        .lead_service
        .add_historico(
            id,
            payload.servico,
            payload.data_servico,
            payload.status,
            payload.ticket,
            payload.observacoes.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(registro)))
}

// GET /api/leads/{id}/historico
#[utoipa::path(
    get,
    path = "/api/leads/{id}/historico",
    tag = "Histórico",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Histórico de serviços, mais recentes primeiro", body = Vec<HistoricoServico>),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn list_historico(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let registros = app_state.lead_service.list_historico(id).await?;
    Ok((StatusCode::OK, Json(registros)))
}
