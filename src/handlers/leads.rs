// src/handlers/leads.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        event::LeadEvent,
        lead::{Lead, LeadEtapa, LeadIn, LeadOrigem, LeadOut, UpdateLeadPayload},
    },
};

// =============================================================================
//  WEBHOOK DE LEAD (entrada principal de dados)
// =============================================================================

// POST /api/webhooks/lead
#[utoipa::path(
    post,
    path = "/api/webhooks/lead",
    tag = "Leads",
    request_body = LeadIn,
    responses(
        (status = 200, description = "Lead criado ou atualizado, com score calculado", body = LeadOut),
        (status = 422, description = "Sem email e sem telefone, ou dados inválidos")
    )
)]
pub async fn webhook_lead(
    State(app_state): State<AppState>,
    Json(payload): Json<LeadIn>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let out = app_state
        .lead_service
        .ingest_webhook(&app_state.db_pool, payload)
        .await?;

    Ok((StatusCode::OK, Json(out)))
}

// =============================================================================
//  LISTAGEM E DETALHE
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListLeadsQuery {
    pub origem: Option<LeadOrigem>,
    pub etapa: Option<LeadEtapa>,
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(ListLeadsQuery),
    responses(
        (status = 200, description = "Até 200 leads, mais recentes primeiro", body = Vec<Lead>)
    )
)]
pub async fn get_leads(
    State(app_state): State<AppState>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let leads = app_state
        .lead_service
        .list_leads(query.origem, query.etapa)
        .await?;

    Ok((StatusCode::OK, Json(leads)))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Detalhe do lead", body = Lead),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn lead_detail(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state.lead_service.get_lead(id).await?;
    Ok((StatusCode::OK, Json(lead)))
}

// =============================================================================
//  ATUALIZAÇÃO MANUAL
// =============================================================================

// PATCH /api/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state
        .lead_service
        .update_lead(&app_state.db_pool, id, payload)
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// =============================================================================
//  AUDITORIA
// =============================================================================

// GET /api/leads/{id}/events
#[utoipa::path(
    get,
    path = "/api/leads/{id}/events",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Trilha de eventos, mais recentes primeiro", body = Vec<LeadEvent>),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn lead_events(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let events = app_state.lead_service.list_events(id).await?;
    Ok((StatusCode::OK, Json(events)))
}

// =============================================================================
//  AÇÃO: ENVIAR MENSAGEM (WhatsApp)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageIn {
    pub lead_id: Uuid,

    #[validate(length(min = 1, message = "O texto da mensagem é obrigatório"))]
    #[schema(example = "Olá! Vi seu interesse em depilação a laser.")]
    pub texto: String,
}

// POST /api/actions/send-message
#[utoipa::path(
    post,
    path = "/api/actions/send-message",
    tag = "Leads",
    request_body = SendMessageIn,
    responses(
        (status = 200, description = "Resultado bruto da integração de mensagens"),
        (status = 404, description = "Lead não encontrado"),
        (status = 422, description = "Lead sem telefone")
    )
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    Json(payload): Json<SendMessageIn>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state
        .lead_service
        .send_message(&app_state.db_pool, payload.lead_id, &payload.texto)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "ok": true, "result": result }))))
}
