// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Leads ---
        handlers::leads::webhook_lead,
        handlers::leads::get_leads,
        handlers::leads::lead_detail,
        handlers::leads::update_lead,
        handlers::leads::lead_events,
        handlers::leads::send_message,

        // --- Histórico de serviços ---
        handlers::historico::create_historico,
        handlers::historico::list_historico,
    ),
    components(
        schemas(
            models::lead::Lead,
            models::lead::LeadIn,
            models::lead::LeadOut,
            models::lead::UpdateLeadPayload,
            models::lead::LeadOrigem,
            models::lead::LeadEtapa,
            models::event::LeadEvent,
            models::event::EventTipo,
            models::historico::HistoricoServico,
            models::historico::ServicoTipo,
            models::historico::ServicoStatus,
            handlers::leads::SendMessageIn,
            handlers::historico::HistoricoIn,
            services::messaging::SendOutcome,
        )
    ),
    tags(
        (name = "Health", description = "Saúde da API e do banco"),
        (name = "Leads", description = "Funil de leads: entrada, qualificação e mensagens"),
        (name = "Histórico", description = "Histórico de serviços por lead")
    )
)]
pub struct ApiDoc;
