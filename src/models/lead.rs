// src/models/lead.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_origem do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_origem", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadOrigem {
    Instagram,
    Manychat,
    Site,
    Outro,
}

impl Default for LeadOrigem {
    fn default() -> Self {
        LeadOrigem::Outro
    }
}

// Mapeia o CREATE TYPE lead_etapa do banco.
// A ordem dos variants segue o funil: novo < qualificado < cliente.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, ToSchema,
)]
#[sqlx(type_name = "lead_etapa", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadEtapa {
    Novo,
    Qualificado,
    Cliente,
}

// --- LEAD (registro canônico) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub nome: String,

    // Identidade: pelo menos um dos dois é obrigatório na entrada.
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub externo_id: Option<String>,

    pub origem: LeadOrigem,
    pub etapa: LeadEtapa,
    pub score: i32,

    // Tags simples (Array de Strings)
    // No Postgres é TEXT[], no Rust é Vec<String>
    pub tags: Option<Vec<String>>,

    pub servico_interesse: Option<String>,
    pub regiao_corpo: Option<String>,
    pub disponibilidade: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos normalizados e pontuados, prontos para o upsert.
/// Só o orquestrador monta este struct; `score` e `etapa` vêm sempre
/// do motor de pontuação (ou do override manual de etapa).
#[derive(Debug, Clone)]
pub struct NewLead {
    pub nome: String,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub externo_id: Option<String>,
    pub origem: LeadOrigem,
    pub tags: Option<Vec<String>>,
    pub servico_interesse: Option<String>,
    pub regiao_corpo: Option<String>,
    pub disponibilidade: Option<String>,
    pub score: i32,
    pub etapa: LeadEtapa,
}

// --- PAYLOADS DOS WORKFLOWS ---

/// Entrada de lead recebida via webhook (n8n / Evolution / ManyChat, etc).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LeadIn {
    #[validate(length(min = 1, message = "O nome é obrigatório"))]
    #[schema(example = "Maria da Silva")]
    pub nome: String,

    #[validate(email(message = "E-mail inválido"))]
    #[schema(example = "maria@email.com")]
    pub email: Option<String>,

    #[schema(example = "+55 (11) 99999-9999")]
    pub telefone: Option<String>,

    pub origem: Option<LeadOrigem>,

    #[schema(example = json!(["laser_primeira_vez"]))]
    pub tags: Option<Vec<String>>,

    pub externo_id: Option<String>,

    #[schema(example = "depilacao_laser")]
    pub servico_interesse: Option<String>,

    #[schema(example = "perna")]
    pub regiao_corpo: Option<String>,

    #[schema(example = "manhã ou tarde")]
    pub disponibilidade: Option<String>,
}

/// Resposta padrão do webhook de lead após salvar e calcular score.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadOut {
    pub lead_id: Uuid,
    pub score: i32,
    pub etapa: LeadEtapa,
}

/// Atualização manual de um lead. Os campos deste struct SÃO a allow-list:
/// o que não está aqui não é atualizável por este caminho. `etapa` é o
/// override manual de etapa e vence a reclassificação automática.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLeadPayload {
    #[validate(length(min = 1, message = "O nome não pode ficar vazio"))]
    pub nome: Option<String>,
    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub origem: Option<LeadOrigem>,
    pub tags: Option<Vec<String>>,
    pub externo_id: Option<String>,
    pub servico_interesse: Option<String>,
    pub regiao_corpo: Option<String>,
    pub disponibilidade: Option<String>,
    pub etapa: Option<LeadEtapa>,
}
