// src/models/historico.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "servico_tipo", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServicoTipo {
    DepilacaoLaser,
    DesignerSobrancelha,
    LimpezaPele,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "servico_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServicoStatus {
    Lead,
    Agendado,
    Confirmado,
    Concluido,
    NoShow,
    Cancelado,
}

impl Default for ServicoStatus {
    fn default() -> Self {
        ServicoStatus::Lead
    }
}

// --- HISTÓRICO DE SERVIÇOS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HistoricoServico {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub servico: ServicoTipo,
    pub data_servico: DateTime<Utc>,
    pub status: ServicoStatus,
    #[schema(value_type = Option<f64>)]
    pub ticket: Option<Decimal>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
}
