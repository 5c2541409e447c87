// src/models/event.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Mapeia o CREATE TYPE lead_event_tipo do banco.
// O enum é fechado: um tipo desconhecido é rejeitado já na desserialização,
// antes de qualquer tentativa de persistência.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_event_tipo", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventTipo {
    Entrada,
    MensagemEnviada,
    ErroEnvio,
    Followup,
    Atualizacao,
}

// --- EVENTO (trilha de auditoria, somente append) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeadEvent {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub tipo: EventTipo,
    pub payload: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tipos_reconhecidos_desserializam() {
        for raw in [
            "\"entrada\"",
            "\"mensagem_enviada\"",
            "\"erro_envio\"",
            "\"followup\"",
            "\"atualizacao\"",
        ] {
            assert!(serde_json::from_str::<EventTipo>(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn tipo_desconhecido_e_rejeitado() {
        assert!(serde_json::from_str::<EventTipo>("\"mensagem_lida\"").is_err());
    }
}
