// src/db/event_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::event::{EventTipo, LeadEvent},
};

// Trilha de auditoria do lead: este repositório só conhece INSERT e SELECT.
// Não existe caminho de UPDATE ou DELETE para lead_events.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra um evento. Sempre chamado na mesma transação da mutação do
    /// lead que o originou, para que mutação e auditoria commitem juntas.
    pub async fn append<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        tipo: EventTipo,
        payload: Option<&Value>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO lead_events (lead_id, tipo, payload) VALUES ($1, $2, $3)")
            .bind(lead_id)
            .bind(tipo)
            .bind(payload)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Eventos de um lead, mais recentes primeiro.
    pub async fn list_for_lead(&self, lead_id: Uuid) -> Result<Vec<LeadEvent>, AppError> {
        Ok(sqlx::query_as::<_, LeadEvent>(
            "SELECT * FROM lead_events WHERE lead_id = $1 ORDER BY created_at DESC",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
