// src/db/historico_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::historico::{HistoricoServico, ServicoStatus, ServicoTipo},
};

#[derive(Clone)]
pub struct HistoricoRepository {
    pool: PgPool,
}

impl HistoricoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn add(
        &self,
        lead_id: Uuid,
        servico: ServicoTipo,
        data_servico: DateTime<Utc>,
        status: ServicoStatus,
        ticket: Option<Decimal>,
        observacoes: Option<&str>,
    ) -> Result<HistoricoServico, AppError> {
        Ok(sqlx::query_as::<_, HistoricoServico>(
            r#"
            INSERT INTO historico_servicos
                (lead_id, servico, data_servico, status, ticket, observacoes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(servico)
        .bind(data_servico)
        .bind(status)
        .bind(ticket)
        .bind(observacoes)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn list_for_lead(&self, lead_id: Uuid) -> Result<Vec<HistoricoServico>, AppError> {
        Ok(sqlx::query_as::<_, HistoricoServico>(
            "SELECT * FROM historico_servicos WHERE lead_id = $1 ORDER BY data_servico DESC",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
