// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{EventRepository, HistoricoRepository, LeadRepository},
    services::{LeadService, MessagingClient},
};

// O estado compartilhado que será acessível em toda a aplicação.
// A pool é construída uma única vez aqui e injetada nos componentes;
// não existe pool global implícita.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub lead_service: LeadService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let lead_repo = LeadRepository::new(db_pool.clone());
        let event_repo = EventRepository::new(db_pool.clone());
        let historico_repo = HistoricoRepository::new(db_pool.clone());
        let messaging = MessagingClient::new()?;
        let lead_service = LeadService::new(lead_repo, event_repo, historico_repo, messaging);

        Ok(Self { db_pool, lead_service })
    }
}
