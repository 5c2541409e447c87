//src/main.rs

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let lead_routes = Router::new()
        .route("/", get(handlers::leads::get_leads))
        .route(
            "/{id}",
            get(handlers::leads::lead_detail).patch(handlers::leads::update_lead),
        )
        .route("/{id}/events", get(handlers::leads::lead_events))
        .route(
            "/{id}/historico",
            post(handlers::historico::create_historico).get(handlers::historico::list_historico),
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/webhooks/lead", post(handlers::leads::webhook_lead))
        .route("/api/actions/send-message", post(handlers::leads::send_message))
        .nest("/api/leads", lead_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
