// src/services/messaging.rs

use std::{env, time::Duration};

use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// Resultado estruturado do despacho de mensagem. Nunca vira `Err`:
/// falha de transporte e integração desligada também são resultados,
/// para que o orquestrador registre o evento de auditoria correspondente.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SendOutcome {
    /// Código HTTP como texto, ou os literais "error" / "disabled".
    pub status: String,
    pub detail: String,
}

impl SendOutcome {
    /// Entregue = resposta HTTP 2xx da integração.
    pub fn delivered(&self) -> bool {
        self.status
            .parse::<u16>()
            .is_ok_and(|code| (200..300).contains(&code))
    }
}

// Cliente da Evolution API (WhatsApp). A integração fica desligada quando
// WHATSAPP_API_URL/WHATSAPP_TOKEN não estão configurados.
#[derive(Clone)]
pub struct MessagingClient {
    http: reqwest::Client,
    api_url: Option<String>,
    token: Option<String>,
}

impl MessagingClient {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        let api_url = env::var("WHATSAPP_API_URL").ok().filter(|v| !v.is_empty());
        let token = env::var("WHATSAPP_TOKEN").ok().filter(|v| !v.is_empty());
        if api_url.is_none() || token.is_none() {
            tracing::warn!("Integração de WhatsApp desligada: configure WHATSAPP_API_URL/WHATSAPP_TOKEN");
        }

        Ok(Self { http, api_url, token })
    }

    /// Envia mensagem de texto via Evolution API.
    pub async fn send(&self, telefone: &str, texto: &str) -> SendOutcome {
        let (Some(api_url), Some(token)) = (self.api_url.as_deref(), self.token.as_deref()) else {
            return SendOutcome {
                status: "disabled".to_string(),
                detail: "configure WHATSAPP_API_URL/WHATSAPP_TOKEN".to_string(),
            };
        };

        let payload = json!({
            // Campos esperados pela Evolution API
            "number": telefone,
            "text": texto,
            "delay": 0,
            "presence": "composing",
        });

        let response = self
            .http
            .post(api_url)
            .header("apikey", token)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status().as_u16().to_string();
                let detail = resp.text().await.unwrap_or_default();
                SendOutcome { status, detail }
            }
            Err(e) => SendOutcome {
                status: "error".to_string(),
                detail: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn somente_2xx_conta_como_entregue() {
        let entregue = |status: &str| SendOutcome {
            status: status.to_string(),
            detail: String::new(),
        }
        .delivered();

        assert!(entregue("200"));
        assert!(entregue("201"));
        assert!(!entregue("404"));
        assert!(!entregue("500"));
        assert!(!entregue("error"));
        assert!(!entregue("disabled"));
    }
}
