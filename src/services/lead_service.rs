// src/services/lead_service.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EventRepository, HistoricoRepository, LeadRepository},
    models::{
        event::EventTipo,
        historico::HistoricoServico,
        lead::{Lead, LeadEtapa, LeadIn, LeadOrigem, LeadOut, NewLead, UpdateLeadPayload},
    },
    services::{
        messaging::{MessagingClient, SendOutcome},
        normalize::{clean_name, clean_phone, lower_or_none},
        scoring::{ScoreInput, compute_score, stage_from_score},
    },
};

// Campos que alimentam o motor de pontuação: quando a atualização manual
// toca qualquer um deles, score e etapa são recalculados antes de persistir.
const CAMPOS_DE_SCORE: &[&str] = &[
    "email",
    "telefone",
    "origem",
    "tags",
    "servico_interesse",
    "regiao_corpo",
    "disponibilidade",
];

// O orquestrador: compõe normalização, pontuação, upsert e auditoria.
// Toda mutação de lead e seu evento commitam na mesma transação.
#[derive(Clone)]
pub struct LeadService {
    lead_repo: LeadRepository,
    event_repo: EventRepository,
    historico_repo: HistoricoRepository,
    messaging: MessagingClient,
}

impl LeadService {
    pub fn new(
        lead_repo: LeadRepository,
        event_repo: EventRepository,
        historico_repo: HistoricoRepository,
        messaging: MessagingClient,
    ) -> Self {
        Self {
            lead_repo,
            event_repo,
            historico_repo,
            messaging,
        }
    }

    // =========================================================================
    //  WORKFLOW 1: WEBHOOK DE ENTRADA
    // =========================================================================

    /// normalizar → pontuar → classificar → upsert → evento 'entrada',
    /// com upsert e evento na mesma transação.
    pub async fn ingest_webhook(&self, pool: &PgPool, payload: LeadIn) -> Result<LeadOut, AppError> {
        let email = lower_or_none(payload.email.as_deref());
        let telefone = clean_phone(payload.telefone.as_deref());
        if email.is_none() && telefone.is_none() {
            return Err(AppError::MissingContact);
        }

        let data = NewLead {
            nome: clean_name(&payload.nome),
            email,
            telefone,
            externo_id: payload.externo_id,
            origem: payload.origem.unwrap_or_default(),
            tags: payload.tags,
            servico_interesse: lower_or_none(payload.servico_interesse.as_deref()),
            regiao_corpo: payload.regiao_corpo,
            disponibilidade: payload.disponibilidade,
            score: 0,
            etapa: LeadEtapa::Novo,
        };

        let score = compute_score(&ScoreInput {
            telefone: data.telefone.as_deref(),
            email: data.email.as_deref(),
            servico_interesse: data.servico_interesse.as_deref(),
            regiao_corpo: data.regiao_corpo.as_deref(),
            tags: data.tags.as_deref().unwrap_or(&[]),
            disponibilidade: data.disponibilidade.as_deref(),
        });
        let etapa = stage_from_score(score);
        let data = NewLead { score, etapa, ..data };

        let mut tx = pool.begin().await?;
        let lead_id = self.lead_repo.upsert(&mut tx, &data).await?;

        let evento = json!({
            "nome": data.nome,
            "email": data.email,
            "telefone": data.telefone,
            "origem": data.origem,
            "tags": data.tags,
            "externo_id": data.externo_id,
            "servico_interesse": data.servico_interesse,
            "regiao_corpo": data.regiao_corpo,
            "disponibilidade": data.disponibilidade,
            "score": score,
            "etapa": etapa,
        });
        self.event_repo
            .append(&mut *tx, lead_id, EventTipo::Entrada, Some(&evento))
            .await?;
        tx.commit().await?;

        Ok(LeadOut { lead_id, score, etapa })
    }

    // =========================================================================
    //  WORKFLOW 2: ATUALIZAÇÃO MANUAL
    // =========================================================================

    /// Aplica só os campos da allow-list, recalcula score/etapa quando um
    /// campo de pontuação mudou e registra o evento 'atualizacao' com os
    /// nomes dos campos alterados. Um `etapa` explícito no payload vence a
    /// reclassificação (é o único caminho até 'cliente').
    pub async fn update_lead(
        &self,
        pool: &PgPool,
        id: Uuid,
        payload: UpdateLeadPayload,
    ) -> Result<Lead, AppError> {
        let mut lead = self
            .lead_repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        let etapa_override = payload.etapa;
        let alterados = apply_update(&mut lead, payload);
        if alterados.is_empty() {
            return Ok(lead);
        }

        if alterados.iter().any(|c| CAMPOS_DE_SCORE.contains(&c.as_str())) {
            lead.score = compute_score(&score_input(&lead));
            lead.etapa = etapa_override.unwrap_or_else(|| stage_from_score(lead.score));
        }

        let mut tx = pool.begin().await?;
        // O lead pode ter sumido entre o get_by_id e o UPDATE.
        let atualizado = self
            .lead_repo
            .update(&mut *tx, &lead)
            .await?
            .ok_or(AppError::LeadNotFound)?;
        self.event_repo
            .append(
                &mut *tx,
                id,
                EventTipo::Atualizacao,
                Some(&json!({ "campos": alterados })),
            )
            .await?;
        tx.commit().await?;

        Ok(atualizado)
    }

    // =========================================================================
    //  WORKFLOW 3: ENVIO DE MENSAGEM
    // =========================================================================

    /// Resolve o lead, exige telefone e delega ao dispatcher. O resultado
    /// bruto da integração vai para o evento nos dois desfechos: falha de
    /// envio vira 'erro_envio' auditável, nunca falha do request.
    pub async fn send_message(
        &self,
        pool: &PgPool,
        lead_id: Uuid,
        texto: &str,
    ) -> Result<SendOutcome, AppError> {
        let lead = self
            .lead_repo
            .get_by_id(lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;
        let telefone = lead.telefone.as_deref().ok_or(AppError::LeadWithoutPhone)?;

        let outcome = self.messaging.send(telefone, texto).await;
        let tipo = if outcome.delivered() {
            EventTipo::MensagemEnviada
        } else {
            EventTipo::ErroEnvio
        };

        let payload = json!({ "status": outcome.status, "detail": outcome.detail });
        self.event_repo
            .append(pool, lead_id, tipo, Some(&payload))
            .await?;

        Ok(outcome)
    }

    // =========================================================================
    //  LEITURA E HISTÓRICO DE SERVIÇOS
    // =========================================================================

    pub async fn get_lead(&self, id: Uuid) -> Result<Lead, AppError> {
        self.lead_repo.get_by_id(id).await?.ok_or(AppError::LeadNotFound)
    }

    pub async fn list_leads(
        &self,
        origem: Option<LeadOrigem>,
        etapa: Option<LeadEtapa>,
    ) -> Result<Vec<Lead>, AppError> {
        self.lead_repo.list(origem, etapa).await
    }

    pub async fn list_events(&self, lead_id: Uuid) -> Result<Vec<crate::models::event::LeadEvent>, AppError> {
        // 404 antes de devolver lista vazia para id inexistente
        self.get_lead(lead_id).await?;
        self.event_repo.list_for_lead(lead_id).await
    }

    pub async fn add_historico(
        &self,
        lead_id: Uuid,
        servico: crate::models::historico::ServicoTipo,
        data_servico: chrono::DateTime<chrono::Utc>,
        status: crate::models::historico::ServicoStatus,
        ticket: Option<rust_decimal::Decimal>,
        observacoes: Option<&str>,
    ) -> Result<HistoricoServico, AppError> {
        self.get_lead(lead_id).await?;
        self.historico_repo
            .add(lead_id, servico, data_servico, status, ticket, observacoes)
            .await
    }

    pub async fn list_historico(&self, lead_id: Uuid) -> Result<Vec<HistoricoServico>, AppError> {
        self.get_lead(lead_id).await?;
        self.historico_repo.list_for_lead(lead_id).await
    }
}

fn score_input(lead: &Lead) -> ScoreInput<'_> {
    ScoreInput {
        telefone: lead.telefone.as_deref(),
        email: lead.email.as_deref(),
        servico_interesse: lead.servico_interesse.as_deref(),
        regiao_corpo: lead.regiao_corpo.as_deref(),
        tags: lead.tags.as_deref().unwrap_or(&[]),
        disponibilidade: lead.disponibilidade.as_deref(),
    }
}

/// Merge da atualização manual: aplica só os campos presentes no payload
/// (a allow-list é o próprio tipo) e devolve, em ordem alfabética, os nomes
/// dos campos que de fato mudaram. Email e telefone passam pelo normalizador;
/// um valor que normaliza para ausente nunca rebaixa a identidade para NULL.
fn apply_update(lead: &mut Lead, payload: UpdateLeadPayload) -> Vec<String> {
    let mut alterados: Vec<String> = Vec::new();
    let mut marca = |campo: &str, mudou: bool| {
        if mudou {
            alterados.push(campo.to_string());
        }
    };

    if let Some(nome) = payload.nome {
        let nome = clean_name(&nome);
        marca("nome", lead.nome != nome);
        lead.nome = nome;
    }
    if let Some(email) = lower_or_none(payload.email.as_deref()) {
        marca("email", lead.email.as_deref() != Some(&email));
        lead.email = Some(email);
    }
    if let Some(telefone) = clean_phone(payload.telefone.as_deref()) {
        marca("telefone", lead.telefone.as_deref() != Some(&telefone));
        lead.telefone = Some(telefone);
    }
    if let Some(origem) = payload.origem {
        marca("origem", lead.origem != origem);
        lead.origem = origem;
    }
    if let Some(tags) = payload.tags {
        // Tags têm semântica de conjunto: ordem diferente não é mudança.
        let mut novas = tags.clone();
        novas.sort();
        novas.dedup();
        let mut atuais = lead.tags.clone().unwrap_or_default();
        atuais.sort();
        atuais.dedup();
        marca("tags", atuais != novas);
        lead.tags = Some(tags);
    }
    if let Some(externo_id) = payload.externo_id {
        marca("externo_id", lead.externo_id.as_deref() != Some(&externo_id));
        lead.externo_id = Some(externo_id);
    }
    if let Some(interesse) = lower_or_none(payload.servico_interesse.as_deref()) {
        marca("servico_interesse", lead.servico_interesse.as_deref() != Some(&interesse));
        lead.servico_interesse = Some(interesse);
    }
    if let Some(regiao) = payload.regiao_corpo {
        marca("regiao_corpo", lead.regiao_corpo.as_deref() != Some(&regiao));
        lead.regiao_corpo = Some(regiao);
    }
    if let Some(disp) = payload.disponibilidade {
        marca("disponibilidade", lead.disponibilidade.as_deref() != Some(&disp));
        lead.disponibilidade = Some(disp);
    }
    if let Some(etapa) = payload.etapa {
        marca("etapa", lead.etapa != etapa);
        lead.etapa = etapa;
    }

    alterados.sort();
    alterados
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn lead_base() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            nome: "Maria da Silva".to_string(),
            email: Some("maria@email.com".to_string()),
            telefone: Some("5511999999999".to_string()),
            externo_id: None,
            origem: LeadOrigem::Manychat,
            etapa: LeadEtapa::Novo,
            score: 35,
            tags: Some(vec!["quente".to_string(), "vip".to_string()]),
            servico_interesse: None,
            regiao_corpo: None,
            disponibilidade: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payload_vazio_nao_muda_nada() {
        let mut lead = lead_base();
        let alterados = apply_update(&mut lead, UpdateLeadPayload::default());
        assert!(alterados.is_empty());
    }

    #[test]
    fn campos_alterados_saem_em_ordem() {
        let mut lead = lead_base();
        let alterados = apply_update(
            &mut lead,
            UpdateLeadPayload {
                nome: Some("Maria  de  Souza".to_string()),
                servico_interesse: Some("Depilacao_Laser".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(alterados, vec!["nome", "servico_interesse"]);
        assert_eq!(lead.nome, "Maria de Souza");
        assert_eq!(lead.servico_interesse.as_deref(), Some("depilacao_laser"));
    }

    #[test]
    fn tags_na_mesma_ordem_ou_nao_sao_o_mesmo_conjunto() {
        let mut lead = lead_base();
        let alterados = apply_update(
            &mut lead,
            UpdateLeadPayload {
                tags: Some(vec!["vip".to_string(), "quente".to_string()]),
                ..Default::default()
            },
        );
        assert!(alterados.is_empty(), "reordenação de tags não é mudança");
    }

    #[test]
    fn telefone_invalido_nao_rebaixa_identidade() {
        let mut lead = lead_base();
        let alterados = apply_update(
            &mut lead,
            UpdateLeadPayload {
                telefone: Some("abc".to_string()),
                ..Default::default()
            },
        );
        assert!(alterados.is_empty());
        assert_eq!(lead.telefone.as_deref(), Some("5511999999999"));
    }

    #[test]
    fn override_manual_alcanca_cliente() {
        let mut lead = lead_base();
        let alterados = apply_update(
            &mut lead,
            UpdateLeadPayload {
                etapa: Some(LeadEtapa::Cliente),
                ..Default::default()
            },
        );
        assert_eq!(alterados, vec!["etapa"]);
        assert_eq!(lead.etapa, LeadEtapa::Cliente);
    }

    #[test]
    fn campos_de_score_cobrem_todas_as_entradas_do_motor() {
        for campo in ["email", "telefone", "tags", "servico_interesse", "regiao_corpo", "disponibilidade"] {
            assert!(CAMPOS_DE_SCORE.contains(&campo), "{campo}");
        }
    }

    fn servico(pool: &PgPool) -> LeadService {
        LeadService::new(
            LeadRepository::new(pool.clone()),
            EventRepository::new(pool.clone()),
            HistoricoRepository::new(pool.clone()),
            MessagingClient::new().unwrap(),
        )
    }

    fn entrada(nome: &str, email: Option<&str>, telefone: Option<&str>) -> LeadIn {
        LeadIn {
            nome: nome.to_string(),
            email: email.map(str::to_string),
            telefone: telefone.map(str::to_string),
            origem: None,
            tags: None,
            externo_id: None,
            servico_interesse: None,
            regiao_corpo: None,
            disponibilidade: None,
        }
    }

    #[sqlx::test]
    async fn entradas_repetidas_sao_idempotentes_e_cada_uma_audita_uma_vez(pool: PgPool) {
        let servico = servico(&pool);
        let payload = entrada("Maria", Some("A@B.com"), Some("+55 (11) 99999-9999"));

        let out1 = servico.ingest_webhook(&pool, payload.clone()).await.unwrap();
        let out2 = servico.ingest_webhook(&pool, payload).await.unwrap();

        assert_eq!(out1.lead_id, out2.lead_id);
        assert_eq!(out1.score, out2.score);
        assert_eq!(out1.etapa, out2.etapa);

        // Cada upsert bem-sucedido acrescenta exatamente um evento.
        let eventos = servico.list_events(out1.lead_id).await.unwrap();
        assert_eq!(eventos.len(), 2);
        assert!(eventos.iter().all(|e| e.tipo == EventTipo::Entrada));
    }

    #[sqlx::test]
    async fn webhook_sem_identidade_nao_persiste_nada(pool: PgPool) {
        let servico = servico(&pool);
        let erro = servico
            .ingest_webhook(&pool, entrada("Maria", None, None))
            .await
            .unwrap_err();
        assert!(matches!(erro, AppError::MissingContact));

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[sqlx::test]
    async fn atualizacao_de_campo_de_score_reclassifica_e_audita(pool: PgPool) {
        let servico = servico(&pool);
        let out = servico
            .ingest_webhook(&pool, entrada("Maria", None, Some("5511999999999")))
            .await
            .unwrap();
        assert_eq!(out.etapa, LeadEtapa::Novo);

        let atualizado = servico
            .update_lead(
                &pool,
                out.lead_id,
                UpdateLeadPayload {
                    servico_interesse: Some("depilacao_laser".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // 30 (telefone) + 30 (depilacao_laser) cruza o corte de qualificação.
        assert_eq!(atualizado.score, 60);
        assert_eq!(atualizado.etapa, LeadEtapa::Qualificado);

        let eventos = servico.list_events(out.lead_id).await.unwrap();
        assert_eq!(eventos.len(), 2);
        let atualizacao = eventos
            .iter()
            .find(|e| e.tipo == EventTipo::Atualizacao)
            .expect("evento de atualização registrado");
        let campos = atualizacao.payload.as_ref().unwrap()["campos"].clone();
        assert_eq!(campos, json!(["servico_interesse"]));
    }
}
