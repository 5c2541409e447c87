// src/db/lead_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{Lead, LeadEtapa, LeadOrigem, NewLead},
};

// O repositório de leads, responsável por todas as interações com a tabela 'leads'
#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CREATE-OR-MERGE (upsert por identidade)
    // =========================================================================

    /// Insere um lead novo ou faz merge no registro existente com a mesma
    /// identidade (email ou telefone). Roda dentro da transação do chamador.
    ///
    /// Intakes concorrentes do mesmo contato são serializados por um advisory
    /// lock por chave de identidade; assim o caminho insert-depois-resolve
    /// nunca perde a corrida contra outro writer da mesma identidade.
    pub async fn upsert(&self, conn: &mut PgConnection, data: &NewLead) -> Result<Uuid, AppError> {
        if let Some(email) = data.email.as_deref() {
            self.lock_identity(&mut *conn, "lead_email", email).await?;
        }
        if let Some(telefone) = data.telefone.as_deref() {
            self.lock_identity(&mut *conn, "lead_telefone", telefone).await?;
        }

        if let Some(id) = self.try_insert(&mut *conn, data).await? {
            return Ok(id);
        }

        // Conflito de unicidade: localiza o registro existente, preferindo
        // o match por email quando email e telefone apontam para leads
        // diferentes (política documentada para a ambiguidade de conflito).
        let por_email = match data.email.as_deref() {
            Some(email) => self.find_id_by_email(&mut *conn, email).await?,
            None => None,
        };
        let por_telefone = match data.telefone.as_deref() {
            Some(telefone) => self.find_id_by_telefone(&mut *conn, telefone).await?,
            None => None,
        };

        match (por_email, por_telefone) {
            (Some(email_id), Some(tel_id)) if email_id != tel_id => {
                tracing::warn!(
                    %email_id, %tel_id,
                    "Email e telefone do intake apontam para leads distintos; \
                     mantendo o match por email e ignorando o por telefone"
                );
                // O telefone do intake pertence ao outro registro: entra no
                // merge como ausente, senão o UPDATE violaria a unicidade de
                // telefone e derrubaria o request que a precedência resolve.
                let sem_telefone = NewLead {
                    telefone: None,
                    ..data.clone()
                };
                self.merge_into(&mut *conn, email_id, &sem_telefone).await?;
                Ok(email_id)
            }
            (Some(email_id), _) => {
                self.merge_into(&mut *conn, email_id, data).await?;
                Ok(email_id)
            }
            (None, Some(tel_id)) => {
                self.merge_into(&mut *conn, tel_id, data).await?;
                Ok(tel_id)
            }
            // Com os locks de identidade isso indica estado inconsistente.
            (None, None) => Err(AppError::InternalServerError(anyhow::anyhow!(
                "conflito de unicidade sem lead correspondente"
            ))),
        }
    }

    async fn lock_identity<'e, E>(&self, executor: E, escopo: &str, chave: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("{escopo}:{chave}"))
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Tenta o INSERT; retorna `None` quando a unicidade de email/telefone
    /// já está ocupada por outro registro.
    async fn try_insert<'e, E>(&self, executor: E, data: &NewLead) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO leads (
                nome, email, telefone, externo_id, origem, tags,
                servico_interesse, regiao_corpo, disponibilidade, score, etapa
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&data.nome)
        .bind(&data.email)
        .bind(&data.telefone)
        .bind(&data.externo_id)
        .bind(data.origem)
        .bind(&data.tags)
        .bind(&data.servico_interesse)
        .bind(&data.regiao_corpo)
        .bind(&data.disponibilidade)
        .bind(data.score)
        .bind(data.etapa)
        .fetch_one(executor)
        .await;

        match result {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return Ok(None);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn find_id_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_scalar::<_, Uuid>("SELECT id FROM leads WHERE email = $1")
            .bind(email)
            .fetch_optional(executor)
            .await?)
    }

    async fn find_id_by_telefone<'e, E>(
        &self,
        executor: E,
        telefone: &str,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_scalar::<_, Uuid>("SELECT id FROM leads WHERE telefone = $1")
            .bind(telefone)
            .fetch_optional(executor)
            .await?)
    }

    /// Merge no registro existente: identidade nunca regride para NULL
    /// (COALESCE), campos descritivos e derivados são sobrescritos e o
    /// updated_at é renovado.
    async fn merge_into<'e, E>(&self, executor: E, id: Uuid, data: &NewLead) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE leads SET
                nome = $2,
                email = COALESCE($3, email),
                telefone = COALESCE($4, telefone),
                externo_id = COALESCE($5, externo_id),
                origem = $6,
                tags = $7,
                servico_interesse = $8,
                regiao_corpo = $9,
                disponibilidade = $10,
                score = $11,
                etapa = $12,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&data.nome)
        .bind(&data.email)
        .bind(&data.telefone)
        .bind(&data.externo_id)
        .bind(data.origem)
        .bind(&data.tags)
        .bind(&data.servico_interesse)
        .bind(&data.regiao_corpo)
        .bind(&data.disponibilidade)
        .bind(data.score)
        .bind(data.etapa)
        .execute(executor)
        .await?;
        Ok(())
    }

    // =========================================================================
    //  LEITURA E ATUALIZAÇÃO MANUAL
    // =========================================================================

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Lista até 200 leads, mais recentes primeiro, com filtros opcionais.
    pub async fn list(
        &self,
        origem: Option<LeadOrigem>,
        etapa: Option<LeadEtapa>,
    ) -> Result<Vec<Lead>, AppError> {
        Ok(sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE ($1::lead_origem IS NULL OR origem = $1)
              AND ($2::lead_etapa IS NULL OR etapa = $2)
            ORDER BY updated_at DESC
            LIMIT 200
            "#,
        )
        .bind(origem)
        .bind(etapa)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Persiste o lead já com os campos da atualização manual aplicados
    /// pelo serviço. Roda dentro da transação do chamador. Retorna `None`
    /// quando o lead não existe mais.
    pub async fn update<'e, E>(&self, executor: E, lead: &Lead) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                nome = $2,
                email = $3,
                telefone = $4,
                externo_id = $5,
                origem = $6,
                tags = $7,
                servico_interesse = $8,
                regiao_corpo = $9,
                disponibilidade = $10,
                score = $11,
                etapa = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(&lead.nome)
        .bind(&lead.email)
        .bind(&lead.telefone)
        .bind(&lead.externo_id)
        .bind(lead.origem)
        .bind(&lead.tags)
        .bind(&lead.servico_interesse)
        .bind(&lead.regiao_corpo)
        .bind(&lead.disponibilidade)
        .bind(lead.score)
        .bind(lead.etapa)
        .fetch_optional(executor)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn novo_lead(nome: &str, email: Option<&str>, telefone: Option<&str>) -> NewLead {
        NewLead {
            nome: nome.to_string(),
            email: email.map(str::to_string),
            telefone: telefone.map(str::to_string),
            externo_id: None,
            origem: LeadOrigem::Manychat,
            tags: None,
            servico_interesse: None,
            regiao_corpo: None,
            disponibilidade: None,
            score: 30,
            etapa: LeadEtapa::Novo,
        }
    }

    async fn upsert_em_tx(repo: &LeadRepository, pool: &PgPool, data: &NewLead) -> Uuid {
        let mut tx = pool.begin().await.unwrap();
        let id = repo.upsert(&mut tx, data).await.unwrap();
        tx.commit().await.unwrap();
        id
    }

    #[sqlx::test]
    async fn reentrada_da_mesma_identidade_nao_duplica(pool: PgPool) {
        let repo = LeadRepository::new(pool.clone());
        let data = novo_lead("Maria", Some("a@b.com"), None);

        let id1 = upsert_em_tx(&repo, &pool, &data).await;
        let id2 = upsert_em_tx(&repo, &pool, &data).await;
        assert_eq!(id1, id2);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE email = $1")
            .bind("a@b.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[sqlx::test]
    async fn segunda_entrada_com_telefone_completa_o_mesmo_lead(pool: PgPool) {
        let repo = LeadRepository::new(pool.clone());

        let so_email = novo_lead("Maria", Some("a@b.com"), None);
        let id1 = upsert_em_tx(&repo, &pool, &so_email).await;

        let com_telefone = novo_lead("Maria", Some("a@b.com"), Some("5511999999999"));
        let id2 = upsert_em_tx(&repo, &pool, &com_telefone).await;
        assert_eq!(id1, id2);

        let lead = repo.get_by_id(id1).await.unwrap().unwrap();
        assert_eq!(lead.email.as_deref(), Some("a@b.com"));
        assert_eq!(lead.telefone.as_deref(), Some("5511999999999"));
    }

    #[sqlx::test]
    async fn identidades_em_leads_distintos_atualizam_o_match_por_email(pool: PgPool) {
        let repo = LeadRepository::new(pool.clone());

        let por_email = upsert_em_tx(&repo, &pool, &novo_lead("A", Some("a@b.com"), None)).await;
        let por_telefone =
            upsert_em_tx(&repo, &pool, &novo_lead("B", None, Some("5511999999999"))).await;
        assert_ne!(por_email, por_telefone);

        // Intake com as duas identidades: atualiza o match por email e
        // ignora o por telefone, sem falhar e sem fundir os dois registros.
        let ambiguo = novo_lead("A Nova", Some("a@b.com"), Some("5511999999999"));
        let id = upsert_em_tx(&repo, &pool, &ambiguo).await;
        assert_eq!(id, por_email);

        let atualizado = repo.get_by_id(por_email).await.unwrap().unwrap();
        assert_eq!(atualizado.nome, "A Nova");
        // O telefone continua pertencendo ao outro lead.
        assert_eq!(atualizado.telefone, None);

        let outro = repo.get_by_id(por_telefone).await.unwrap().unwrap();
        assert_eq!(outro.telefone.as_deref(), Some("5511999999999"));
        assert_eq!(outro.nome, "B");
    }

    #[sqlx::test]
    async fn update_de_lead_inexistente_retorna_none(pool: PgPool) {
        let repo = LeadRepository::new(pool.clone());
        let fantasma = Lead {
            id: Uuid::new_v4(),
            nome: "Fantasma".to_string(),
            email: None,
            telefone: None,
            externo_id: None,
            origem: LeadOrigem::Outro,
            etapa: LeadEtapa::Novo,
            score: 0,
            tags: None,
            servico_interesse: None,
            regiao_corpo: None,
            disponibilidade: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let resultado = repo.update(&pool, &fantasma).await.unwrap();
        assert!(resultado.is_none());
    }
}
