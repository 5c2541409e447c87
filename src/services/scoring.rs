// src/services/scoring.rs

use crate::models::lead::LeadEtapa;

pub const ETAPA_QUALIFICADO_MIN: i32 = 60;

/// Sinais normalizados consumidos pelo motor de pontuação.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub telefone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub servico_interesse: Option<&'a str>,
    pub regiao_corpo: Option<&'a str>,
    pub tags: &'a [String],
    pub disponibilidade: Option<&'a str>,
}

const REGIOES_ALTO_VALOR: &[&str] = &[
    "perna", "pernas", "coxa", "coxas", "corpo inteiro", "corpo todo",
];
const REGIOES_MEDIO_VALOR: &[&str] = &[
    "virilha", "virilhas", "axila", "axilas", "rosto", "face", "braco", "bracos",
];
const PERIODOS_DISPONIBILIDADE: &[&str] = &["manha", "tarde", "noite", "madrugada", "fim de semana"];

// Comparação de texto livre (região, disponibilidade) ignora acentos,
// porque o dado vem digitado pelo próprio lead.
fn fold(texto: &str) -> String {
    texto
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            _ => c,
        })
        .collect()
}

// Busca o termo como palavra(s) inteira(s), nunca como substring:
// "pernambuco" não é "perna". Texto e termo já vêm normalizados por `fold`.
fn contem_termo(texto: &str, termo: &str) -> bool {
    let palavras: Vec<&str> = texto
        .split(|c: char| !c.is_alphanumeric())
        .filter(|p| !p.is_empty())
        .collect();
    let alvo: Vec<&str> = termo
        .split(|c: char| !c.is_alphanumeric())
        .filter(|p| !p.is_empty())
        .collect();
    palavras.windows(alvo.len()).any(|janela| janela == alvo)
}

/// Calcula a pontuação do lead (0..=100), determinística e sem efeito colateral.
///
/// Regras aditivas por faixa, nesta ordem fixa: contato, interesse de serviço,
/// detalhe de laser (região + histórico, só quando o interesse é depilação a
/// laser) e disponibilidade. Dentro de cada faixa vale apenas o maior bônus.
pub fn compute_score(input: &ScoreInput) -> i32 {
    let mut score = 0;

    // Contato
    if input.telefone.is_some() {
        score += 30;
    }
    if input.email.is_some() {
        score += 5;
    }

    // Interesse de serviço
    let interesse = input.servico_interesse.unwrap_or("");
    score += match interesse {
        "depilacao_laser" => 30,
        "limpeza_pele" => 20,
        "designer_sobrancelha" => 10,
        _ => 0,
    };

    // Detalhe de laser: região e histórico só pontuam para depilação a laser.
    if interesse == "depilacao_laser" {
        if let Some(regiao) = input.regiao_corpo.filter(|r| !r.trim().is_empty()) {
            let regiao = fold(regiao);
            if REGIOES_ALTO_VALOR.iter().any(|r| contem_termo(&regiao, r)) {
                score += 15;
            } else if REGIOES_MEDIO_VALOR.iter().any(|r| contem_termo(&regiao, r)) {
                score += 10;
            } else {
                score += 5;
            }
        }

        let tem_tag = |t: &str| input.tags.iter().any(|tag| tag == t);
        if tem_tag("laser_outra_clinica") {
            score += 15;
        } else if tem_tag("laser_parou") {
            score += 10;
        } else if tem_tag("laser_primeira_vez") {
            score += 5;
        }
    }

    // Disponibilidade: dois ou mais períodos distintos citados
    if let Some(disp) = input.disponibilidade {
        let disp = fold(disp);
        let periodos = PERIODOS_DISPONIBILIDADE
            .iter()
            .filter(|p| contem_termo(&disp, p))
            .count();
        if periodos >= 2 {
            score += 5;
        }
    }

    score.clamp(0, 100)
}

/// Deriva a etapa do funil a partir do score. `cliente` nunca é derivada
/// aqui: só o override manual de etapa alcança esse estágio.
pub fn stage_from_score(score: i32) -> LeadEtapa {
    if score >= ETAPA_QUALIFICADO_MIN {
        LeadEtapa::Qualificado
    } else {
        LeadEtapa::Novo
    }
}
