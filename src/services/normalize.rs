// src/services/normalize.rs

// Funções puras de limpeza de dados de contato. Nunca falham: qualquer
// string (ou ausência) é entrada válida.

/// Remove todos os caracteres não numéricos do telefone e retorna apenas dígitos.
/// Se não sobrar nenhum dígito, o telefone é tratado como ausente.
pub fn clean_phone(raw: Option<&str>) -> Option<String> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Remove espaços extras (início, fim e internos) e normaliza o nome.
pub fn clean_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Converte para minúsculo se existir valor, caso contrário preserva a ausência.
pub fn lower_or_none(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(s) if !s.is_empty() => Some(s.to_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_phone_mantem_somente_digitos() {
        assert_eq!(
            clean_phone(Some("+55 (11) 99999-9999")),
            Some("5511999999999".to_string())
        );
    }

    #[test]
    fn clean_phone_sem_digitos_vira_ausente() {
        assert_eq!(clean_phone(Some("abc-.()")), None);
        assert_eq!(clean_phone(Some("")), None);
        assert_eq!(clean_phone(None), None);
    }

    #[test]
    fn clean_name_colapsa_espacos() {
        assert_eq!(clean_name("  Maria   da  Silva "), "Maria da Silva");
    }

    #[test]
    fn lower_or_none_preserva_ausencia() {
        assert_eq!(lower_or_none(Some("Foo@Bar.COM")), Some("foo@bar.com".to_string()));
        assert_eq!(lower_or_none(Some("")), None);
        assert_eq!(lower_or_none(None), None);
    }
}
