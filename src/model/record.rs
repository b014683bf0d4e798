//! Registro consolidado extraído do SHIFT (`ShiftData`).
//!
//! Os nomes de campo seguem o schema do backend, em português, porque o
//! payload é serializado exatamente como o painel espera. Campos textuais que
//! não puderam ser extraídos carregam o sentinela "Não especificado (NI)" em
//! vez de `null`, preservando o registro completo.

use serde::{Deserialize, Serialize};

use crate::normalize::{self, SENTINEL};

fn sentinel() -> String {
    SENTINEL.to_string()
}

/// Conjunto achatado de campos de um exame, criado pelo estágio SHIFT e
/// consumido como entrada somente-leitura pelo estágio SISMAMA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<i64>,
    #[serde(default)]
    pub os_number: String,
    #[serde(default)]
    pub nome_paciente: String,
    #[serde(default = "sentinel")]
    pub recipiente: String,
    #[serde(default)]
    pub idade_paciente: Option<u32>,
    #[serde(default = "sentinel")]
    pub raca_etinia: String,
    #[serde(default = "sentinel")]
    pub cartao_sus: String,
    /// Data de coleta em ISO 8601, ou `None` quando a extração não rendeu uma
    /// data válida.
    #[serde(default)]
    pub data_coleta: Option<String>,
    #[serde(default)]
    pub data_liberacao: Option<String>,
    #[serde(default = "sentinel")]
    pub tamanho_lesao: String,
    #[serde(default = "sentinel")]
    pub caracteristica_lesao: String,
    #[serde(default = "sentinel")]
    pub localizacao_lesao: String,
    #[serde(default)]
    pub data_nascimento: Option<String>,
    #[serde(default = "sentinel")]
    pub sexo: String,
    #[serde(default = "sentinel")]
    pub codigo_postal: String,
    #[serde(default = "sentinel")]
    pub logradouro: String,
    #[serde(default = "sentinel")]
    pub numero_residencial: String,
    #[serde(default = "sentinel")]
    pub cidade: String,
    #[serde(default = "sentinel")]
    pub estado: String,
    // Campos de resultado pertencem ao backend; o robô sempre envia null.
    #[serde(default)]
    pub status_shift: Option<String>,
    #[serde(default)]
    pub shift_result: Option<String>,
    #[serde(default)]
    pub sismama_result: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
}

/// Campos brutos recolhidos do SHIFT antes da normalização. `None` significa
/// "extrator não encontrou o campo"; a substituição pelo sentinela acontece
/// em [`ShiftData::from_extraction`], nunca dentro dos extratores.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub idade_paciente: Option<String>,
    pub raca_etinia: Option<String>,
    pub data_coleta: Option<String>,
    pub data_liberacao: Option<String>,
    pub tamanho_lesao: Option<String>,
    pub caracteristica_lesao: Option<String>,
    pub localizacao_lesao: Option<String>,
    pub data_nascimento: Option<String>,
    pub sexo: Option<String>,
    pub cartao_sus: Option<String>,
    pub codigo_postal: Option<String>,
    pub logradouro: Option<String>,
    pub numero_residencial: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
}

impl ShiftData {
    /// Monta o payload de upsert a partir da extração bruta, aplicando o
    /// sentinela a todo campo escalar ausente e normalizando as datas.
    pub fn from_extraction(
        task_id: i64,
        item_id: i64,
        os_number: &str,
        nome_paciente: &str,
        recipiente: &str,
        raw: Extraction,
    ) -> Self {
        let idade = raw
            .idade_paciente
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok());
        Self {
            task: Some(task_id),
            item: Some(item_id),
            os_number: os_number.to_string(),
            nome_paciente: nome_paciente.to_string(),
            recipiente: recipiente.to_string(),
            idade_paciente: idade,
            raca_etinia: normalize::or_sentinel(raw.raca_etinia),
            cartao_sus: normalize::or_sentinel(raw.cartao_sus),
            data_coleta: raw.data_coleta.as_deref().and_then(normalize::to_iso_datetime),
            data_liberacao: raw
                .data_liberacao
                .as_deref()
                .and_then(normalize::to_iso_datetime),
            tamanho_lesao: normalize::or_sentinel(raw.tamanho_lesao),
            caracteristica_lesao: normalize::or_sentinel(raw.caracteristica_lesao),
            localizacao_lesao: normalize::or_sentinel(raw.localizacao_lesao),
            data_nascimento: raw
                .data_nascimento
                .as_deref()
                .and_then(normalize::to_iso_datetime)
                .or_else(|| {
                    // Data de nascimento costuma vir sem horário.
                    raw.data_nascimento
                        .as_deref()
                        .and_then(parse_bare_date)
                }),
            sexo: normalize::or_sentinel(raw.sexo),
            codigo_postal: normalize::or_sentinel(raw.codigo_postal),
            logradouro: normalize::or_sentinel(raw.logradouro),
            numero_residencial: normalize::or_sentinel(raw.numero_residencial),
            cidade: normalize::or_sentinel(raw.cidade),
            estado: normalize::or_sentinel(raw.estado),
            status_shift: None,
            shift_result: None,
            sismama_result: None,
            stage: None,
        }
    }

    /// Verifica se os campos críticos para o cadastro no SIS MAMA estão
    /// presentes e não são o sentinela, e se o tamanho da lesão é um número
    /// positivo. Itens reprovados aqui nunca chegam ao formulário desktop.
    pub fn sufficient_for_sismama(&self) -> bool {
        let criticos = [&self.cartao_sus, &self.localizacao_lesao, &self.estado];
        criticos.iter().all(|campo| !normalize::is_unspecified(campo))
            && normalize::parse_size_cm(&self.tamanho_lesao).is_some_and(|cm| cm > 0.0)
    }
}

/// `DD/MM/YYYY` ou `YYYY-MM-DD` sem componente de hora → `YYYY-MM-DD`.
fn parse_bare_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if let Ok(d) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    chrono::NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_extraction() -> Extraction {
        Extraction {
            idade_paciente: Some("47".into()),
            raca_etinia: Some("Parda".into()),
            data_coleta: Some("01/03/2024 - 18:34:36".into()),
            data_liberacao: Some("05/03/2024 - 10:00:00".into()),
            tamanho_lesao: Some("1,5 cm".into()),
            caracteristica_lesao: Some("Mama direita".into()),
            localizacao_lesao: Some("QSL".into()),
            data_nascimento: Some("31/12/1976".into()),
            sexo: Some("Feminino".into()),
            cartao_sus: Some("700000000000000".into()),
            codigo_postal: Some("01310-100".into()),
            logradouro: Some("Av. Paulista".into()),
            numero_residencial: Some("1000".into()),
            cidade: Some("São Paulo".into()),
            estado: Some("SP".into()),
        }
    }

    #[test]
    fn complete_extraction_produces_full_record() {
        let data = ShiftData::from_extraction(7, 42, "12345-6", "MARIA", "2024000135", full_extraction());
        assert_eq!(data.task, Some(7));
        assert_eq!(data.item, Some(42));
        assert_eq!(data.idade_paciente, Some(47));
        assert_eq!(data.data_coleta.as_deref(), Some("2024-03-01T18:34:36"));
        assert_eq!(data.data_nascimento.as_deref(), Some("1976-12-31"));
        assert_eq!(data.estado, "SP");
    }

    #[test]
    fn missing_fields_become_sentinel_never_null() {
        let data = ShiftData::from_extraction(1, 2, "99", "ANA", "2024000001", Extraction::default());
        for campo in [
            &data.raca_etinia,
            &data.cartao_sus,
            &data.tamanho_lesao,
            &data.caracteristica_lesao,
            &data.localizacao_lesao,
            &data.sexo,
            &data.codigo_postal,
            &data.logradouro,
            &data.numero_residencial,
            &data.cidade,
            &data.estado,
        ] {
            assert_eq!(campo.as_str(), SENTINEL);
        }
        // Datas inválidas viram None, nunca texto lixo.
        assert_eq!(data.data_coleta, None);
        assert_eq!(data.idade_paciente, None);
    }

    #[test]
    fn sufficiency_requires_critical_fields_and_positive_size() {
        let mut data =
            ShiftData::from_extraction(1, 2, "99", "ANA", "2024000001", full_extraction());
        assert!(data.sufficient_for_sismama());

        data.tamanho_lesao = "0 cm".into();
        assert!(!data.sufficient_for_sismama());

        data.tamanho_lesao = "2,0 cm".into();
        data.cartao_sus = SENTINEL.into();
        assert!(!data.sufficient_for_sismama());
    }

    #[test]
    fn sufficiency_is_monotonic_in_critical_fields() {
        let mut data =
            ShiftData::from_extraction(1, 2, "99", "ANA", "2024000001", full_extraction());
        data.estado = SENTINEL.into();
        assert!(!data.sufficient_for_sismama());

        // Preencher o campo faltante só pode melhorar a situação.
        data.estado = "SP".into();
        assert!(data.sufficient_for_sismama());
    }

    #[test]
    fn deserializes_partial_backend_payload() {
        let json = r#"{"os_number": "12345-6", "cartao_sus": "700", "estado": "SP"}"#;
        let data: ShiftData = serde_json::from_str(json).unwrap();
        assert_eq!(data.os_number, "12345-6");
        assert_eq!(data.localizacao_lesao, SENTINEL);
        assert_eq!(data.data_coleta, None);
    }
}
