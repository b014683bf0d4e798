//! Roteiro de digitação do formulário "Requisição de Exame Histopatológico -
//! MAMA" do SIS MAMA.
//!
//! O formulário é navegado só por teclado, numa ordem de tabulação fixa, com
//! três exceções acionadas por clique em radio nomeado. O roteiro inteiro é
//! montado como dados ([`ScriptOp`]) antes de qualquer tecla ser enviada, o
//! que permite testar a sequência sem janela nenhuma.

use crate::automation::FormAction;
use crate::model::ShiftData;
use crate::normalize;

/// Um passo do roteiro: ou um grupo de ações rotulado pelo campo que
/// preenche, ou o ponto de verificação do diálogo de data inválida.
#[derive(Debug)]
pub enum ScriptOp {
    Step(FormStep),
    /// Após a data de coleta o SIS MAMA pode abrir um diálogo de crítica de
    /// data. O executor consulta o driver aqui e aborta o registro se o
    /// diálogo estiver presente.
    DateDialogCheck,
}

#[derive(Debug)]
pub struct FormStep {
    pub field: &'static str,
    pub actions: Vec<FormAction>,
}

impl FormStep {
    fn new(field: &'static str, actions: Vec<FormAction>) -> ScriptOp {
        ScriptOp::Step(FormStep { field, actions })
    }
}

/// Faixas do combo "tamanho da lesão". Os limites vêm das opções do próprio
/// formulário: a primeira faixa é marcada com espaço, as demais descendo a
/// lista.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    Under2,
    From2To5,
    From5To10,
    Over10,
}

impl SizeBucket {
    pub fn from_cm(cm: f64) -> SizeBucket {
        if cm < 2.0 {
            SizeBucket::Under2
        } else if cm <= 5.0 {
            SizeBucket::From2To5
        } else if cm <= 10.0 {
            SizeBucket::From5To10
        } else {
            SizeBucket::Over10
        }
    }

    fn action(self) -> FormAction {
        match self {
            SizeBucket::Under2 => FormAction::Space,
            SizeBucket::From2To5 => FormAction::Down(1),
            SizeBucket::From5To10 => FormAction::Down(2),
            SizeBucket::Over10 => FormAction::Down(3),
        }
    }
}

/// Opções de radio do quadro "Localização", na grafia exata dos controles.
fn localization_option(value: &str) -> Option<&'static str> {
    match value.to_uppercase().as_str() {
        "QSL" => Some("QSL"),
        "QIL" => Some("QIL"),
        "QSM" => Some("QSM"),
        "QIM" => Some("QIM"),
        "UQLAT" => Some("UQLat"),
        "UQSUP" => Some("UQsup"),
        "UQMED" => Some("UQmed"),
        "UQINF" => Some("UQinf"),
        "RRA" => Some("RRA"),
        "PA" => Some("PA"),
        _ => None,
    }
}

/// Sentinela vira a abreviação "NI" aceita pelos campos de texto livre.
fn ni(value: &str) -> String {
    if normalize::is_unspecified(value) {
        "NI".to_string()
    } else {
        value.trim().to_string()
    }
}

/// Monta o roteiro completo de um registro a partir dos dados extraídos.
///
/// A ordem dos passos espelha a ordem de tabulação do formulário; mudar a
/// ordem aqui quebra a digitação.
pub fn entry_script(
    data: &ShiftData,
    os_number: &str,
    cnes: &str,
    physician: &str,
) -> Vec<ScriptOp> {
    let mut ops = Vec::new();

    ops.push(FormStep::new(
        "cnes",
        vec![FormAction::Write(cnes.to_string()), FormAction::Tab(2)],
    ));

    if !normalize::is_unspecified(&data.cartao_sus) {
        ops.push(FormStep::new(
            "cartao_sus",
            vec![
                FormAction::Write(data.cartao_sus.trim().to_string()),
                FormAction::Tab(1),
            ],
        ));
    }

    let mut sexo_actions = match data.sexo.trim().to_lowercase().as_str() {
        "feminino" | "f" => vec![FormAction::Right(1)],
        "masculino" | "m" => vec![FormAction::Space],
        _ => Vec::new(),
    };
    sexo_actions.push(FormAction::Tab(1));
    ops.push(FormStep::new("sexo", sexo_actions));

    ops.push(FormStep::new(
        "nome_paciente",
        vec![
            FormAction::Write(data.nome_paciente.trim().to_string()),
            FormAction::Tab(2),
        ],
    ));
    ops.push(FormStep::new(
        "nome_mae",
        vec![FormAction::Write("NI".to_string()), FormAction::Tab(5)],
    ));

    let mut nascimento = Vec::new();
    if let Some(ddmmyyyy) = data
        .data_nascimento
        .as_deref()
        .and_then(normalize::to_ddmmyyyy)
    {
        nascimento.push(FormAction::Write(ddmmyyyy));
    }
    nascimento.push(FormAction::Tab(1));
    ops.push(FormStep::new("data_nascimento", nascimento));

    let idade = data
        .idade_paciente
        .map(|n| n.to_string())
        .unwrap_or_else(|| "0".to_string());
    ops.push(FormStep::new(
        "idade_paciente",
        vec![FormAction::Write(idade), FormAction::Tab(1)],
    ));

    if normalize::is_unspecified(&data.raca_etinia) {
        ops.push(FormStep::new("raca_etinia", vec![FormAction::Tab(1)]));
    } else {
        ops.push(FormStep::new(
            "raca_etinia",
            vec![FormAction::Write(data.raca_etinia.trim().to_string())],
        ));
    }

    // Bloco de endereço.
    ops.push(FormStep::new(
        "nacionalidade",
        vec![FormAction::Write("BRASIL".to_string()), FormAction::Tab(1)],
    ));
    ops.push(FormStep::new(
        "logradouro",
        vec![FormAction::Write(ni(&data.logradouro)), FormAction::Tab(1)],
    ));
    ops.push(FormStep::new(
        "numero_residencial",
        vec![
            FormAction::Write(ni(&data.numero_residencial)),
            FormAction::Tab(3),
        ],
    ));
    ops.push(FormStep::new(
        "uf",
        vec![
            FormAction::Write(data.estado.trim().to_string()),
            FormAction::Tab(1),
        ],
    ));
    let municipio = if normalize::is_unspecified(&data.cidade) {
        "NI".to_string()
    } else {
        normalize::strip_diacritics(&data.cidade.trim().to_uppercase())
    };
    ops.push(FormStep::new(
        "municipio",
        vec![FormAction::Write(municipio), FormAction::Tab(6)],
    ));

    // Três grupos de radio navegados por seta: "biópsia/peça", risco elevado
    // e gravidez/amamentação (ambos "não sabe").
    ops.push(FormStep::new(
        "anamnese",
        vec![
            FormAction::Right(2),
            FormAction::Tab(1),
            FormAction::Right(2),
            FormAction::Tab(1),
            FormAction::Right(2),
        ],
    ));
    ops.push(FormStep::new(
        "tratamento_anterior",
        vec![FormAction::Radio {
            panel: "4. Tratamento anterior para câncer de mama?",
            option: "Não".to_string(),
        }],
    ));

    // Características da lesão.
    ops.push(FormStep::new(
        "deteccao",
        vec![FormAction::Tab(1), FormAction::Space, FormAction::Tab(1)],
    ));
    let mama = if data.caracteristica_lesao.trim().to_lowercase() == "mama direita" {
        "MAMA DIREITA"
    } else {
        "MAMA ESQUERDA"
    };
    ops.push(FormStep::new(
        "caracteristica_lesao",
        vec![
            FormAction::Radio {
                panel: "6. Características da lesão",
                option: mama.to_string(),
            },
            FormAction::Tab(1),
        ],
    ));

    let mut localizacao = Vec::new();
    if let Some(option) = localization_option(&data.localizacao_lesao) {
        localizacao.push(FormAction::Radio {
            panel: "Localização",
            option: option.to_string(),
        });
    }
    localizacao.push(FormAction::Tab(1));
    ops.push(FormStep::new("localizacao_lesao", localizacao));

    let mut tamanho = Vec::new();
    if let Some(cm) = normalize::parse_size_cm(&data.tamanho_lesao) {
        tamanho.push(SizeBucket::from_cm(cm).action());
    }
    tamanho.push(FormAction::Tab(1));
    ops.push(FormStep::new("tamanho_lesao", tamanho));

    ops.push(FormStep::new(
        "linfonodo_e_biopsia",
        vec![
            FormAction::Down(1),
            FormAction::Tab(1),
            FormAction::Down(2),
            FormAction::Tab(1),
        ],
    ));

    // Bloco de coleta.
    let coleta = data
        .data_coleta
        .as_deref()
        .and_then(normalize::to_ddmmyyyy);
    let mut coleta_actions = Vec::new();
    if let Some(ddmmyyyy) = coleta.clone() {
        coleta_actions.push(FormAction::Write(ddmmyyyy));
    }
    coleta_actions.push(FormAction::Tab(1));
    ops.push(FormStep::new("data_coleta", coleta_actions));

    ops.push(ScriptOp::DateDialogCheck);

    let numero_exame: String = os_number.chars().filter(|ch| *ch != '-').collect();
    ops.push(FormStep::new(
        "numero_exame",
        vec![FormAction::Tab(2), FormAction::Write(numero_exame)],
    ));

    let mut recebido = vec![FormAction::Tab(1)];
    if let Some(ddmmyyyy) = coleta {
        recebido.push(FormAction::Write(ddmmyyyy));
    }
    ops.push(FormStep::new("recebido_em", recebido));

    ops.push(FormStep::new(
        "material_e_adequacao",
        vec![
            FormAction::Tab(1),
            FormAction::Down(2),
            FormAction::Tab(1),
            FormAction::Space,
            FormAction::Tab(2),
            FormAction::Right(1),
            FormAction::Tab(1),
            FormAction::Down(10),
            FormAction::Space,
            FormAction::Tab(2),
            FormAction::Right(1),
            FormAction::Enter,
            FormAction::Tab(1),
        ],
    ));

    let mut liberacao = Vec::new();
    if let Some(ddmmyyyy) = data
        .data_liberacao
        .as_deref()
        .and_then(normalize::to_ddmmyyyy)
    {
        liberacao.push(FormAction::Write(ddmmyyyy));
    }
    liberacao.push(FormAction::Tab(1));
    ops.push(FormStep::new("data_liberacao", liberacao));

    ops.push(FormStep::new(
        "medico_responsavel",
        vec![FormAction::Write(physician.to_string())],
    ));

    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Extraction;

    fn sample_data() -> ShiftData {
        ShiftData::from_extraction(
            1,
            2,
            "12345-6",
            "MARIA DA SILVA",
            "2024000135",
            Extraction {
                idade_paciente: Some("47".into()),
                raca_etinia: Some("Parda".into()),
                data_coleta: Some("01/03/2024 - 18:34:36".into()),
                data_liberacao: Some("05/03/2024 - 10:00:00".into()),
                tamanho_lesao: Some("1,5 cm".into()),
                caracteristica_lesao: Some("Mama direita".into()),
                localizacao_lesao: Some("uqlat".into()),
                data_nascimento: Some("31/12/1976".into()),
                sexo: Some("Feminino".into()),
                cartao_sus: Some("700000000000000".into()),
                codigo_postal: Some("01310-100".into()),
                logradouro: Some("Av. Paulista".into()),
                numero_residencial: Some("1000".into()),
                cidade: Some("São Paulo".into()),
                estado: Some("SP".into()),
            },
        )
    }

    fn actions_of<'a>(ops: &'a [ScriptOp], field: &str) -> &'a [FormAction] {
        ops.iter()
            .find_map(|op| match op {
                ScriptOp::Step(step) if step.field == field => Some(step.actions.as_slice()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("passo {field} ausente"))
    }

    #[test]
    fn size_buckets_match_form_options() {
        assert_eq!(SizeBucket::from_cm(0.5), SizeBucket::Under2);
        assert_eq!(SizeBucket::from_cm(1.9), SizeBucket::Under2);
        assert_eq!(SizeBucket::from_cm(2.0), SizeBucket::From2To5);
        assert_eq!(SizeBucket::from_cm(5.0), SizeBucket::From2To5);
        assert_eq!(SizeBucket::from_cm(5.1), SizeBucket::From5To10);
        assert_eq!(SizeBucket::from_cm(10.0), SizeBucket::From5To10);
        assert_eq!(SizeBucket::from_cm(10.1), SizeBucket::Over10);
    }

    #[test]
    fn date_dialog_check_follows_data_coleta() {
        let ops = entry_script(&sample_data(), "12345-6", "2078287", "10304501883");
        let coleta_pos = ops
            .iter()
            .position(|op| matches!(op, ScriptOp::Step(s) if s.field == "data_coleta"))
            .unwrap();
        assert!(matches!(ops[coleta_pos + 1], ScriptOp::DateDialogCheck));
    }

    #[test]
    fn exam_number_drops_hyphens() {
        let ops = entry_script(&sample_data(), "12345-6", "2078287", "10304501883");
        let actions = actions_of(&ops, "numero_exame");
        assert!(actions.contains(&FormAction::Write("123456".into())));
    }

    #[test]
    fn dates_are_typed_as_ddmmyyyy() {
        let ops = entry_script(&sample_data(), "12345-6", "2078287", "10304501883");
        assert!(
            actions_of(&ops, "data_coleta").contains(&FormAction::Write("01032024".into()))
        );
        assert!(
            actions_of(&ops, "data_nascimento")
                .contains(&FormAction::Write("31121976".into()))
        );
        assert!(
            actions_of(&ops, "data_liberacao")
                .contains(&FormAction::Write("05032024".into()))
        );
    }

    #[test]
    fn municipio_is_uppercased_without_diacritics() {
        let ops = entry_script(&sample_data(), "12345-6", "2078287", "10304501883");
        assert!(
            actions_of(&ops, "municipio").contains(&FormAction::Write("SAO PAULO".into()))
        );
    }

    #[test]
    fn localization_uses_form_spelling() {
        let ops = entry_script(&sample_data(), "12345-6", "2078287", "10304501883");
        let actions = actions_of(&ops, "localizacao_lesao");
        assert!(actions.iter().any(|a| matches!(
            a,
            FormAction::Radio { panel: "Localização", option } if option == "UQLat"
        )));
    }

    #[test]
    fn small_lesion_marks_first_bucket() {
        let ops = entry_script(&sample_data(), "12345-6", "2078287", "10304501883");
        assert_eq!(
            actions_of(&ops, "tamanho_lesao"),
            &[FormAction::Space, FormAction::Tab(1)]
        );
    }

    #[test]
    fn unknown_localization_still_advances_focus() {
        let mut data = sample_data();
        data.localizacao_lesao = "CENTRO".into();
        let ops = entry_script(&data, "12345-6", "2078287", "10304501883");
        assert_eq!(actions_of(&ops, "localizacao_lesao"), &[FormAction::Tab(1)]);
    }

    #[test]
    fn female_sex_moves_right_male_presses_space() {
        let ops = entry_script(&sample_data(), "12345-6", "2078287", "10304501883");
        assert_eq!(
            actions_of(&ops, "sexo"),
            &[FormAction::Right(1), FormAction::Tab(1)]
        );

        let mut data = sample_data();
        data.sexo = "M".into();
        let ops = entry_script(&data, "12345-6", "2078287", "10304501883");
        assert_eq!(
            actions_of(&ops, "sexo"),
            &[FormAction::Space, FormAction::Tab(1)]
        );
    }
}
