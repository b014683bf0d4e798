//! Fronteira de automação de interface: os traits que o pipeline enxerga e os
//! tipos trocados com os drivers de navegador (SHIFT) e de desktop (SIS MAMA).
//!
//! O pipeline nunca fala com navegador ou janela diretamente; ele compõe
//! ações de alto nível e as entrega a implementações destes traits. Em
//! produção as implementações ficam em [`crate::agents`]; nos testes, mocks
//! locais gravam as chamadas recebidas.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Falhas na camada de automação de interface.
#[derive(Debug, Error)]
pub enum DriverError {
    /// O SIS MAMA recusou a abertura por falta de privilégio de administrador.
    #[error("privilégios de administrador ausentes")]
    AdminRequired,

    /// A aplicação alvo não subiu (executável ausente, janela não apareceu).
    #[error("falha ao abrir a aplicação: {0}")]
    Launch(String),

    /// O driver reportou uma falha de execução (elemento não encontrado,
    /// sessão perdida).
    #[error("falha do driver: {0}")]
    Driver(String),

    #[error("erro de rede: {0}")]
    Network(#[from] reqwest::Error),

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),
}

/// Resultado de uma busca de O.S. no SHIFT.
#[derive(Debug)]
pub enum SearchOutcome {
    Found,
    /// A O.S. não existe; `alert` carrega o texto exibido pelo sistema.
    NotFound { alert: String },
}

/// Painéis do laudo do SHIFT. Cada campo mora em exatamente um painel, que
/// precisa estar aberto para o campo ser lido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Procedimentos,
    Exame,
    Manutencao,
    Endereco,
}

impl Panel {
    pub fn as_str(self) -> &'static str {
        match self {
            Panel::Procedimentos => "procedimentos",
            Panel::Exame => "exame",
            Panel::Manutencao => "manutencao",
            Panel::Endereco => "endereco",
        }
    }
}

/// Campos do laudo lidos durante a extração, nomeados como o driver os
/// localiza na página.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftField {
    IdadePaciente,
    RacaEtinia,
    DataColeta,
    DataLiberacao,
    TamanhoLesao,
    CaracteristicaLesao,
    LocalizacaoLesao,
    DataNascimento,
    Sexo,
    CartaoSus,
    CodigoPostal,
    Logradouro,
    NumeroResidencial,
    Cidade,
    Estado,
}

impl ShiftField {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftField::IdadePaciente => "idade_paciente",
            ShiftField::RacaEtinia => "raca_etinia",
            ShiftField::DataColeta => "data_coleta",
            ShiftField::DataLiberacao => "data_liberacao",
            ShiftField::TamanhoLesao => "tamanho_lesao",
            ShiftField::CaracteristicaLesao => "caracteristica_lesao",
            ShiftField::LocalizacaoLesao => "localizacao_lesao",
            ShiftField::DataNascimento => "data_nascimento",
            ShiftField::Sexo => "sexo",
            ShiftField::CartaoSus => "cartao_sus",
            ShiftField::CodigoPostal => "codigo_postal",
            ShiftField::Logradouro => "logradouro",
            ShiftField::NumeroResidencial => "numero_residencial",
            ShiftField::Cidade => "cidade",
            ShiftField::Estado => "estado",
        }
    }
}

/// Ação primitiva aplicada ao formulário do SIS MAMA. O formulário só é
/// navegável por teclado, então tudo se reduz a digitação e teclas de
/// movimento.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormAction {
    /// Digita o texto no campo com foco.
    Write(String),
    /// Pressiona Tab `n` vezes.
    Tab(u8),
    /// Pressiona a barra de espaço (marca checkbox/radio com foco).
    Space,
    /// Pressiona seta para baixo `n` vezes (seleção em combo).
    Down(u8),
    /// Pressiona seta para a direita `n` vezes (grupos de radio).
    Right(u8),
    Enter,
    /// Seleciona um radio nomeado dentro de um painel do formulário.
    Radio {
        panel: &'static str,
        option: String,
    },
}

/// Sessão de extração no SHIFT. Uma sessão cobre uma O.S. do início ao fim;
/// `release` devolve o navegador à tela de busca e é chamada sempre, inclusive
/// após erro.
pub trait ShiftBrowser {
    async fn open_session(&mut self) -> Result<(), DriverError>;
    async fn search_os(&mut self, os_number: &str) -> Result<SearchOutcome, DriverError>;
    /// Nome do paciente exibido no resultado da busca.
    async fn patient_name(&mut self) -> Result<Option<String>, DriverError>;
    /// Prefixo do recipiente (código de frasco) associado à O.S.
    async fn receptacle_prefix(&mut self) -> Result<Option<String>, DriverError>;
    async fn open_panel(&mut self, panel: Panel) -> Result<(), DriverError>;
    async fn close_panel(&mut self, panel: Panel) -> Result<(), DriverError>;
    /// Lê um campo do painel aberto. `Ok(None)` significa campo ausente na
    /// página, que o chamador degrada para o sentinela.
    async fn read_field(&mut self, field: ShiftField) -> Result<Option<String>, DriverError>;
    async fn release(&mut self) -> Result<(), DriverError>;
}

/// Controle da janela do SIS MAMA. `terminate` derruba o processo e é chamado
/// ao fim do estágio mesmo quando a digitação falhou.
pub trait SismamaDesktop {
    async fn launch(&mut self) -> Result<(), DriverError>;
    /// Abre um registro novo (F2 na tela principal).
    async fn begin_entry(&mut self) -> Result<(), DriverError>;
    async fn apply(&mut self, action: &FormAction) -> Result<(), DriverError>;
    /// Texto do diálogo de data inválida, se algum estiver aberto.
    async fn date_dialog(&mut self) -> Result<Option<String>, DriverError>;
    /// Cancela o registro em edição (F6).
    async fn cancel_entry(&mut self) -> Result<(), DriverError>;
    /// Salva o registro em edição (F5).
    async fn save(&mut self) -> Result<(), DriverError>;
    /// Texto do diálogo de crítica pós-salvamento, se algum apareceu.
    async fn info_dialog(&mut self) -> Result<Option<String>, DriverError>;
    async fn terminate(&mut self) -> Result<(), DriverError>;
}

/// Transcrição de rótulo de frasco a partir de uma imagem.
pub trait VisionAnalyzer {
    /// `Ok(None)` quando o modelo não devolveu texto utilizável.
    async fn transcribe(&self, image: &Path) -> Result<Option<String>, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_action_wire_shape() {
        let write = serde_json::to_value(FormAction::Write("MARIA".into())).unwrap();
        assert_eq!(write, serde_json::json!({"write": "MARIA"}));

        let tab = serde_json::to_value(FormAction::Tab(3)).unwrap();
        assert_eq!(tab, serde_json::json!({"tab": 3}));

        let radio = serde_json::to_value(FormAction::Radio {
            panel: "localizacao",
            option: "QSL".into(),
        })
        .unwrap();
        assert_eq!(
            radio,
            serde_json::json!({"radio": {"panel": "localizacao", "option": "QSL"}})
        );
    }

    #[test]
    fn unit_actions_serialize_as_strings() {
        assert_eq!(
            serde_json::to_value(FormAction::Space).unwrap(),
            serde_json::json!("space")
        );
        assert_eq!(
            serde_json::to_value(FormAction::Enter).unwrap(),
            serde_json::json!("enter")
        );
    }

    #[test]
    fn field_names_match_driver_contract() {
        assert_eq!(ShiftField::CartaoSus.as_str(), "cartao_sus");
        assert_eq!(ShiftField::NumeroResidencial.as_str(), "numero_residencial");
        assert_eq!(Panel::Endereco.as_str(), "endereco");
    }
}
