use serde::{Deserialize, Serialize};

use super::record::ShiftData;
use super::stage::{Stage, Status};
use crate::normalize::now_iso;

/// Unidade de trabalho devolvida pela busca por estágio. Criada pelo backend
/// e alterada por este robô somente através de patches de status.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Subunidade de uma [`Task`]: uma ordem de exame, identificada pelo número
/// externo ("O.S."), carregando os dados acumulados pelos estágios.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(default)]
    pub os_number: Option<String>,
    #[serde(default)]
    pub os_name: Option<String>,
    #[serde(default)]
    pub shift_data: Option<ShiftData>,
}

/// Item autorizado para digitação no SIS MAMA, como devolvido por
/// `/items/sismama-data/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SismamaRecord {
    #[serde(alias = "id")]
    pub item_id: i64,
    #[serde(default)]
    pub os_number: String,
    #[serde(default)]
    pub shift_data: Option<ShiftData>,
}

/// Resultado de uma busca de pendências com as duas formas de vazio do
/// backend (o marcador `{"detail": ...}` ou a lista vazia) colapsadas numa
/// variante só; os handlers nunca inspecionam a forma da resposta.
#[derive(Debug)]
pub enum Pending<T> {
    Empty,
    Batch(Vec<T>),
}

impl<T> Pending<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Pending::Empty)
    }
}

/// Forma bruta da resposta de pendências; normalizada em [`Pending`] na
/// fronteira do cliente da API.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPending<T> {
    Detail { detail: String },
    Batch(Vec<T>),
}

impl<T> RawPending<T> {
    pub(crate) fn normalize(self) -> (Pending<T>, Option<String>) {
        match self {
            RawPending::Detail { detail } => (Pending::Empty, Some(detail)),
            RawPending::Batch(items) if items.is_empty() => (Pending::Empty, None),
            RawPending::Batch(items) => (Pending::Batch(items), None),
        }
    }
}

/// Atualização parcial para `PATCH /tasks/{id}/update-task/`. Só os campos
/// preenchidos entram na requisição.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_result: Option<String>,
}

impl TaskPatch {
    /// Marca a tarefa como iniciada agora, com a linha de resultado visível
    /// no painel.
    pub fn started(stage: Stage, shift_result: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Started),
            stage: Some(stage),
            started_at: Some(now_iso()),
            shift_result: Some(shift_result.into()),
        }
    }

    pub fn error(shift_result: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Error),
            shift_result: Some(shift_result.into()),
            ..Self::default()
        }
    }
}

/// Atualização parcial para `PATCH /items/{id}/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sismama_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl ItemPatch {
    pub fn started(stage: Stage) -> Self {
        Self {
            status: Some(Status::Started),
            stage: Some(stage),
            started_at: Some(now_iso()),
            ..Self::default()
        }
    }

    /// Erro terminal do item, com a mensagem voltada ao operador.
    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            status: Some(Status::Error),
            stage: Some(stage),
            ended_at: Some(now_iso()),
            bot_error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Registro de notificação enviado a `POST /alerts/create/`. Disparo único,
/// melhor esforço, sem persistência local.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub robot: i64,
    pub alert_type: AlertType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Alert {
    pub fn new(robot: i64, alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            robot,
            alert_type,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Severidades aceitas pelo painel, serializadas exatamente como o schema do
/// backend as grafa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    Informacao,
    Erro,
    Sucesso,
    Alerta,
    Debug,
    Timeout,
    Validacao,
    Interrupcao,
}
