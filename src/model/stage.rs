use std::fmt;

use serde::{Deserialize, Serialize};

/// Os quatro estágios do pipeline.
///
/// Cada item percorre SHIFT → IMAGE_PROCESS → SISMAMA → COMPLETED. O estágio
/// de um item só avança; um item com falha termina onde está com o status
/// [`Status::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Shift,
    ImageProcess,
    Sismama,
    Completed,
}

impl Stage {
    /// Estágio para o qual um item avança ao concluir este.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Shift => Some(Stage::ImageProcess),
            Stage::ImageProcess => Some(Stage::Sismama),
            Stage::Sismama => Some(Stage::Completed),
            Stage::Completed => None,
        }
    }

    /// Nome usado na query string e nos logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Shift => "SHIFT",
            Stage::ImageProcess => "IMAGE_PROCESS",
            Stage::Sismama => "SISMAMA",
            Stage::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Situação de uma tarefa ou item dentro de um estágio.
///
/// PENDING é quase sempre implícito (pendente é o que a fila devolve);
/// STARTED é sempre seguido de exatamente um COMPLETED ou ERROR para uma
/// dada transição de estágio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Started,
    Completed,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pending => "PENDING",
            Status::Started => "STARTED",
            Status::Completed => "COMPLETED",
            Status::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_monotonic() {
        assert_eq!(Stage::Shift.next(), Some(Stage::ImageProcess));
        assert_eq!(Stage::ImageProcess.next(), Some(Stage::Sismama));
        assert_eq!(Stage::Sismama.next(), Some(Stage::Completed));
        assert_eq!(Stage::Completed.next(), None);
    }

    #[test]
    fn stage_wire_names() {
        assert_eq!(
            serde_json::to_string(&Stage::ImageProcess).unwrap(),
            "\"IMAGE_PROCESS\""
        );
        let parsed: Stage = serde_json::from_str("\"SHIFT\"").unwrap();
        assert_eq!(parsed, Stage::Shift);
        assert_eq!(Stage::Sismama.to_string(), "SISMAMA");
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::Started).unwrap(), "\"STARTED\"");
        let parsed: Status = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(parsed, Status::Error);
    }
}
