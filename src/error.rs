use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;
use crate::automation::DriverError;

/// Erros de nível de execução do robô.
#[derive(Debug, Error)]
pub enum RobotError {
    #[error("erro de configuração: {0}")]
    Config(String),

    #[error("falha na autenticação da API. Verifique as credenciais.")]
    Auth,

    #[error("outra execução está em andamento (trava em {0})")]
    LockHeld(PathBuf),

    #[error("erro da API do painel: {0}")]
    Api(#[from] ApiError),

    #[error("erro do driver de interface: {0}")]
    Driver(#[from] DriverError),

    #[error("erro de HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro ao ler TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
