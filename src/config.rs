//! Configuração do robô carregada a partir de `robo.toml`.
//!
//! A struct [`RobotConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis. Variáveis de
//! ambiente têm precedência sobre o arquivo; credenciais vêm somente do
//! ambiente, nunca do arquivo.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::RobotError;

/// Configuração de nível superior carregada de `robo.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct RobotConfig {
    /// URL base da API do painel.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Identificador deste robô nos alertas do painel.
    #[serde(default = "default_robot_id")]
    pub robot_id: i64,

    /// Diretório onde chegam as imagens escaneadas dos frascos.
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// URL do agente local de automação de interface.
    #[serde(default = "default_agent_url")]
    pub agent_url: String,

    /// Arquivo de trava que impede execuções sobrepostas.
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,

    /// Chave da API de visão.
    #[serde(default)]
    pub openai_api_key: String,

    /// Modelo de visão usado na transcrição dos formulários.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// CNES do prestador digitado no SIS MAMA.
    #[serde(default = "default_cnes")]
    pub cnes: String,

    /// CPF do médico responsável digitado no SIS MAMA.
    #[serde(default = "default_medico_responsavel")]
    pub medico_responsavel: String,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_robot_id() -> i64 {
    1
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images/afip")
}

fn default_agent_url() -> String {
    "http://127.0.0.1:7070".to_string()
}

fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join("rpa-mama.lock")
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_cnes() -> String {
    "2078287".to_string()
}

fn default_medico_responsavel() -> String {
    "10304501883".to_string()
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            robot_id: default_robot_id(),
            image_dir: default_image_dir(),
            agent_url: default_agent_url(),
            lock_path: default_lock_path(),
            openai_api_key: String::new(),
            vision_model: default_vision_model(),
            cnes: default_cnes(),
            medico_responsavel: default_medico_responsavel(),
        }
    }
}

impl RobotConfig {
    /// Carrega a configuração do arquivo indicado. Usa valores padrão se o
    /// arquivo não existir; variáveis de ambiente têm precedência em ambos os
    /// casos.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<RobotConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo.
        if let Ok(url) = std::env::var("API_URL")
            && !url.is_empty()
        {
            config.api_url = url;
        }
        if let Ok(id) = std::env::var("ROBOT_ID")
            && let Ok(id) = id.parse::<i64>()
        {
            config.robot_id = id;
        }
        if let Ok(dir) = std::env::var("BASE_IMAGE_PATH")
            && !dir.is_empty()
        {
            config.image_dir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            config.openai_api_key = key;
        }
        if let Ok(url) = std::env::var("AGENT_URL")
            && !url.is_empty()
        {
            config.agent_url = url;
        }

        Ok(config)
    }

    /// Credenciais da API do painel, exigidas do ambiente a cada execução.
    pub fn api_credentials(&self) -> Result<(String, String), RobotError> {
        let username = std::env::var("API_USERNAME")
            .map_err(|_| RobotError::Config("API_USERNAME não definida no ambiente".into()))?;
        let password = std::env::var("API_PASSWORD")
            .map_err(|_| RobotError::Config("API_PASSWORD não definida no ambiente".into()))?;
        Ok((username, password))
    }
}
