//! Adaptadores HTTP para o agente local de automação de interface.
//!
//! O robô roda sem acesso direto a navegador ou janela: um agente local
//! expõe as primitivas de UI por HTTP e estes adaptadores as traduzem para
//! os traits de [`crate::automation`]. O agente é quem segura Selenium e os
//! drivers de janela; aqui só trafegam comandos e leituras tipadas.

pub mod browser;
pub mod desktop;

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::automation::DriverError;

pub use browser::BrowserAgent;
pub use desktop::DesktopAgent;

/// Valor único devolvido pelas leituras do agente; `null` significa "não
/// encontrado na tela".
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ValueResponse {
    pub value: Option<String>,
}

/// Cliente base compartilhado pelos dois adaptadores.
#[derive(Clone)]
pub(crate) struct AgentClient {
    client: Client,
    base_url: String,
}

impl AgentClient {
    pub(crate) fn new(base_url: impl Into<String>) -> Result<Self, DriverError> {
        // Comandos de UI esperam waits longos do lado do agente.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(180))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, DriverError> {
        let response = self.post_unchecked(path, body).await?;
        check(response).await
    }

    /// Variante sem tratamento de status, para chamadores que distinguem
    /// códigos específicos (ex.: 403 no launch do SIS MAMA).
    pub(crate) async fn post_unchecked<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, DriverError> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?)
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, DriverError> {
        Ok(self.post(path, body).await?.json::<R>().await?)
    }

    pub(crate) async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, DriverError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Ok(check(response).await?.json::<R>().await?)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, DriverError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "erro desconhecido".to_string());
    Err(DriverError::Driver(format!(
        "agente respondeu {status}: {message}"
    )))
}
