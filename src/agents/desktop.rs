//! Adaptador do desktop: janela do SIS MAMA controlada pelo agente local.
//!
//! O agente traduz os comandos para teclas e cliques (F2 abre cadastro, F5
//! salva, F6 cancela) e encerra o processo por nome (`SisMamaFB.exe`) no
//! terminate. A resposta 403 do launch sinaliza ausência de privilégio de
//! administrador.

use serde_json::json;

use super::{AgentClient, ValueResponse};
use crate::automation::{DriverError, FormAction, SismamaDesktop};

pub struct DesktopAgent {
    agent: AgentClient,
}

impl DesktopAgent {
    pub fn new(agent_url: impl Into<String>) -> Result<Self, DriverError> {
        Ok(Self {
            agent: AgentClient::new(agent_url)?,
        })
    }

    async fn dialog(&self, path: &str) -> Result<Option<String>, DriverError> {
        let response: ValueResponse = self.agent.get_json(path).await?;
        Ok(response.value)
    }
}

impl SismamaDesktop for DesktopAgent {
    async fn launch(&mut self) -> Result<(), DriverError> {
        let response = self.agent.post_unchecked("/sismama/launch", &json!({})).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(DriverError::AdminRequired);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "erro desconhecido".to_string());
        Err(DriverError::Launch(format!("{status}: {message}")))
    }

    async fn begin_entry(&mut self) -> Result<(), DriverError> {
        self.agent.post("/sismama/entry/begin", &json!({})).await?;
        Ok(())
    }

    async fn apply(&mut self, action: &FormAction) -> Result<(), DriverError> {
        self.agent.post("/sismama/action", action).await?;
        Ok(())
    }

    async fn date_dialog(&mut self) -> Result<Option<String>, DriverError> {
        self.dialog("/sismama/dialog/date").await
    }

    async fn cancel_entry(&mut self) -> Result<(), DriverError> {
        self.agent.post("/sismama/entry/cancel", &json!({})).await?;
        Ok(())
    }

    async fn save(&mut self) -> Result<(), DriverError> {
        self.agent.post("/sismama/save", &json!({})).await?;
        Ok(())
    }

    async fn info_dialog(&mut self) -> Result<Option<String>, DriverError> {
        self.dialog("/sismama/dialog/info").await
    }

    async fn terminate(&mut self) -> Result<(), DriverError> {
        self.agent.post("/sismama/terminate", &json!({})).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn forbidden_launch_maps_to_admin_required() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sismama/launch"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut agent = DesktopAgent::new(server.uri()).unwrap();
        let err = agent.launch().await.unwrap_err();
        assert!(matches!(err, DriverError::AdminRequired));
    }

    #[tokio::test]
    async fn actions_are_posted_with_their_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sismama/action"))
            .and(body_json(serde_json::json!({"write": "2078287"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut agent = DesktopAgent::new(server.uri()).unwrap();
        agent
            .apply(&FormAction::Write("2078287".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn absent_dialog_reads_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sismama/dialog/info"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": null})),
            )
            .mount(&server)
            .await;

        let mut agent = DesktopAgent::new(server.uri()).unwrap();
        assert_eq!(agent.info_dialog().await.unwrap(), None);
    }
}
