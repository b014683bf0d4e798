//! Adaptador do navegador: sessão do SHIFT controlada pelo agente local.

use serde_json::json;

use super::{AgentClient, ValueResponse};
use crate::automation::{DriverError, Panel, SearchOutcome, ShiftBrowser, ShiftField};

pub struct BrowserAgent {
    agent: AgentClient,
}

#[derive(Debug, serde::Deserialize)]
struct SearchResponse {
    found: bool,
    #[serde(default)]
    alert: Option<String>,
}

impl BrowserAgent {
    pub fn new(agent_url: impl Into<String>) -> Result<Self, DriverError> {
        Ok(Self {
            agent: AgentClient::new(agent_url)?,
        })
    }
}

impl ShiftBrowser for BrowserAgent {
    async fn open_session(&mut self) -> Result<(), DriverError> {
        self.agent.post("/shift/session/open", &json!({})).await?;
        Ok(())
    }

    async fn search_os(&mut self, os_number: &str) -> Result<SearchOutcome, DriverError> {
        let response: SearchResponse = self
            .agent
            .post_json("/shift/search", &json!({"os_number": os_number}))
            .await?;
        if response.found {
            Ok(SearchOutcome::Found)
        } else {
            Ok(SearchOutcome::NotFound {
                alert: response.alert.unwrap_or_default(),
            })
        }
    }

    async fn patient_name(&mut self) -> Result<Option<String>, DriverError> {
        let response: ValueResponse = self.agent.get_json("/shift/patient-name").await?;
        Ok(response.value)
    }

    async fn receptacle_prefix(&mut self) -> Result<Option<String>, DriverError> {
        let response: ValueResponse = self.agent.get_json("/shift/receptacle").await?;
        Ok(response.value)
    }

    async fn open_panel(&mut self, panel: Panel) -> Result<(), DriverError> {
        self.agent
            .post("/shift/panel/open", &json!({"panel": panel.as_str()}))
            .await?;
        Ok(())
    }

    async fn close_panel(&mut self, panel: Panel) -> Result<(), DriverError> {
        self.agent
            .post("/shift/panel/close", &json!({"panel": panel.as_str()}))
            .await?;
        Ok(())
    }

    async fn read_field(&mut self, field: ShiftField) -> Result<Option<String>, DriverError> {
        let response: ValueResponse = self
            .agent
            .get_json(&format!("/shift/field/{}", field.as_str()))
            .await?;
        Ok(response.value)
    }

    async fn release(&mut self) -> Result<(), DriverError> {
        self.agent.post("/shift/session/release", &json!({})).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_maps_found_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/shift/search"))
            .and(body_json(serde_json::json!({"os_number": "12345-6"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "found": false,
                "alert": "O.S. inexistente"
            })))
            .mount(&server)
            .await;

        let mut agent = BrowserAgent::new(server.uri()).unwrap();
        match agent.search_os("12345-6").await.unwrap() {
            SearchOutcome::NotFound { alert } => assert_eq!(alert, "O.S. inexistente"),
            SearchOutcome::Found => panic!("esperava NotFound"),
        }
    }

    #[tokio::test]
    async fn missing_field_reads_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shift/field/cartao_sus"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": null})),
            )
            .mount(&server)
            .await;

        let mut agent = BrowserAgent::new(server.uri()).unwrap();
        assert_eq!(agent.read_field(ShiftField::CartaoSus).await.unwrap(), None);
    }

    #[tokio::test]
    async fn agent_failure_becomes_driver_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/shift/session/open"))
            .respond_with(ResponseTemplate::new(500).set_body_string("sessão caiu"))
            .mount(&server)
            .await;

        let mut agent = BrowserAgent::new(server.uri()).unwrap();
        let err = agent.open_session().await.unwrap_err();
        assert!(matches!(err, DriverError::Driver(_)));
    }
}
