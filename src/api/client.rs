//! Cliente HTTP da API do painel (fila de tarefas, itens e alertas).

use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::auth::{self, TokenPair};
use super::error::ApiError;
use crate::model::item::RawPending;
use crate::model::{Alert, ItemPatch, Pending, ShiftData, SismamaRecord, Stage, Task, TaskPatch};

pub struct ApiClient {
    client: Client,
    base_url: String,
    // Token de acesso atual. Renovado in-place quando o backend responde 401
    // no meio de uma execução; o lock nunca é segurado através de um await.
    access: Mutex<String>,
    refresh: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenPair) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access: Mutex::new(tokens.access),
            refresh: tokens.refresh,
        })
    }

    fn bearer(&self) -> String {
        match self.access.lock() {
            Ok(token) => format!("Bearer {token}"),
            Err(poisoned) => format!("Bearer {}", poisoned.into_inner()),
        }
    }

    fn store_access(&self, token: String) {
        match self.access.lock() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    /// Dispara a requisição; em caso de 401 renova o token uma vez e repete.
    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        for attempt in 0..2 {
            let url = format!("{}{}", self.base_url, path);
            let mut builder = self
                .client
                .request(method.clone(), &url)
                .header("Authorization", self.bearer());
            if let Some(body) = body {
                builder = builder.json(body);
            }
            let response = builder.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && attempt == 0 {
                debug!("token de acesso recusado, renovando");
                let access =
                    auth::refresh_access(&self.client, &self.base_url, &self.refresh).await?;
                self.store_access(access);
                continue;
            }
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ApiError::Unauthorized {
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "erro desconhecido".to_string());
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                });
            }
            return Ok(response);
        }
        unreachable!("loop retorna na segunda iteração")
    }

    async fn get_pending<T: DeserializeOwned>(&self, path: &str) -> Result<Pending<T>, ApiError> {
        let response = self.request::<()>(Method::GET, path, None).await?;
        let raw = response.json::<RawPending<T>>().await?;
        let (pending, detail) = raw.normalize();
        if let Some(detail) = detail {
            debug!(detail, "fila vazia");
        }
        Ok(pending)
    }

    /// Tarefas pendentes de um estágio (`GET /items/by-stage/?stage=`).
    pub async fn pending_by_stage(&self, stage: Stage) -> Result<Pending<Task>, ApiError> {
        self.get_pending(&format!("/items/by-stage/?stage={}", stage.as_str()))
            .await
    }

    /// Itens liberados para digitação (`GET /items/sismama-data/`).
    pub async fn sismama_data(&self) -> Result<Pending<SismamaRecord>, ApiError> {
        self.get_pending("/items/sismama-data/").await
    }

    /// Grava (ou regrava) os dados extraídos de um item
    /// (`POST /items/{id}/shift-data/`, upsert no backend).
    pub async fn upsert_shift_data(
        &self,
        item_id: i64,
        data: &ShiftData,
    ) -> Result<(), ApiError> {
        self.request(
            Method::POST,
            &format!("/items/{item_id}/shift-data/"),
            Some(data),
        )
        .await?;
        Ok(())
    }

    /// Atualização parcial de tarefa (`PATCH /tasks/{id}/update-task/`).
    pub async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> Result<(), ApiError> {
        self.request(
            Method::PATCH,
            &format!("/tasks/{task_id}/update-task/"),
            Some(patch),
        )
        .await?;
        Ok(())
    }

    /// Atualização parcial de item (`PATCH /items/{id}/`).
    pub async fn update_item(&self, item_id: i64, patch: &ItemPatch) -> Result<(), ApiError> {
        self.request(Method::PATCH, &format!("/items/{item_id}/"), Some(patch))
            .await?;
        Ok(())
    }

    /// Publica um alerta no painel (`POST /alerts/create/`).
    ///
    /// Melhor esforço: falha vira log de warning, nunca interrompe a
    /// execução. Alertas não são persistidos localmente nem reenviados.
    pub async fn send_alert(&self, alert: &Alert) {
        if let Err(err) = self
            .request(Method::POST, "/alerts/create/", Some(alert))
            .await
        {
            warn!(%err, tipo = ?alert.alert_type, "falha ao enviar alerta");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertType, Status};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tokens() -> TokenPair {
        TokenPair {
            access: "acc".into(),
            refresh: "ref".into(),
        }
    }

    #[tokio::test]
    async fn pending_by_stage_sends_bearer_and_stage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/by-stage/"))
            .and(query_param("stage", "SHIFT"))
            .and(header("Authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "items": [{"id": 10, "os_number": "123-4"}]}
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), tokens()).unwrap();
        let pending = client.pending_by_stage(Stage::Shift).await.unwrap();
        match pending {
            Pending::Batch(tasks) => assert_eq!(tasks[0].items[0].id, 10),
            Pending::Empty => panic!("expected batch"),
        }
    }

    #[tokio::test]
    async fn detail_body_means_empty_queue() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/sismama-data/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "detail": "Nenhum item encontrado."
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), tokens()).unwrap();
        let pending = client.sismama_data().await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/by-stage/"))
            .and(header("Authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/login/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access": "acc-novo"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items/by-stage/"))
            .and(header("Authorization", "Bearer acc-novo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), tokens()).unwrap();
        let pending = client.pending_by_stage(Stage::Sismama).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn update_item_patches_only_set_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/items/42/"))
            .and(wiremock::matchers::body_json(serde_json::json!({
                "status": "STARTED",
                "stage": "SHIFT"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), tokens()).unwrap();
        let patch = ItemPatch {
            status: Some(Status::Started),
            stage: Some(Stage::Shift),
            ..ItemPatch::default()
        };
        client.update_item(42, &patch).await.unwrap();
    }

    #[tokio::test]
    async fn send_alert_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alerts/create/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), tokens()).unwrap();
        let alert = Alert::new(1, AlertType::Erro, "falhou");
        // Não retorna erro mesmo com 500.
        client.send_alert(&alert).await;
    }
}
