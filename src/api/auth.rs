//! Autenticação JWT contra `POST /login/token/`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// Par de tokens devolvido pelo backend. O `access` vai no header
/// `Authorization` de toda chamada; o `refresh` renova o acesso quando o
/// backend responde 401 no meio de uma execução longa.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Troca usuário e senha por um [`TokenPair`].
pub async fn authenticate(
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<TokenPair, ApiError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()?;
    let response = client
        .post(format!("{}/login/token/", base_url.trim_end_matches('/')))
        .json(&LoginRequest { username, password })
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
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
    Ok(response.json::<TokenPair>().await?)
}

/// Renova o token de acesso usando o token de refresh.
pub async fn refresh_access(
    client: &Client,
    base_url: &str,
    refresh: &str,
) -> Result<String, ApiError> {
    let response = client
        .post(format!(
            "{}/login/token/refresh/",
            base_url.trim_end_matches('/')
        ))
        .json(&RefreshRequest { refresh })
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
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
    Ok(response.json::<RefreshResponse>().await?.access)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn authenticate_returns_token_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/token/"))
            .and(body_json(serde_json::json!({
                "username": "robo",
                "password": "segredo"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access": "acc-123",
                "refresh": "ref-456"
            })))
            .mount(&server)
            .await;

        let pair = authenticate(&server.uri(), "robo", "segredo").await.unwrap();
        assert_eq!(pair.access, "acc-123");
        assert_eq!(pair.refresh, "ref-456");
    }

    #[tokio::test]
    async fn bad_credentials_map_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/token/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = authenticate(&server.uri(), "robo", "errada").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status: 401 }));
    }
}
