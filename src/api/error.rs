//! Tipos de erro para o cliente da API do painel.
//!
//! Define [`ApiError`] com variantes para token expirado, erros HTTP e falhas
//! de rede. Usa `thiserror` para derivar `Display` e `Error` automaticamente
//! a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API do painel.
///
/// As variantes cobrem os três cenários mais comuns de falha:
/// - [`Unauthorized`](ApiError::Unauthorized) — HTTP 401/403, token vencido ou credenciais inválidas
/// - [`Status`](ApiError::Status) — qualquer outro erro HTTP (4xx/5xx)
/// - [`Network`](ApiError::Network) — falha na camada de rede
#[derive(Debug, Error)]
pub enum ApiError {
    /// O servidor recusou o token (401) ou as credenciais (403).
    #[error("não autorizado (status {status}): token ou credenciais recusados")]
    Unauthorized { status: u16 },

    /// Erro retornado pela API (ex.: 404 rota inexistente, 500 erro interno).
    /// Contém o código de status HTTP e a mensagem do corpo da resposta.
    #[error("erro da API (status {status}): {message}")]
    Status { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    /// Encapsula o erro original do `reqwest` via `#[from]`.
    #[error("erro de rede: {0}")]
    Network(#[from] reqwest::Error),
}
