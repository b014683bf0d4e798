//! Integração com a API REST do painel: autenticação JWT, fila de tarefas
//! por estágio, upsert de dados extraídos e alertas.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{TokenPair, authenticate};
pub use client::ApiClient;
pub use error::ApiError;
