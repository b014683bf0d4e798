//! Leitura de marcações de formulário por visão computacional (OpenAI).

pub mod client;

pub use client::VisionClient;
