//! Cliente da API de chat-completions com imagem para transcrever as caixas
//! marcadas na seção "dados clínicos" do formulário escaneado.

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::automation::{DriverError, VisionAnalyzer};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

const PROMPT: &str = "Você é um assistente especialista em análise de formulários médicos. \
Sua tarefa é analisar uma imagem de um formulário e extrair as marcações feitas na seção \
intitulada 'dados clínicos'.\n\n\
- Considere como marcação válida qualquer sinal manual visível, como um 'X', uma bolinha \
preenchida, traço ou outra marca dentro de caixas de seleção. \
- Para cada item marcado, transcreva exatamente como aparece no formulário: incluindo o nome \
da seção, os códigos, descrições e observações adicionais (como 'NO POTE').\n\
- Agrupe os itens sob os títulos das seções correspondentes. \
- A saída deve ser simples: sem negrito, sem marcadores, sem numeração, sem formatação extra. \
- Não inclua frases introdutórias ou explicações. \
- Se nenhuma marcação for identificada, responda apenas com: 'Nenhuma marcação encontrada no \
formulário'.";

pub struct VisionClient {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl VisionClient {
    pub fn new(api_key: String, model: String) -> Result<Self, DriverError> {
        Self::with_base_url(api_key, model, API_URL.to_string())
    }

    /// Cria um cliente apontando para uma URL alternativa, usado nos testes.
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Result<Self, DriverError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            api_key,
            model,
            client,
            base_url,
        })
    }
}

impl VisionAnalyzer for VisionClient {
    async fn transcribe(&self, image: &Path) -> Result<Option<String>, DriverError> {
        let bytes = std::fs::read(image)?;
        let encoded = BASE64.encode(bytes);

        let body = json!({
            "model": self.model,
            "max_tokens": 512,
            "messages": [
                {"role": "user", "content": PROMPT},
                {"role": "user", "content": [{
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:image/jpeg;base64,{encoded}"),
                        "detail": "auto"
                    }
                }]}
            ]
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "erro desconhecido".to_string());
            return Err(DriverError::Driver(format!(
                "visão respondeu {status}: {message}"
            )));
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(DriverError::Network)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        debug!(resultado = ?content, "transcrição recebida");
        Ok(content)
    }
}
