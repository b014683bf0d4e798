//! Estágio SHIFT: localizar a O.S. no sistema web, extrair o registro do
//! exame e gravá-lo no backend.

use anyhow::Context;
use tracing::{info, warn};

use super::{StageHandler, patch_item, patch_task};
use crate::api::ApiClient;
use crate::automation::{Panel, SearchOutcome, ShiftBrowser, ShiftField};
use crate::model::{Extraction, ItemPatch, ShiftData, Stage, Status, Task, TaskPatch};
use crate::normalize::now_iso;

/// Ordem de abertura dos painéis do laudo e os campos lidos em cada um.
/// Fechar um painel antes de abrir o próximo é exigência da própria página.
const EXTRACTION_PLAN: &[(Panel, &[ShiftField])] = &[
    (Panel::Exame, &[ShiftField::IdadePaciente, ShiftField::RacaEtinia]),
    (
        Panel::Procedimentos,
        &[
            ShiftField::DataColeta,
            ShiftField::DataLiberacao,
            ShiftField::TamanhoLesao,
            ShiftField::CaracteristicaLesao,
            ShiftField::LocalizacaoLesao,
        ],
    ),
    (
        Panel::Manutencao,
        &[
            ShiftField::DataNascimento,
            ShiftField::Sexo,
            ShiftField::CartaoSus,
        ],
    ),
    (
        Panel::Endereco,
        &[
            ShiftField::CodigoPostal,
            ShiftField::Logradouro,
            ShiftField::NumeroResidencial,
            ShiftField::Cidade,
            ShiftField::Estado,
        ],
    ),
];

pub struct ShiftHandler<'a, B> {
    api: &'a ApiClient,
    browser: B,
}

impl<'a, B: ShiftBrowser> ShiftHandler<'a, B> {
    pub fn new(api: &'a ApiClient, browser: B) -> Self {
        Self { api, browser }
    }

    async fn process_task(&mut self, task: &Task) {
        let valid: Vec<_> = task
            .items
            .iter()
            .filter(|item| {
                let ok = item.os_number.as_deref().is_some_and(|os| !os.is_empty())
                    && item.os_name.as_deref().is_some_and(|nome| !nome.is_empty());
                if !ok {
                    // Entrada malformada não é culpa do item: fica sem patch,
                    // visível para inspeção do operador.
                    warn!(task_id = task.id, item_id = item.id, "item sem O.S. ou nome, ignorando");
                }
                ok
            })
            .collect();

        if valid.is_empty() {
            warn!(task_id = task.id, "nenhuma ordem de serviço válida na tarefa");
            return;
        }

        let nome = valid[0].os_name.as_deref().unwrap_or_default();
        patch_task(
            self.api,
            task.id,
            &TaskPatch::started(Stage::Shift, format!("Processamento iniciado para {nome}")),
        )
        .await;

        for item in valid {
            let os_number = item.os_number.as_deref().unwrap_or_default();
            let os_name = item.os_name.as_deref().unwrap_or_default();
            if let Err(err) = self.process_item(task.id, item.id, os_number, os_name).await {
                // Patch pendente fica para a próxima execução re-poll.
                warn!(item_id = item.id, %err, "item abandonado nesta passada");
            }
        }
    }

    async fn process_item(
        &mut self,
        task_id: i64,
        item_id: i64,
        os_number: &str,
        os_name: &str,
    ) -> anyhow::Result<()> {
        patch_item(self.api, item_id, &ItemPatch::started(Stage::Shift)).await;

        match self.browser.search_os(os_number).await? {
            SearchOutcome::Found => {}
            SearchOutcome::NotFound { alert } => {
                warn!(os_number, alert, "O.S. não encontrada no SHIFT");
                patch_task(
                    self.api,
                    task_id,
                    &TaskPatch::error(format!("O.S. não encontrada: {os_number}")),
                )
                .await;
                patch_item(
                    self.api,
                    item_id,
                    &ItemPatch {
                        status: Some(Status::Error),
                        observation: Some("O.S. não encontrada no SHIFT.".to_string()),
                        ..ItemPatch::default()
                    },
                )
                .await;
                return Ok(());
            }
        }

        // Defesa contra a busca devolver um registro velho de uma tentativa
        // anterior: nome na tela precisa bater com o esperado.
        let on_screen = self.browser.patient_name().await?;
        if on_screen.as_deref() != Some(os_name) {
            warn!(
                item_id,
                esperado = os_name,
                na_tela = on_screen.as_deref().unwrap_or(""),
                "nome do paciente divergente, item abandonado sem patch"
            );
            return Ok(());
        }

        let recipiente = match self.browser.receptacle_prefix().await? {
            Some(prefix) => prefix,
            None => {
                patch_item(
                    self.api,
                    item_id,
                    &ItemPatch::error(
                        Stage::Shift,
                        "Recipiente correspondente à imagem não foi encontrado.",
                    ),
                )
                .await;
                return Ok(());
            }
        };

        let raw = self.extract_fields().await;
        let data =
            ShiftData::from_extraction(task_id, item_id, os_number, os_name, &recipiente, raw);

        self.api.upsert_shift_data(item_id, &data).await?;

        patch_item(
            self.api,
            item_id,
            &ItemPatch {
                status: Some(Status::Completed),
                stage: Stage::Shift.next(),
                ended_at: Some(now_iso()),
                shift_result: Some("PROCESSO FINALIZADO".to_string()),
                ..ItemPatch::default()
            },
        )
        .await;
        info!(item_id, "extração concluída, item avançado para IMAGE_PROCESS");
        Ok(())
    }

    /// Percorre os painéis do plano de extração. Qualquer campo que falhe
    /// degrada para `None` (vira sentinela no payload); a extração nunca
    /// aborta o item por causa de um campo.
    async fn extract_fields(&mut self) -> Extraction {
        let mut raw = Extraction::default();
        for (panel, fields) in EXTRACTION_PLAN {
            if let Err(err) = self.browser.open_panel(*panel).await {
                warn!(painel = panel.as_str(), %err, "painel inacessível, campos degradados");
                continue;
            }
            for field in *fields {
                let value = match self.browser.read_field(*field).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(campo = field.as_str(), %err, "leitura falhou, campo degradado");
                        None
                    }
                };
                store_field(&mut raw, *field, value);
            }
            if let Err(err) = self.browser.close_panel(*panel).await {
                warn!(painel = panel.as_str(), %err, "falha ao fechar painel");
            }
        }
        raw
    }
}

fn store_field(raw: &mut Extraction, field: ShiftField, value: Option<String>) {
    let slot = match field {
        ShiftField::IdadePaciente => &mut raw.idade_paciente,
        ShiftField::RacaEtinia => &mut raw.raca_etinia,
        ShiftField::DataColeta => &mut raw.data_coleta,
        ShiftField::DataLiberacao => &mut raw.data_liberacao,
        ShiftField::TamanhoLesao => &mut raw.tamanho_lesao,
        ShiftField::CaracteristicaLesao => &mut raw.caracteristica_lesao,
        ShiftField::LocalizacaoLesao => &mut raw.localizacao_lesao,
        ShiftField::DataNascimento => &mut raw.data_nascimento,
        ShiftField::Sexo => &mut raw.sexo,
        ShiftField::CartaoSus => &mut raw.cartao_sus,
        ShiftField::CodigoPostal => &mut raw.codigo_postal,
        ShiftField::Logradouro => &mut raw.logradouro,
        ShiftField::NumeroResidencial => &mut raw.numero_residencial,
        ShiftField::Cidade => &mut raw.cidade,
        ShiftField::Estado => &mut raw.estado,
    };
    *slot = value;
}

impl<'a, B: ShiftBrowser> StageHandler for ShiftHandler<'a, B> {
    fn stage(&self) -> Stage {
        Stage::Shift
    }

    async fn process(&mut self, batch: Vec<Task>) -> anyhow::Result<()> {
        // Sem sessão de navegador nenhum item pode avançar: a falha sobe
        // antes de qualquer patch e o estágio inteiro conta como falho.
        self.browser
            .open_session()
            .await
            .context("falha ao abrir a sessão do SHIFT")?;

        for task in &batch {
            self.process_task(task).await;
        }
        // A sessão é liberada sempre, mesmo após erro.
        if let Err(err) = self.browser.release().await {
            warn!(%err, "falha ao liberar a sessão do navegador");
        }
        Ok(())
    }
}
