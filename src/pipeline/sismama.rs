//! Estágio SISMAMA: digitar no formulário desktop os registros autorizados,
//! vigiando os diálogos bloqueantes do sistema legado.

use tracing::{info, warn};

use super::script::{ScriptOp, entry_script};
use super::{StageHandler, patch_item};
use crate::api::ApiClient;
use crate::automation::SismamaDesktop;
use crate::model::{ItemPatch, Pending, SismamaRecord, Stage, Status, Task};
use crate::normalize::now_iso;

const ADMIN_ERROR: &str = "Erro ao abrir SisMama: privilégios de administrador ausentes";
const SUCCESS_RESULT: &str = "Processamento finalizado sem alertas.";

pub struct SismamaHandler<'a, D> {
    api: &'a ApiClient,
    desktop: D,
    cnes: String,
    physician: String,
}

impl<'a, D: SismamaDesktop> SismamaHandler<'a, D> {
    pub fn new(
        api: &'a ApiClient,
        desktop: D,
        cnes: impl Into<String>,
        physician: impl Into<String>,
    ) -> Self {
        Self {
            api,
            desktop,
            cnes: cnes.into(),
            physician: physician.into(),
        }
    }

    async fn process_record(&mut self, record: &SismamaRecord) -> anyhow::Result<()> {
        let Some(data) = record.shift_data.as_ref() else {
            info!(item_id = record.item_id, "item sem dados de SHIFT, ignorando");
            return Ok(());
        };

        // Entrada parcial no formulário legado é irrecuperável; dados
        // insuficientes nunca chegam a uma tecla sequer.
        if !data.sufficient_for_sismama() {
            let message = format!("Dados insuficientes para o item {}. Pulando.", record.item_id);
            info!(item_id = record.item_id, "{message}");
            patch_item(
                self.api,
                record.item_id,
                &ItemPatch::error(Stage::Sismama, message),
            )
            .await;
            return Ok(());
        }

        self.desktop.begin_entry().await?;

        let script = entry_script(data, &record.os_number, &self.cnes, &self.physician);
        for op in &script {
            match op {
                ScriptOp::Step(step) => {
                    for action in &step.actions {
                        self.desktop.apply(action).await?;
                    }
                }
                ScriptOp::DateDialogCheck => {
                    if let Some(text) = self.desktop.date_dialog().await? {
                        warn!(item_id = record.item_id, dialogo = text, "data rejeitada pelo SIS MAMA");
                        patch_item(
                            self.api,
                            record.item_id,
                            &ItemPatch::error(Stage::Sismama, text),
                        )
                        .await;
                        self.desktop.cancel_entry().await?;
                        return Ok(());
                    }
                }
            }
        }

        self.desktop.save().await?;

        match self.desktop.info_dialog().await? {
            Some(text) => {
                warn!(item_id = record.item_id, dialogo = text, "crítica de validação ao salvar");
                patch_item(
                    self.api,
                    record.item_id,
                    &ItemPatch::error(Stage::Sismama, text),
                )
                .await;
            }
            None => {
                info!(item_id = record.item_id, "registro salvo sem críticas");
                patch_item(
                    self.api,
                    record.item_id,
                    &ItemPatch {
                        status: Some(Status::Completed),
                        stage: Stage::Sismama.next(),
                        ended_at: Some(now_iso()),
                        sismama_result: Some(SUCCESS_RESULT.to_string()),
                        ..ItemPatch::default()
                    },
                )
                .await;
            }
        }
        Ok(())
    }

    /// Degradação em lote: sem privilégio para abrir o aplicativo, todo item
    /// autorizado é marcado individualmente com a mensagem padrão.
    async fn mark_all_admin_error(&self, records: &[SismamaRecord]) {
        for record in records {
            patch_item(
                self.api,
                record.item_id,
                &ItemPatch::error(Stage::Sismama, ADMIN_ERROR),
            )
            .await;
        }
    }
}

impl<'a, D: SismamaDesktop> StageHandler for SismamaHandler<'a, D> {
    fn stage(&self) -> Stage {
        Stage::Sismama
    }

    // O lote recebido serve só de gatilho; a lista autorizada vem do
    // endpoint dedicado, que junta os dados de SHIFT de cada item.
    async fn process(&mut self, _batch: Vec<Task>) -> anyhow::Result<()> {
        let records = match self.api.sismama_data().await? {
            Pending::Empty => {
                info!("nenhum item autorizado para o SIS MAMA");
                return Ok(());
            }
            Pending::Batch(records) => records,
        };
        info!(itens = records.len(), "itens autorizados para digitação");

        if let Err(err) = self.desktop.launch().await {
            warn!(%err, "não foi possível abrir o SIS MAMA");
            self.mark_all_admin_error(&records).await;
            return Err(err.into());
        }

        for record in &records {
            if let Err(err) = self.process_record(record).await {
                warn!(item_id = record.item_id, %err, "falha ao digitar o registro");
            }
        }

        // O processo é derrubado por nome ao fim do lote, com ou sem erros.
        if let Err(err) = self.desktop.terminate().await {
            warn!(%err, "falha ao encerrar o SIS MAMA");
        }
        Ok(())
    }
}
