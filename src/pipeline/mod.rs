//! Orquestração dos estágios do robô.
//!
//! O despachante percorre a ordem fixa SHIFT → IMAGE_PROCESS → SISMAMA e
//! entrega cada lote pendente ao handler do estágio. Todo desfecho observável
//! vive no backend: os handlers não devolvem dados, só aplicam patches de
//! status e registram logs.

pub mod dispatcher;
pub mod image;
pub mod script;
pub mod shift;
pub mod sismama;

use tracing::error;

use crate::api::ApiClient;
use crate::model::{ItemPatch, Stage, Task, TaskPatch};

pub use dispatcher::Dispatcher;

/// Handler de um estágio do pipeline. Cada implementação processa um lote
/// inteiro; erros por item são absorvidos dentro de `process`, e um `Err`
/// devolvido aqui derruba só o estágio corrente (isolamento garantido pelo
/// despachante).
pub trait StageHandler {
    fn stage(&self) -> Stage;
    async fn process(&mut self, batch: Vec<Task>) -> anyhow::Result<()>;
}

/// Aplica um patch de item registrando a falha sem propagá-la.
///
/// Política do pipeline: patch que falha é logado e não é retentado dentro do
/// mesmo passe; o passo seguinte não é desfeito. A próxima execução periódica
/// reencontra o item ainda pendente.
pub(crate) async fn patch_item(api: &ApiClient, item_id: i64, patch: &ItemPatch) {
    if let Err(err) = api.update_item(item_id, patch).await {
        error!(item_id, %err, "falha ao aplicar patch de item");
    }
}

/// Aplica um patch de tarefa registrando a falha sem propagá-la.
pub(crate) async fn patch_task(api: &ApiClient, task_id: i64, patch: &TaskPatch) {
    if let Err(err) = api.update_task(task_id, patch).await {
        error!(task_id, %err, "falha ao aplicar patch de tarefa");
    }
}
