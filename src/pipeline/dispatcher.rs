//! Despachante de estágios: busca pendências e roteia para os handlers.

use tracing::{error, info};

use super::StageHandler;
use crate::api::ApiClient;
use crate::model::{Pending, Stage};

/// Percorre os três estágios na ordem fixa do pipeline, um por vez.
///
/// Cada estágio é isolado: um handler que devolve `Err` tem o erro logado com
/// o nome do estágio e os estágios seguintes rodam normalmente. O retorno é o
/// número de estágios que falharam, usado só para escolher a severidade do
/// alerta de fim de execução.
pub struct Dispatcher<'a, S, I, M> {
    api: &'a ApiClient,
    shift: S,
    image: I,
    sismama: M,
}

impl<'a, S, I, M> Dispatcher<'a, S, I, M>
where
    S: StageHandler,
    I: StageHandler,
    M: StageHandler,
{
    pub fn new(api: &'a ApiClient, shift: S, image: I, sismama: M) -> Self {
        Self {
            api,
            shift,
            image,
            sismama,
        }
    }

    pub async fn run(&mut self) -> usize {
        let mut failures = 0;
        failures += run_stage(self.api, &mut self.shift).await;
        failures += run_stage(self.api, &mut self.image).await;
        failures += run_stage(self.api, &mut self.sismama).await;
        failures
    }
}

/// Roda um estágio do início ao fim; devolve 1 se ele falhou, 0 caso
/// contrário.
async fn run_stage<H: StageHandler>(api: &ApiClient, handler: &mut H) -> usize {
    let stage = handler.stage();
    let batch = match api.pending_by_stage(stage).await {
        Ok(Pending::Empty) => {
            info!(estagio = %stage, "nenhuma tarefa pendente");
            return 0;
        }
        Ok(Pending::Batch(tasks)) => tasks,
        Err(err) => {
            error!(estagio = %stage, %err, "falha ao buscar pendências do estágio");
            return 1;
        }
    };

    info!(estagio = %stage, tarefas = batch.len(), "lote encontrado, iniciando processamento");
    match handler.process(batch).await {
        Ok(()) => 0,
        Err(err) => {
            error!(estagio = %stage, %err, "estágio falhou; os demais seguem normalmente");
            1
        }
    }
}
