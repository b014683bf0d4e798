mod agents;
mod api;
mod automation;
mod cli;
mod config;
mod error;
mod lock;
mod model;
mod normalize;
mod pipeline;
mod vision;

use std::path::Path;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use agents::{BrowserAgent, DesktopAgent};
use api::ApiClient;
use cli::{Cli, Command};
use config::RobotConfig;
use error::RobotError;
use lock::RunLock;
use model::{Alert, AlertType};
use pipeline::{Dispatcher, image::ImageHandler, shift::ShiftHandler, sismama::SismamaHandler};
use vision::VisionClient;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match RobotConfig::load_from(Path::new(&cli.config)) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "configuração inválida");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run => run(&config).await,
        Command::Check => check(&config).await,
    };

    if let Err(err) = result {
        error!(%err, "execução encerrada com erro");
        std::process::exit(1);
    }
}

/// Uma passada completa: trava, autentica, despacha os três estágios e
/// publica os alertas de início e fim.
async fn run(config: &RobotConfig) -> anyhow::Result<()> {
    let lock = match RunLock::acquire(&config.lock_path) {
        Ok(lock) => lock,
        Err(RobotError::LockHeld(path)) => {
            // Execução anterior ainda em andamento: esta passada é pulada e
            // o agendador tenta de novo no próximo disparo.
            warn!(trava = %path.display(), "outra execução em andamento, passada pulada");
            notify_lock_held(config).await;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let started = Instant::now();
    let run_id = Uuid::new_v4();
    info!(%run_id, "iniciando passada do pipeline");

    let (username, password) = config.api_credentials()?;
    let tokens = api::authenticate(&config.api_url, &username, &password)
        .await
        .map_err(|err| {
            error!(%err, "falha na autenticação da API. Verifique as credenciais.");
            RobotError::Auth
        })?;
    let api = ApiClient::new(&config.api_url, tokens)?;

    api.send_alert(
        &Alert::new(config.robot_id, AlertType::Informacao, "Execução iniciada")
            .with_details(run_id.to_string()),
    )
    .await;

    let browser = BrowserAgent::new(&config.agent_url)?;
    let vision = VisionClient::new(config.openai_api_key.clone(), config.vision_model.clone())?;
    let desktop = DesktopAgent::new(&config.agent_url)?;

    let mut dispatcher = Dispatcher::new(
        &api,
        ShiftHandler::new(&api, browser),
        ImageHandler::new(&api, vision, &config.image_dir),
        SismamaHandler::new(&api, desktop, &config.cnes, &config.medico_responsavel),
    );
    let failures = dispatcher.run().await;

    let elapsed = started.elapsed().as_secs_f64();
    if failures == 0 {
        info!(%run_id, tempo_s = format!("{elapsed:.2}"), "automação concluída com sucesso");
        api.send_alert(
            &Alert::new(
                config.robot_id,
                AlertType::Sucesso,
                format!("Automação concluída com sucesso. Tempo total: {elapsed:.2} segundos"),
            )
            .with_details(run_id.to_string()),
        )
        .await;
    } else {
        warn!(%run_id, falhas = failures, "automação finalizada com erros");
        api.send_alert(
            &Alert::new(
                config.robot_id,
                AlertType::Erro,
                format!(
                    "Automação finalizada com erros em {failures} estágio(s). \
                     Tempo total: {elapsed:.2} segundos"
                ),
            )
            .with_details(run_id.to_string()),
        )
        .await;
    }

    drop(lock);
    Ok(())
}

/// Melhor esforço: avisa o painel que a passada foi pulada pela trava. Sem
/// credenciais ou sem backend, o aviso fica só no log.
async fn notify_lock_held(config: &RobotConfig) {
    let Ok((username, password)) = config.api_credentials() else {
        return;
    };
    let Ok(tokens) = api::authenticate(&config.api_url, &username, &password).await else {
        return;
    };
    let Ok(api) = ApiClient::new(&config.api_url, tokens) else {
        return;
    };
    api.send_alert(&Alert::new(
        config.robot_id,
        AlertType::Alerta,
        "Execução pulada: outra passada ainda em andamento",
    ))
    .await;
}

/// Valida configuração e credenciais sem tocar em nenhuma fila.
async fn check(config: &RobotConfig) -> anyhow::Result<()> {
    let (username, password) = config.api_credentials()?;
    api::authenticate(&config.api_url, &username, &password)
        .await
        .map_err(|err| {
            error!(%err, "falha na autenticação da API");
            RobotError::Auth
        })?;
    info!(
        api_url = config.api_url,
        robot_id = config.robot_id,
        imagens = %config.image_dir.display(),
        "configuração e credenciais válidas"
    );
    Ok(())
}
