//! Estágio IMAGE_PROCESS: localizar a imagem escaneada do frasco e
//! transcrever as marcações do formulário via visão computacional.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{StageHandler, patch_item};
use crate::api::ApiClient;
use crate::automation::VisionAnalyzer;
use crate::model::{Item, ItemPatch, Stage, Status, Task};
use crate::normalize::{self, now_iso};

const IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "png", "jpg", "jpeg"];

pub struct ImageHandler<'a, V> {
    api: &'a ApiClient,
    vision: V,
    image_dir: PathBuf,
}

impl<'a, V: VisionAnalyzer> ImageHandler<'a, V> {
    pub fn new(api: &'a ApiClient, vision: V, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            vision,
            image_dir: image_dir.into(),
        }
    }

    async fn process_item(&mut self, item: &Item) {
        patch_item(self.api, item.id, &ItemPatch::started(Stage::ImageProcess)).await;

        let code = receptacle_code(item);
        let Some(code) = code else {
            patch_item(
                self.api,
                item.id,
                &ItemPatch::error(
                    Stage::ImageProcess,
                    "Item sem código de recipiente para localizar a imagem.",
                ),
            )
            .await;
            return;
        };

        let Some(image_path) = find_image(&self.image_dir, &code) else {
            warn!(item_id = item.id, code, "imagem não encontrada");
            patch_item(
                self.api,
                item.id,
                &ItemPatch::error(
                    Stage::ImageProcess,
                    format!("Imagem não encontrada para o recipiente {code}"),
                ),
            )
            .await;
            return;
        };

        match self.analyze(&image_path).await {
            Ok(Some(transcription)) => {
                info!(item_id = item.id, "análise concluída, item avançado para SISMAMA");
                patch_item(
                    self.api,
                    item.id,
                    &ItemPatch {
                        status: Some(Status::Completed),
                        stage: Stage::ImageProcess.next(),
                        ended_at: Some(now_iso()),
                        image_result: Some(transcription),
                        ..ItemPatch::default()
                    },
                )
                .await;
            }
            Ok(None) => {
                patch_item(
                    self.api,
                    item.id,
                    &ItemPatch::error(
                        Stage::ImageProcess,
                        format!("Falha na análise da imagem para o recipiente {code}"),
                    ),
                )
                .await;
            }
            Err(err) => {
                warn!(item_id = item.id, %err, "erro ao processar imagem");
                patch_item(
                    self.api,
                    item.id,
                    &ItemPatch::error(
                        Stage::ImageProcess,
                        format!("Erro ao processar imagem do item {}: {err}", item.id),
                    ),
                )
                .await;
            }
        }
    }

    /// Converte TIFF para um JPEG temporário antes da chamada de visão. O
    /// arquivo temporário morre no fim deste escopo, com ou sem sucesso.
    async fn analyze(&self, path: &Path) -> anyhow::Result<Option<String>> {
        let is_tiff = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "tif" | "tiff"));

        if !is_tiff {
            return Ok(self.vision.transcribe(path).await?);
        }

        let temp = tempfile::Builder::new().suffix(".jpg").tempfile()?;
        let decoded = image::open(path)?;
        decoded.to_rgb8().save_with_format(temp.path(), image::ImageFormat::Jpeg)?;
        let result = self.vision.transcribe(temp.path()).await?;
        Ok(result)
    }
}

/// Código que correlaciona o item à imagem escaneada: o recipiente gravado
/// pelo estágio SHIFT, com o número da O.S. como reserva.
fn receptacle_code(item: &Item) -> Option<String> {
    let recipiente = item
        .shift_data
        .as_ref()
        .map(|data| data.recipiente.as_str())
        .filter(|code| !normalize::is_unspecified(code));
    match recipiente {
        Some(code) => Some(code.to_string()),
        None => item.os_number.clone().filter(|os| !os.is_empty()),
    }
}

/// Resolve `{code}_*.{ext}` dentro do diretório base. Com mais de um
/// candidato, vence o primeiro em ordem lexicográfica.
fn find_image(dir: &Path, code: &str) -> Option<PathBuf> {
    let prefix = format!("{code}_");
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                return false;
            };
            name.starts_with(&prefix) && IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

impl<'a, V: VisionAnalyzer> StageHandler for ImageHandler<'a, V> {
    fn stage(&self) -> Stage {
        Stage::ImageProcess
    }

    async fn process(&mut self, batch: Vec<Task>) -> anyhow::Result<()> {
        for task in &batch {
            info!(task_id = task.id, itens = task.items.len(), "processando tarefa");
            for item in &task.items {
                self.process_item(item).await;
            }
        }
        Ok(())
    }
}
