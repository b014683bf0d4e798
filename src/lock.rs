//! Trava de execução única.
//!
//! O robô é disparado por um agendador externo; se uma passada ainda estiver
//! em andamento quando a próxima dispara, as duas dirigiriam a mesma sessão
//! de UI ao mesmo tempo. A trava é um arquivo criado com `create_new`: quem
//! consegue criar, executa; quem encontra o arquivo, desiste da passada.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::RobotError;

/// Guarda RAII da trava. O arquivo é removido no drop, inclusive em pânico
/// durante a passada; um processo morto a força deixa a trava para trás, e a
/// remoção manual é o procedimento de recuperação.
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: &Path) -> Result<RunLock, RobotError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                // O pid gravado serve só para diagnóstico manual.
                let _ = writeln!(file, "{}", std::process::id());
                Ok(RunLock {
                    path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(RobotError::LockHeld(path.to_path_buf()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(caminho = %self.path.display(), %err, "falha ao remover a trava de execução");
        }
    }
}
