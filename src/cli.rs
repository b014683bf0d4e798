//! Interface de linha de comando do robô baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, check) e a flag
//! global --verbose.

use clap::{Parser, Subcommand};

/// Robô RPA de requisições de exame (SHIFT → SIS MAMA).
#[derive(Debug, Parser)]
#[command(name = "rpa-mama", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração.
    #[arg(long, global = true, default_value = "robo.toml")]
    pub config: String,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa uma passada completa do pipeline.
    Run,

    /// Valida configuração e credenciais sem processar nada.
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::parse_from(["rpa-mama", "run"]);
        assert!(matches!(cli.command, Command::Run));
        assert_eq!(cli.config, "robo.toml");
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["rpa-mama", "--verbose", "--config", "outro.toml", "check"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, "outro.toml");
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
