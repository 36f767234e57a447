//! Interface de linha de comando do Codesage.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Endereço padrão da API do Codesage.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

/// Codesage - análise de código e explicações via modelos hospedados.
#[derive(Parser, Debug)]
#[command(name = "codesage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "codesage.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicializa configuração no diretório atual.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Inicia a API HTTP e a UI web.
    Serve {
        /// Endereço de bind, sobrescreve o config (ex: 0.0.0.0:8000).
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Diagnostica problemas de configuração.
    Doctor,

    /// Mostra versão.
    Version,

    /// Pede a um modelo que explique um arquivo.
    Explain {
        /// Source file, or `-` for stdin.
        file: PathBuf,

        /// Model key (qwen3, deepseek-3.1).
        #[arg(short, long)]
        model: Option<String>,

        /// API base URL.
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },

    /// Roda o analisador heurístico em um arquivo.
    Analyze {
        /// Source file, or `-` for stdin.
        file: PathBuf,

        /// API base URL.
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },

    /// Envia um prompt livre a um modelo.
    Infer {
        /// Prompt text, or `-` for stdin.
        prompt: String,

        /// Model key (qwen3, deepseek-3.1).
        #[arg(short, long)]
        model: Option<String>,

        /// API base URL.
        #[arg(short, long, default_value = DEFAULT_SERVER)]
        server: String,
    },
}
