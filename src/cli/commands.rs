//! Implementação dos comandos CLI do Codesage.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::types::config::Config;
use crate::types::requests::{AnalyzeRequest, ExplainRequest, InferRequest};
use crate::ui::{Action, ApiClient, ResultView, View};
use crate::{server, CodesageResult};

/// Name of the configuration file written by `init`.
pub const CONFIG_FILE: &str = "codesage.toml";

/// Initializes configuration in the specified directory.
pub fn init(path: Option<PathBuf>) -> CodesageResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join(CONFIG_FILE);

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    Config::default_config().save(&config_path)?;

    println!("Codesage initialized.");
    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Export your API token: export HF_API_TOKEN=...");
    println!("  2. Check the setup: codesage doctor");
    println!("  3. Start the API: codesage serve");

    Ok(())
}

/// Inicia a API HTTP.
pub async fn serve(bind: Option<String>, mut config: Config) -> CodesageResult<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    config.validate()?;

    tracing::debug!(
        bind = %config.server.bind,
        default_model = %config.gateway.default_model,
        cache_enabled = config.cache.enabled,
        "Starting server"
    );

    server::serve(config).await
}

/// Diagnostica problemas de configuração.
///
/// Só falha em problemas que impedem o servidor de subir.
pub fn doctor(config: &Config, config_path: &Path) -> ExitCode {
    println!("Diagnosing Codesage configuration...\n");

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if config_path.exists() {
        match Config::load(config_path) {
            Ok(_) => println!("✓ Configuration loaded from {}", config_path.display()),
            Err(e) => issues.push(format!("{} is invalid: {}", config_path.display(), e)),
        }
    } else {
        warnings.push(format!(
            "{} not found, using defaults (run 'codesage init')",
            config_path.display()
        ));
    }

    match config.validate() {
        Ok(()) => println!("✓ Configuration is consistent"),
        Err(e) => issues.push(e.to_string()),
    }

    if config.gateway.token().is_some() {
        println!("✓ API token configured");
    } else {
        warnings.push("HF_API_TOKEN not set - explain and infer will fail".to_string());
    }

    println!("✓ Endpoint: {}", config.gateway.base_url);
    for (key, model) in &config.gateway.models {
        let marker = if *key == config.gateway.default_model {
            " (default)"
        } else {
            ""
        };
        println!("✓ Model {} -> {}{}", key, model, marker);
    }

    if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
        warnings.push(format!(
            "bind address '{}' is not a literal socket address; it will be resolved at startup",
            config.server.bind
        ));
    }

    if config.cache.enabled {
        println!(
            "✓ Cache: {} entries, {}s TTL",
            config.cache.capacity, config.cache.ttl_secs
        );
    } else {
        println!("○ Cache disabled");
    }

    println!();
    if issues.is_empty() && warnings.is_empty() {
        println!("✓ All good. Codesage is ready.");
    }
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in &warnings {
            println!("  ⚠ {}", warning);
        }
    }
    if !issues.is_empty() {
        println!("Problems:");
        for issue in &issues {
            println!("  ✗ {}", issue);
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Mostra versão.
pub fn version() {
    println!("codesage {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Heuristic code analysis and model-backed explanations");
}

/// Pede à API a explicação de um arquivo.
pub async fn explain(
    file: &Path,
    model: Option<String>,
    server: &str,
    config: &Config,
) -> CodesageResult<ExitCode> {
    let mut request = ExplainRequest::new(read_input(file)?);
    if let Some(model) = model {
        request = request.with_model(model);
    }

    let client = client(server, config)?;
    Ok(show(Action::Explain, client.explain(&request)).await)
}

/// Pede à API a análise de um arquivo.
pub async fn analyze(file: &Path, server: &str, config: &Config) -> CodesageResult<ExitCode> {
    let request = AnalyzeRequest::new(read_input(file)?);

    let client = client(server, config)?;
    Ok(show(Action::Analyze, client.analyze(&request)).await)
}

/// Envia um prompt livre pela API.
pub async fn infer(
    prompt: &str,
    model: Option<String>,
    server: &str,
    config: &Config,
) -> CodesageResult<ExitCode> {
    let prompt = if prompt == "-" {
        read_stdin()?
    } else {
        prompt.to_string()
    };
    let mut request = InferRequest::new(prompt);
    if let Some(model) = model {
        request = request.with_model(model);
    }

    let client = client(server, config)?;
    Ok(show(Action::Infer, client.infer(&request)).await)
}

fn client(server: &str, config: &Config) -> CodesageResult<ApiClient> {
    // Leaves room for the gateway's single retry.
    let timeout = Duration::from_secs(config.gateway.timeout_secs.saturating_mul(2) + 5);
    ApiClient::new(server, timeout)
}

/// Executa uma ação numa view nova e imprime o resultado.
async fn show<F>(action: Action, outcome: F) -> ExitCode
where
    F: std::future::Future<Output = View>,
{
    let mut view = ResultView::new();
    view.begin(action);
    tracing::debug!(action = %action, "Request started");

    view.finish(outcome.await);
    let rendered = view.render();

    if view.current().is_error() {
        eprint!("{}", rendered);
        ExitCode::FAILURE
    } else {
        print!("{}", rendered);
        ExitCode::SUCCESS
    }
}

/// Lê um arquivo, ou stdin quando `path` é `-`.
fn read_input(path: &Path) -> CodesageResult<String> {
    if path == Path::new("-") {
        return read_stdin();
    }
    Ok(std::fs::read_to_string(path)?)
}

fn read_stdin() -> CodesageResult<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
