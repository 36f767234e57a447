use std::process::ExitCode;

use clap::Parser;
use codesage::cli::{commands, Cli, Commands};
use codesage::types::config::Config;
use codesage::CodesageResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> CodesageResult<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let (config, load_error) = if cli.config.exists() {
        match Config::load(&cli.config) {
            Ok(config) => (config, None),
            Err(e) => (Config::default_config(), Some(e)),
        }
    } else {
        (Config::default_config(), None)
    };
    let config = config.with_env_overrides();

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("codesage={}", log_level)
            .parse()
            .unwrap_or_else(|_| "codesage=info".parse().expect("fallback directive is valid")),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.general.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    if let Some(e) = load_error {
        tracing::warn!(
            path = %cli.config.display(),
            error = %e,
            "Invalid config file, using defaults"
        );
    }
    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    let code = match cli.command {
        Commands::Init { path } => {
            commands::init(path)?;
            ExitCode::SUCCESS
        }
        Commands::Serve { bind } => {
            commands::serve(bind, config).await?;
            ExitCode::SUCCESS
        }
        Commands::Doctor => commands::doctor(&config, &cli.config),
        Commands::Version => {
            commands::version();
            ExitCode::SUCCESS
        }
        Commands::Explain {
            file,
            model,
            server,
        } => commands::explain(&file, model, &server, &config).await?,
        Commands::Analyze { file, server } => commands::analyze(&file, &server, &config).await?,
        Commands::Infer {
            prompt,
            model,
            server,
        } => commands::infer(&prompt, model, &server, &config).await?,
    };

    Ok(code)
}
