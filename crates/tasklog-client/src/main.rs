//! tasklog CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, debug, error};

use tasklog_client::cli::{AuthProvider, Cli, Command, ConfigAction};
use tasklog_client::commands;
use tasklog_client::config::AppConfig;
use tasklog_client::error::ClientResult;
use tasklog_client::signals::Shutdown;
use tasklog_core::{TracingConfig, init_tracing};
use tasklog_providers::RunContext;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default().with_level(Level::WARN)
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    debug!(path = ?cli.config, "configuration loaded");

    match cli.command {
        Command::Export(args) => {
            config.apply_export_args(&args);
            let shutdown = listen_for_shutdown();
            let ctx = RunContext::new(Some(config.export_deadline()), shutdown.subscribe());
            commands::export::run(&config, &ctx).await?.print();
            Ok(())
        }
        Command::Cleanup(args) => {
            config.apply_cleanup_args(&args);
            let shutdown = listen_for_shutdown();
            let ctx = RunContext::new(Some(config.cleanup_deadline()), shutdown.subscribe());
            let summary = commands::cleanup::run(&config, args.dry_run, &ctx).await?;
            summary.print();
            summary.into_result().map(|_| ())
        }
        Command::Auth { provider } => match provider {
            #[cfg(feature = "google")]
            AuthProvider::Google {
                client_id,
                client_secret,
                credentials_file,
                force,
            } => {
                commands::auth::google(client_id, client_secret, credentials_file, force, &config)
                    .await
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
        },
    }
}

fn listen_for_shutdown() -> Shutdown {
    let shutdown = Shutdown::new();
    shutdown.spawn_listener();
    shutdown
}
