// ragdesk terminal front end

pub mod args;
pub mod commands;
pub mod sink;

use anyhow::{anyhow, Result};
use std::sync::Arc;

use ragdesk_lib::{
    create_client, AppController, ClientConfig, ProjectRepository, SettingsRepository,
};

use args::{Cli, Command};
use sink::TerminalSink;

/// Initialize logging. RUST_LOG wins over the default filter.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,ragdesk=debug,ragdesk_lib=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    if let Some(api_url) = &cli.api_url {
        config.api_base_url = api_url.clone();
        config.validate().map_err(|e| anyhow!(e))?;
    }
    log::debug!("Using backend {}", config.api_base_url);
    Ok(config)
}

fn build_controller(cli: &Cli) -> Result<AppController> {
    let config = load_config(cli)?;

    let db = config.open_database().map_err(|e| anyhow!(e))?;
    let store = ProjectRepository::new(Arc::new(SettingsRepository::new(db)));

    let api = create_client(&config.api_base_url, config.request_timeout_secs)?;
    let sink = Arc::new(TerminalSink::new(cli.verbose));

    Ok(AppController::new(api, store, sink, config))
}

pub async fn run(cli: Cli) -> Result<()> {
    let controller = build_controller(&cli)?;

    match cli.command {
        Command::Projects => {
            commands::list_projects(&controller);
            Ok(())
        }
        Command::Add(args) => commands::add_project(&controller, args.source).await,
        Command::Ask(args) => commands::ask(&controller, args).await,
        Command::Analyze(args) => commands::analyze(&controller, args).await,
        Command::Reindex(args) => commands::reindex(&controller, args).await,
        Command::Logs(args) => commands::logs(&controller, args).await,
        Command::Chat => commands::chat(&controller).await,
    }
}
