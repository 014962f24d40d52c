mod cli;
mod commands;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use garden_api::bangumi::BangumiClient;
use garden_api::dmhy::DmhyClient;
use garden_api::ApiError;
use garden_core::config::{AppConfig, LoggingConfig};
use garden_core::{ApplicationState, GardenError};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), GardenError> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let working_dir = cli
        .working_dir
        .clone()
        .unwrap_or_else(|| config.working_dir());
    let _guard = init_logging(&config.logging, &working_dir);
    tracing::debug!(working_dir = %working_dir.display(), "starting");

    let http = reqwest::Client::builder()
        .user_agent(config.feed.user_agent.as_str())
        .timeout(config.feed.request_timeout())
        .build()
        .map_err(ApiError::from)?;

    let command = match cli.command {
        Command::Persons { subject_id } => {
            let bangumi =
                BangumiClient::new(http).with_base_url(config.bangumi.base_url.as_str());
            return commands::persons(&bangumi, subject_id).await;
        }
        command => command,
    };

    let client = DmhyClient::new(http)
        .with_feed_url(config.feed.url.as_str())
        .with_timeout(config.feed.request_timeout());
    let state = ApplicationState::new(client, &working_dir)?;

    match command {
        Command::Search {
            keywords,
            category,
            alliance,
            single_page,
            filters,
        } => {
            commands::search(&state, &keywords, category, alliance, single_page, filters).await
        }
        Command::Starred => {
            commands::starred(&state);
            Ok(())
        }
        Command::Star {
            keywords,
            name,
            filters,
        } => commands::star(&state, &keywords, name, filters),
        Command::Unstar { keywords } => commands::unstar(&state, &keywords),
        Command::Watched { keywords, episode } => commands::watched(&state, &keywords, &episode),
        Command::IsWatched { keywords, episode } => {
            commands::is_watched(&state, &keywords, &episode);
            Ok(())
        }
        Command::Persons { .. } => Ok(()),
    }
}

/// Log to stderr, and to a daily file under `<working_dir>/data/logs` when
/// enabled. `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &LoggingConfig, working_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let (file_layer, guard) = if config.file {
        let appender =
            tracing_appender::rolling::daily(working_dir.join("data").join("logs"), "garden.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}
