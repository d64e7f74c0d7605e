use clap::Parser;
use isl_serve::api::AppState;
use isl_serve::cli::{self, Cli, Commands};
use isl_serve::logging::{init_logging, init_logging_simple};
use isl_serve::server::start_api_server;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let result = match &cli.command {
        None | Some(Commands::Serve) => {
            init_logging(&config.logging);
            let state = AppState::from_config(&config);
            start_api_server(&config, state).await
        }
        Some(Commands::Inspect) => {
            init_logging_simple();
            cli::inspect_model(&AppState::from_config(&config)).await
        }
        Some(Commands::Predict { file }) => {
            init_logging_simple();
            cli::predict_file(&AppState::from_config(&config), file).await
        }
    };

    if let Err(e) = &result {
        error!("{e}");
    }
    result.map_err(Into::into)
}
