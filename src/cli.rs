use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::api::{handlers::parse_landmarks, AppState};
use crate::config::AppConfig;
use crate::error::{Result, ServeError};

#[derive(Parser)]
#[command(name = "isl-serve")]
#[command(version = "0.1.0")]
#[command(about = "Sign-language letter prediction server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (reads default.toml and $ISL_ENV.toml)
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,

    /// Model artifact path (overrides config)
    #[arg(short, long, env = "ISL_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Listen port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP prediction server (default)
    Serve,
    /// Load the model and print its declared tensor shapes
    Inspect,
    /// Run one prediction offline from a JSON request file
    Predict {
        /// File containing `{"landmarks": [...]}`
        #[arg(short, long)]
        file: PathBuf,
    },
}

impl Cli {
    /// Load configuration and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load_from(&self.config)?;
        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config
            .validate()
            .map_err(|errors| ServeError::Validation(errors.join("; ")))?;
        Ok(config)
    }
}

/// Print the model's declared input/output shapes.
pub async fn inspect_model(state: &AppState) -> Result<()> {
    let model = state.model();
    let loaded = model.acquire().await?;

    println!("Model: {}", model.model_path().display());
    println!("  input:  {}", loaded.engine.input_spec());
    println!("  output: {}", loaded.engine.output_spec());
    println!("  expected per-sample input: {:?}", loaded.expected_input);
    Ok(())
}

/// Run one prediction from a request file and print the JSON response.
pub async fn predict_file(state: &AppState, file: &Path) -> Result<()> {
    let body = tokio::fs::read(file).await?;
    let landmarks = parse_landmarks(&body)?;
    let result = state.predictor.predict(landmarks).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
