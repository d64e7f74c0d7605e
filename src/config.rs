use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub shape: ShapeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Route serving both the health check (GET) and predictions (POST)
    #[serde(default = "default_predict_path")]
    pub predict_path: String,
}

fn default_predict_path() -> String {
    "/api/predict".to_string()
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the model artifact
    pub path: PathBuf,
    /// Load the model at startup instead of on the first request
    #[serde(default = "default_preload")]
    pub preload: bool,
    /// Upper bound for one inference pass in milliseconds
    #[serde(default = "default_inference_timeout")]
    pub inference_timeout_ms: u64,
}

fn default_preload() -> bool {
    true
}

fn default_inference_timeout() -> u64 {
    5000
}

impl ModelConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeConfig {
    /// Accept any reshape whose element count matches the model input,
    /// not just the flat/joint landmark encodings.
    #[serde(default = "default_allow_generic_reshape")]
    pub allow_generic_reshape: bool,
}

fn default_allow_generic_reshape() -> bool {
    true
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            allow_generic_reshape: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rotated log files (console only when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.predict_path", "/api/predict")?
            .set_default("model.path", "stgcn_v3.onnx")?
            .set_default("model.preload", true)?
            .set_default("model.inference_timeout_ms", 5000)?
            .set_default("shape.allow_generic_reshape", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ISL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ISL_MODEL__PATH, etc.)
            .add_source(
                Environment::with_prefix("ISL")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Built-in defaults, without reading files or environment
    pub fn default_config(model_path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                predict_path: default_predict_path(),
            },
            model: ModelConfig {
                path: model_path.into(),
                preload: true,
                inference_timeout_ms: default_inference_timeout(),
            },
            shape: ShapeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }

        if !self.server.predict_path.starts_with('/') {
            errors.push(format!(
                "server.predict_path must start with '/', got {:?}",
                self.server.predict_path
            ));
        }

        if self.model.path.as_os_str().is_empty() {
            errors.push("model.path must not be empty".to_string());
        }

        if self.model.inference_timeout_ms == 0 {
            errors.push("model.inference_timeout_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
