use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No configuration file found (searched: {searched})")]
    ConfigNotFound { searched: String },

    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}
