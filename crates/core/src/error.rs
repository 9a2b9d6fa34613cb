use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KindlingError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to construct record: {0}")]
    Schema(#[from] fhir::FhirError),

    #[error("profile file not found: {}", .0.display())]
    ProfileNotFound(PathBuf),
    #[error("unsupported profile format '{extension}' ({})", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },
    #[error("invalid profile {}: {message}", path.display())]
    ProfileParse { path: PathBuf, message: String },

    #[error("persona '{name}' not found. Available personas: {}", available.join(", "))]
    PersonaNotFound {
        name: String,
        available: Vec<String>,
    },
    #[error("invalid persona '{name}': {message}")]
    PersonaParse { name: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize bundle: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type KindlingResult<T> = std::result::Result<T, KindlingError>;
