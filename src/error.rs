// src/error.rs

//! Error types for the wpsyde library

use thiserror::Error;

/// Result type alias using the wpsyde error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while packaging, publishing, fetching or installing components
#[derive(Error, Debug)]
pub enum Error {
    /// Bad component name, version string or argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Component is not listed in the registry index
    #[error("Component '{0}' not found in registry")]
    ComponentNotFound(String),

    /// Requested version was never published for the component
    #[error("Version {version} not found for {name}. Available: {}", available.join(", "))]
    VersionNotFound {
        name: String,
        version: String,
        available: Vec<String>,
    },

    /// Registry answered with a non-200 status, an HTML page, or not at all
    #[error("Registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// Archive download failed (network error, timeout, bad status)
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Content digest did not match the published digest
    #[error("Integrity mismatch for {subject}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    /// Archive is malformed or an extracted file could not be written
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Publishing would change the content of an already published version
    #[error(
        "Immutable content changed for {name}@{version}: field '{field}' differs from the published manifest"
    )]
    ImmutableContentChanged {
        name: String,
        version: String,
        field: &'static str,
    },

    /// Manifest failed validation
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A file referenced by the manifest is missing from the component source
    #[error("Missing source file for {component}: {file}")]
    MissingSourceFile { component: String, file: String },

    /// Local state / configuration file problem
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O errors with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ExtractionFailed(err.to_string())
    }
}

impl Error {
    /// Short, stable name of the error kind (used in batch summaries)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInput",
            Self::ComponentNotFound(_) => "ComponentNotFound",
            Self::VersionNotFound { .. } => "VersionNotFound",
            Self::RegistryUnavailable(_) => "RegistryUnavailable",
            Self::DownloadFailed(_) => "DownloadFailed",
            Self::IntegrityMismatch { .. } => "IntegrityMismatch",
            Self::ExtractionFailed(_) => "ExtractionFailed",
            Self::ImmutableContentChanged { .. } => "ImmutableContentChanged",
            Self::InvalidManifest(_) => "InvalidManifest",
            Self::MissingSourceFile { .. } => "MissingSourceFile",
            Self::ConfigError(_) => "ConfigError",
            Self::IoError(_) => "IoError",
            Self::SerializationError(_) => "SerializationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_found_lists_available() {
        let err = Error::VersionNotFound {
            name: "Button".to_string(),
            version: "2.0.0".to_string(),
            available: vec!["1.0.0".to_string(), "1.1.0".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Version 2.0.0 not found for Button. Available: 1.0.0, 1.1.0"
        );
        assert_eq!(err.kind(), "VersionNotFound");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoError(ref m) if m.contains("gone")));
    }
}
