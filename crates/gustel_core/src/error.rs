//! Error types for the core crate.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Configuration errors.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error while reading config: {0}")]
    #[diagnostic(code(gustel_core::config::io))]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    #[diagnostic(code(gustel_core::config::toml))]
    TomlParse(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    #[diagnostic(
        code(gustel_core::config::missing_field),
        help("Set it in the config file or the matching environment variable")
    )]
    MissingField(&'static str),

    #[error("Invalid value for field {field}: {reason}")]
    #[diagnostic(code(gustel_core::config::invalid_value))]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors raised by the sound resolver for malformed arguments.
///
/// "Nothing found" is not an error; it is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolveError {
    #[error("Invalid resolver input for {field}: {reason}")]
    #[diagnostic(code(gustel_core::resolve::invalid_input))]
    InvalidInput { field: &'static str, reason: String },
}

/// Reasons an uploaded attachment is refused before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum UploadError {
    #[error("Not a valid audio file")]
    #[diagnostic(code(gustel_core::upload::not_audio))]
    NotAudio { content_type: Option<String> },

    #[error("Maximum size is {}MB", .max / 1_000_000)]
    #[diagnostic(code(gustel_core::upload::too_large))]
    TooLarge { size: u64, max: u64 },

    #[error("Maximum filename length is {max} characters")]
    #[diagnostic(code(gustel_core::upload::filename_too_long))]
    FilenameTooLong { len: usize, max: usize },

    #[error("Sound name must not be empty")]
    #[diagnostic(code(gustel_core::upload::empty_name))]
    EmptyName,
}

/// Duration probe failures.
#[derive(Debug, Error, Diagnostic)]
pub enum ProbeError {
    #[error("Unsupported or corrupt audio: {0}")]
    #[diagnostic(
        code(gustel_core::probe::unsupported),
        help("Supported containers: mp3, wav, flac, ogg, mp4/m4a")
    )]
    Unsupported(String),

    #[error("IO error while probing: {0}")]
    #[diagnostic(code(gustel_core::probe::io))]
    Io(#[from] std::io::Error),
}

/// Top-level core error.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Probe(#[from] ProbeError),

    #[error("IO error: {0}")]
    #[diagnostic(code(gustel_core::io))]
    Io(#[from] std::io::Error),
}
