//! Error types for quill modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine a configuration directory for this platform")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    SerializeFailed(#[source] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from git repository operations.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Failed to open git repository at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Repository has no working directory (bare repository)")]
    BareRepository,

    #[error("Failed to read repository state: {0}")]
    StatusFailed(#[source] git2::Error),

    #[error("Failed to read HEAD: {0}")]
    HeadFailed(#[source] git2::Error),

    #[error("No staged changes to commit")]
    NothingStaged,

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git signature unavailable (set user.name and user.email): {0}")]
    SignatureMissing(#[source] git2::Error),
}

/// Errors from ignore-pattern discovery and compilation.
///
/// Compilation failures are always fatal: silently skipping a broken
/// `.quillignore` file could let a section the user meant to hide reach
/// the generation backend.
#[derive(Error, Debug)]
pub enum IgnoreError {
    #[error("Failed to read ignore file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern in ignore file {path}: {source}")]
    CompileFailed {
        path: PathBuf,
        #[source]
        source: Box<ignore::Error>,
    },
}

/// Errors from commit message generation backends.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to load prompt template {path}: {source}")]
    TemplateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientFailed(#[source] reqwest::Error),

    #[error("Request to {provider} failed: {source}")]
    RequestFailed {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error (status {status}): {body}")]
    ApiError {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {provider} response: {source}")]
    DecodeFailed {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: &'static str },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GeneratorError>),
}

impl GeneratorError {
    /// Whether a retry has any chance of succeeding.
    ///
    /// Connection failures, timeouts, rate limits and server-side errors
    /// are transient; everything else (auth, malformed response) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            GeneratorError::RequestFailed { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            GeneratorError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors from the interactive editing flow.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Interactive prompt failed: {0}")]
    PromptFailed(#[source] dialoguer::Error),

    #[error("No editor found. Set the EDITOR or VISUAL environment variable")]
    NoEditor,

    #[error("Editor exited with {0}")]
    EditorFailed(std::process::ExitStatus),

    #[error("Failed to exchange message with editor: {0}")]
    IoFailed(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_transient_classification() {
        let rate_limited = GeneratorError::ApiError {
            provider: "ollama",
            status: 429,
            body: "slow down".to_string(),
        };
        assert!(rate_limited.is_transient());

        let server_error = GeneratorError::ApiError {
            provider: "openai",
            status: 503,
            body: "overloaded".to_string(),
        };
        assert!(server_error.is_transient());

        let auth_error = GeneratorError::ApiError {
            provider: "openai",
            status: 401,
            body: "bad token".to_string(),
        };
        assert!(!auth_error.is_transient());

        let empty = GeneratorError::EmptyCompletion { provider: "ollama" };
        assert!(!empty.is_transient());
    }
}
