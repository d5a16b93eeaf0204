//! Settings loading with a layered override cascade.
//!
//! Priority, lowest to highest: built-in defaults, the global
//! `config.toml` (created on first run), project-local `.quill.toml`
//! overlays from the repository root down to the target directory
//! (closest file wins), then `QUILL_*` environment variables.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Project-local override file name.
pub const PROJECT_FILE_NAME: &str = ".quill.toml";

/// Default backend endpoint (a local Ollama instance).
pub const DEFAULT_API_URL: &str = "http://localhost:11434";

/// Default request timeout for generation backends.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Supported text-generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    OpenAi,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Flat settings record consumed by the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub model: String,
    pub provider: Provider,
    pub api_token: String,
    pub language: String,
    pub prompt_template: String,
    pub timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: "llama2".to_string(),
            provider: Provider::Ollama,
            api_token: String::new(),
            language: "english".to_string(),
            prompt_template: "default.txt".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A partial settings record parsed from a project overlay file.
/// Only present fields override the value beneath them.
#[derive(Debug, Default, Deserialize)]
struct SettingsPatch {
    api_url: Option<String>,
    model: Option<String>,
    provider: Option<Provider>,
    api_token: Option<String>,
    language: Option<String>,
    prompt_template: Option<String>,
    timeout_seconds: Option<u64>,
}

impl Settings {
    /// Default location of the global config file.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "quill").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load the full cascade for the given target directory.
    ///
    /// A missing global file is written out with defaults so the user has
    /// something to edit. `repo_root` bounds the overlay walk; when the
    /// target is not inside a repository no overlays apply.
    pub fn load(
        config_file: &Path,
        target: &Path,
        repo_root: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        if config_file.exists() {
            let raw =
                std::fs::read_to_string(config_file).map_err(|source| ConfigError::ReadFailed {
                    path: config_file.to_path_buf(),
                    source,
                })?;
            settings = toml::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
                path: config_file.to_path_buf(),
                source,
            })?;
        } else {
            settings.save(config_file)?;
        }

        if let Some(root) = repo_root {
            for overlay in project_overlay_files(root, target) {
                settings.apply_overlay(&overlay)?;
            }
        }

        settings.apply_env();
        Ok(settings)
    }

    /// Write the settings atomically (tempfile in the target directory,
    /// then persist over the destination).
    pub fn save(&self, config_file: &Path) -> Result<(), ConfigError> {
        let serialized = toml::to_string_pretty(self).map_err(ConfigError::SerializeFailed)?;

        let dir = config_file.parent().unwrap_or_else(|| Path::new("."));
        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(dir)?;
            let mut file = tempfile::NamedTempFile::new_in(dir)?;
            std::io::Write::write_all(&mut file, serialized.as_bytes())?;
            file.persist(config_file).map_err(|e| e.error)?;
            Ok(())
        };

        write().map_err(|source| ConfigError::WriteFailed {
            path: config_file.to_path_buf(),
            source,
        })
    }

    fn apply_overlay(&mut self, overlay: &Path) -> Result<(), ConfigError> {
        let raw = match std::fs::read_to_string(overlay) {
            Ok(raw) => raw,
            // Overlays are optional; only parse failures are fatal.
            Err(_) => return Ok(()),
        };
        let patch: SettingsPatch =
            toml::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
                path: overlay.to_path_buf(),
                source,
            })?;
        self.apply_patch(patch);
        Ok(())
    }

    fn apply_patch(&mut self, patch: SettingsPatch) {
        if let Some(api_url) = patch.api_url {
            self.api_url = api_url;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
        if let Some(api_token) = patch.api_token {
            self.api_token = api_token;
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(prompt_template) = patch.prompt_template {
            self.prompt_template = prompt_template;
        }
        if let Some(timeout_seconds) = patch.timeout_seconds {
            self.timeout_seconds = timeout_seconds;
        }
    }

    /// Environment variables override every file-based layer.
    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("QUILL_API_URL") {
            if !value.is_empty() {
                self.api_url = value;
            }
        }
        if let Ok(value) = std::env::var("QUILL_MODEL") {
            if !value.is_empty() {
                self.model = value;
            }
        }
        if let Ok(value) = std::env::var("QUILL_PROVIDER") {
            match value.as_str() {
                "ollama" => self.provider = Provider::Ollama,
                "openai" => self.provider = Provider::OpenAi,
                "" => {}
                other => warn!("Unknown QUILL_PROVIDER '{other}', keeping {}", self.provider),
            }
        }
        if let Ok(value) = std::env::var("QUILL_API_TOKEN") {
            if !value.is_empty() {
                self.api_token = value;
            }
        }
        if let Ok(value) = std::env::var("QUILL_LANGUAGE") {
            if !value.is_empty() {
                self.language = value;
            }
        }
        if let Ok(value) = std::env::var("QUILL_PROMPT_TEMPLATE") {
            if !value.is_empty() {
                self.prompt_template = value;
            }
        }
        if let Ok(value) = std::env::var("QUILL_TIMEOUT_SECONDS") {
            match value.parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_seconds = secs,
                _ => warn!("Invalid QUILL_TIMEOUT_SECONDS '{value}', keeping {}", self.timeout_seconds),
            }
        }
    }

    /// Full path to the prompt template, resolved next to the config file.
    pub fn prompt_template_path(&self, config_file: &Path) -> PathBuf {
        let dir = config_file.parent().unwrap_or_else(|| Path::new("."));
        dir.join(&self.prompt_template)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Invalid("api_url cannot be empty".to_string()));
        }
        if self.model.is_empty() {
            return Err(ConfigError::Invalid("model cannot be empty".to_string()));
        }
        if self.language.is_empty() {
            return Err(ConfigError::Invalid("language cannot be empty".to_string()));
        }
        if self.prompt_template.is_empty() {
            return Err(ConfigError::Invalid(
                "prompt_template cannot be empty".to_string(),
            ));
        }
        if self.provider == Provider::OpenAi && self.api_token.is_empty() {
            return Err(ConfigError::Invalid(
                "api_token is required when using the openai provider".to_string(),
            ));
        }
        Ok(())
    }
}

/// Overlay files between the repository root and the target directory,
/// ordered so the file closest to the target is applied last and wins.
fn project_overlay_files(repo_root: &Path, target: &Path) -> Vec<PathBuf> {
    let repo_root = repo_root
        .canonicalize()
        .unwrap_or_else(|_| repo_root.to_path_buf());
    let target = target.canonicalize().unwrap_or_else(|_| target.to_path_buf());

    let mut files = Vec::new();
    let mut dir = target.as_path();

    loop {
        if dir.starts_with(&repo_root) {
            files.push(dir.join(PROJECT_FILE_NAME));
        }
        if dir == repo_root {
            break;
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }

    files.reverse();
    files
}
