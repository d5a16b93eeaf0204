//! Commit message generation from filtered diff text.
//!
//! A [`Generator`] renders the prompt template with the diff and target
//! language, then hands the prompt to the configured [`Backend`]. Backends
//! are trait objects so tests can substitute a canned implementation.

pub mod ollama;
pub mod openai;
pub mod prompt;
pub mod retry;

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::{Provider, Settings};
use crate::error::GeneratorError;

/// A text-generation backend: prompt in, message out.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Build the backend selected by the settings.
pub fn build_backend(settings: &Settings) -> Result<Box<dyn Backend>, GeneratorError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()
        .map_err(GeneratorError::ClientFailed)?;

    Ok(match settings.provider {
        Provider::Ollama => Box::new(OllamaBackend::new(client, &settings.api_url, &settings.model)),
        Provider::OpenAi => Box::new(OpenAiBackend::new(
            client,
            &settings.api_url,
            &settings.model,
            &settings.api_token,
        )),
    })
}

/// Turns filtered diff text into a commit message.
pub struct Generator {
    backend: Box<dyn Backend>,
    template: PromptTemplate,
    language: String,
}

impl Generator {
    /// Build a generator from validated settings; loads (or creates) the
    /// prompt template next to `config_file`.
    pub fn new(settings: &Settings, config_file: &Path) -> Result<Self, GeneratorError> {
        let template = PromptTemplate::load_or_create(&settings.prompt_template_path(config_file))?;
        Ok(Self {
            backend: build_backend(settings)?,
            template,
            language: settings.language.clone(),
        })
    }

    /// Test seam: assemble a generator from parts.
    pub fn with_backend(
        backend: Box<dyn Backend>,
        template: PromptTemplate,
        language: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            template,
            language: language.into(),
        }
    }

    /// Generate a commit message for the given diff text.
    pub async fn generate(&self, diff: &str) -> Result<String, GeneratorError> {
        let prompt = self.template.render(diff, &self.language);
        debug!(
            backend = self.backend.name(),
            chars = prompt.len(),
            "sending prompt to backend"
        );
        retry::with_backoff(|| self.backend.complete(&prompt)).await
    }
}
