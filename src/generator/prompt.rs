//! Prompt template loading and rendering.
//!
//! Templates are plain text files with `{{diff}}` and `{{language}}`
//! placeholders, kept next to the global config file so users can tune the
//! instructions without rebuilding.

use std::path::Path;

use crate::error::GeneratorError;

/// Built-in template written out on first use.
pub const DEFAULT_TEMPLATE: &str = r#"You are an expert developer reviewing a git diff to write the commit message.

Answer in {{language}}.

Git diff:
{{diff}}

Write a single-line commit message for the change above that:
1. Is concise and descriptive (50 characters or less preferred)
2. Uses the conventional commit format where it applies (feat:, fix:, docs:, ...)
3. Describes WHAT changed, not how it was implemented
4. Uses the imperative mood ("Add feature", not "Added feature")

Commit message:"#;

/// A loaded prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read the template at `path`, creating it with [`DEFAULT_TEMPLATE`]
    /// when missing.
    pub fn load_or_create(path: &Path) -> Result<Self, GeneratorError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self { text }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let write = || -> std::io::Result<()> {
                    if let Some(dir) = path.parent() {
                        std::fs::create_dir_all(dir)?;
                    }
                    std::fs::write(path, DEFAULT_TEMPLATE)
                };
                write().map_err(|source| GeneratorError::TemplateFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(Self {
                    text: DEFAULT_TEMPLATE.to_string(),
                })
            }
            Err(source) => Err(GeneratorError::TemplateFailed {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Substitute the diff and language placeholders.
    pub fn render(&self, diff: &str, language: &str) -> String {
        self.text
            .replace("{{diff}}", diff)
            .replace("{{language}}", language)
    }
}
