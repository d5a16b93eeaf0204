//! quill - A CLI tool that turns pending git changes into AI-generated commit messages.
//!
//! # Overview
//!
//! quill inspects a repository's pending changes (staged, unstaged, or a
//! brand-new repository), reconstructs a unified-diff-style text for them
//! without shelling out to an external diff tool, filters that text through
//! `.quillignore` pattern files, and sends the result to a text-generation
//! backend to produce a commit message.

pub mod config;
pub mod diff;
pub mod error;
pub mod generator;
pub mod ignore;
pub mod interactive;
pub mod repo;

// Re-export commonly used types
pub use config::{Provider, Settings};
pub use diff::{DiffSection, synthesize};
pub use error::{ConfigError, EditorError, GeneratorError, IgnoreError, RepoError};
pub use ignore::PatternSet;
pub use repo::{ChangeKind, ChangeRecord, ChangeSet, WorkingRepo};
