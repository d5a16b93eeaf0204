//! Shared test utilities for integration tests.
//!
//! Not all helpers are used by every test file.
#![allow(dead_code)]

use std::path::Path;

use git2::Repository;
use quill::repo::WorkingRepo;

/// A scratch git repository for pipeline tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
}

impl TestRepo {
    /// Initialize an empty repository with a test identity configured.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        let mut config = repo.config().expect("Failed to open repo config");
        config
            .set_str("user.name", "Test User")
            .expect("Failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Failed to set user.email");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open the repository through the crate under test.
    pub fn working(&self) -> WorkingRepo {
        WorkingRepo::open(self.path()).expect("Failed to open working repo")
    }

    /// Write a file, creating parent directories as needed.
    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Write raw bytes (for content the text pipeline must skip).
    pub fn write_bytes(&self, rel: &str, bytes: &[u8]) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(path, bytes).expect("Failed to write file");
    }

    pub fn remove_file(&self, rel: &str) {
        std::fs::remove_file(self.path().join(rel)).expect("Failed to remove file");
    }

    /// Stage everything and commit it.
    pub fn commit_all(&self, message: &str) {
        let working = self.working();
        working.stage_all().expect("Failed to stage");
        working.commit(message).expect("Failed to commit");
    }
}
