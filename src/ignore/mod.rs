//! `.quillignore` discovery, compilation, and diff filtering.
//!
//! Ignore files keep matching diff sections from ever leaving the machine,
//! so their handling is deliberately strict: a file that fails to compile
//! aborts the run instead of being skipped.
//!
//! Precedence is simplified relative to full gitignore layering: a section
//! is hidden when its path matches a pattern in *any* discovered file,
//! regardless of directory depth. A closer file cannot un-ignore what an
//! ancestor ignored. Within a single file, gitignore semantics apply
//! (later rules win, `!` negates).

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

use crate::diff::{section_path, split_sections};
use crate::error::IgnoreError;

/// File name for ignore-pattern files. Distinct from `.gitignore` so that
/// VCS-ignore and summarization-ignore semantics never get conflated.
pub const IGNORE_FILE_NAME: &str = ".quillignore";

/// One compiled ignore file.
pub struct PatternMatcher {
    source: PathBuf,
    matcher: Gitignore,
}

impl PatternMatcher {
    /// Compile a single ignore file. Malformed patterns are fatal.
    fn compile(file: &Path) -> Result<Self, IgnoreError> {
        let contents = std::fs::read_to_string(file).map_err(|source| IgnoreError::ReadFailed {
            path: file.to_path_buf(),
            source,
        })?;

        let root = file.parent().unwrap_or_else(|| Path::new("."));
        let mut builder = GitignoreBuilder::new(root);
        for line in contents.lines() {
            builder
                .add_line(Some(file.to_path_buf()), line)
                .map_err(|source| IgnoreError::CompileFailed {
                    path: file.to_path_buf(),
                    source: Box::new(source),
                })?;
        }

        let matcher = builder.build().map_err(|source| IgnoreError::CompileFailed {
            path: file.to_path_buf(),
            source: Box::new(source),
        })?;

        Ok(Self {
            source: file.to_path_buf(),
            matcher,
        })
    }

    /// Whether a repository-relative path matches any rule in this file.
    /// Directory-only rules apply to everything beneath the directory.
    fn matches(&self, path: &str) -> bool {
        self.matcher
            .matched_path_or_any_parents(path, false)
            .is_ignore()
    }
}

/// Ordered collection of compiled ignore files, closest directory first.
///
/// Built fresh for every filtering call; ignore files may change between
/// runs, so nothing is cached.
#[derive(Default)]
pub struct PatternSet {
    matchers: Vec<PatternMatcher>,
}

impl PatternSet {
    /// A set with no rules; [`PatternSet::filter`] becomes the identity.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Walk from `start` upward collecting every ignore file.
    ///
    /// The walk is an explicit loop bounded by `stop` (normally the
    /// repository root) or, failing that, the filesystem root, so deeply
    /// nested or symlinked trees cannot make it spin.
    pub fn discover(start: &Path, stop: Option<&Path>) -> Result<Self, IgnoreError> {
        let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
        let stop = stop.map(|s| s.canonicalize().unwrap_or_else(|_| s.to_path_buf()));

        let mut matchers = Vec::new();
        let mut dir = start.as_path();

        loop {
            let candidate = dir.join(IGNORE_FILE_NAME);
            if candidate.is_file() {
                debug!(file = %candidate.display(), "compiling ignore file");
                matchers.push(PatternMatcher::compile(&candidate)?);
            }

            if stop.as_deref() == Some(dir) {
                break;
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }

        Ok(Self { matchers })
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Whether any discovered ignore file hides this path.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| {
            let hit = m.matches(path);
            if hit {
                debug!(path, file = %m.source.display(), "section hidden by ignore rule");
            }
            hit
        })
    }

    /// Drop every diff section whose path matches the set.
    ///
    /// Sections are reassembled in their original order. Sections without
    /// an extractable header path are dropped as malformed. With an empty
    /// set the input passes through unchanged.
    pub fn filter(&self, diff: &str) -> String {
        if self.matchers.is_empty() {
            return diff.to_string();
        }

        let surviving: Vec<String> = split_sections(diff)
            .into_iter()
            .filter(|section| match section_path(section) {
                Some(path) => !self.is_ignored(path),
                None => false,
            })
            .collect();

        surviving.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_from_lines(dir: &Path, lines: &str) -> PatternSet {
        std::fs::write(dir.join(IGNORE_FILE_NAME), lines).unwrap();
        PatternSet::discover(dir, Some(dir)).unwrap()
    }

    #[test]
    fn empty_set_is_identity() {
        let diff = "diff --git a/a.rs b/a.rs\n--- a/a.rs\n+++ b/a.rs\n+x";
        assert_eq!(PatternSet::empty().filter(diff), diff);
    }

    #[test]
    fn glob_hides_matching_section() {
        let dir = tempfile::tempdir().unwrap();
        let set = set_from_lines(dir.path(), "*.log\n");

        assert!(set.is_ignored("debug.log"));
        assert!(set.is_ignored("nested/deep/trace.log"));
        assert!(!set.is_ignored("app.rs"));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let set = set_from_lines(dir.path(), "# secrets\n\n*.pem\n");

        assert_eq!(set.len(), 1);
        assert!(set.is_ignored("server.pem"));
        assert!(!set.is_ignored("# secrets"));
    }

    #[test]
    fn directory_rule_hides_files_beneath() {
        let dir = tempfile::tempdir().unwrap();
        let set = set_from_lines(dir.path(), "logs/\n");

        assert!(set.is_ignored("logs/app.txt"));
        assert!(set.is_ignored("logs/2024/app.txt"));
        assert!(!set.is_ignored("logstash.rs"));
    }

    #[test]
    fn negation_within_one_file_applies() {
        let dir = tempfile::tempdir().unwrap();
        let set = set_from_lines(dir.path(), "*.log\n!keep.log\n");

        assert!(set.is_ignored("debug.log"));
        assert!(!set.is_ignored("keep.log"));
    }

    #[test]
    fn filter_drops_matching_sections_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let set = set_from_lines(dir.path(), "*.log\n");

        let diff = "diff --git a/app.rs b/app.rs\n--- a/app.rs\n+++ b/app.rs\n+code\ndiff --git a/debug.log b/debug.log\n--- a/debug.log\n+++ b/debug.log\n+noise\ndiff --git a/z.rs b/z.rs\n--- a/z.rs\n+++ b/z.rs\n+more";

        let filtered = set.filter(diff);
        assert!(filtered.contains("a/app.rs"));
        assert!(filtered.contains("a/z.rs"));
        assert!(!filtered.contains("debug.log"));
        assert!(filtered.find("app.rs").unwrap() < filtered.find("z.rs").unwrap());
    }

    #[test]
    fn filter_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let set = set_from_lines(dir.path(), "*.log\n");

        let diff = "diff --git a/app.rs b/app.rs\n+code\ndiff --git a/x.log b/x.log\n+noise";
        let once = set.filter(diff);
        assert_eq!(set.filter(&once), once);
    }

    #[test]
    fn all_sections_ignored_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let set = set_from_lines(dir.path(), "*\n");

        let diff = "diff --git a/a.rs b/a.rs\n+x";
        assert_eq!(set.filter(diff), "");
    }

    #[test]
    fn discovery_collects_ancestor_files_up_to_stop() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(root.path().join(IGNORE_FILE_NAME), "*.pem\n").unwrap();
        std::fs::write(nested.join(IGNORE_FILE_NAME), "*.log\n").unwrap();

        let set = PatternSet::discover(&nested, Some(root.path())).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.is_ignored("debug.log"));
        assert!(set.is_ignored("secret.pem"));
    }

    #[test]
    fn discovery_does_not_walk_past_stop() {
        let outer = tempfile::tempdir().unwrap();
        let repo_root = outer.path().join("repo");
        std::fs::create_dir_all(&repo_root).unwrap();

        // A file above the boundary must not be picked up.
        std::fs::write(outer.path().join(IGNORE_FILE_NAME), "*.rs\n").unwrap();

        let set = PatternSet::discover(&repo_root, Some(&repo_root)).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_ignored("main.rs"));
    }

    #[test]
    fn any_match_across_files_hides_without_cross_file_unignore() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("sub");
        std::fs::create_dir_all(&nested).unwrap();

        // Ancestor ignores, closer file tries to un-ignore. The chosen
        // policy hides the path anyway.
        std::fs::write(root.path().join(IGNORE_FILE_NAME), "*.log\n").unwrap();
        std::fs::write(nested.join(IGNORE_FILE_NAME), "!debug.log\n").unwrap();

        let set = PatternSet::discover(&nested, Some(root.path())).unwrap();
        assert!(set.is_ignored("debug.log"));
    }
}
