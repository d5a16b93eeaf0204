//! Change records: one per touched path in the selected change-set.

use std::fmt;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "Added"),
            ChangeKind::Modified => write!(f, "Modified"),
            ChangeKind::Deleted => write!(f, "Deleted"),
        }
    }
}

/// One touched path with its before/after contents.
///
/// Exactly one of `before`/`after` may be absent, and only in the
/// combination matching `kind`: `Added` has no before, `Deleted` has no
/// after, `Modified` has both.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// Repository-relative path. Never contains traversal segments.
    pub path: String,
    pub kind: ChangeKind,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl ChangeRecord {
    pub fn added(path: impl Into<String>, after: String) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Added,
            before: None,
            after: Some(after),
        }
    }

    pub fn modified(path: impl Into<String>, before: String, after: String) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Modified,
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn deleted(path: impl Into<String>, before: String) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Deleted,
            before: Some(before),
            after: None,
        }
    }
}
