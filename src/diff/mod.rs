//! Diff synthesis from before/after file contents.
//!
//! Reconstructs a unified-diff-style text for a set of changed files without
//! shelling out to an external diff tool. The comparison is positional: both
//! line lists are walked index by index, and differing rows become a
//! remove/add pair. No context lines and no hunk headers are produced;
//! downstream consumers only need path extraction and add/remove lines.

pub mod section;

pub use section::{section_path, split_sections};

use crate::repo::{ChangeKind, ChangeRecord};

/// Fixed object-id placeholder used in synthetic `index` header lines.
/// Syntactically well-formed for a diff header, no hash semantics.
const OID_PLACEHOLDER: &str = "xxxxxxx";

/// The unified-diff-style text block for one file's change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSection {
    pub path: String,
    pub text: String,
}

/// Synthesize a diff section for one file.
///
/// `before` is the content at the last snapshot (absent for new files),
/// `after` the content being compared against (absent for deleted files).
/// Returns `None` when both sides are identical or both are absent.
pub fn synthesize(path: &str, before: Option<&str>, after: Option<&str>) -> Option<DiffSection> {
    let text = match (before, after) {
        (None, None) => return None,
        (None, Some(added)) => new_file_section(path, added),
        (Some(removed), None) => deleted_file_section(path, removed),
        (Some(old), Some(new)) => {
            if old == new {
                return None;
            }
            modified_section(path, old, new)
        }
    };

    Some(DiffSection {
        path: path.to_string(),
        text,
    })
}

/// Render the full diff text for a set of change records, in input order.
///
/// Records whose before/after contents are identical contribute nothing.
pub fn render(records: &[ChangeRecord]) -> String {
    let sections: Vec<String> = records
        .iter()
        .filter_map(|r| {
            debug_assert!(record_shape_valid(r), "content missing for {:?}", r.kind);
            synthesize(&r.path, r.before.as_deref(), r.after.as_deref()).map(|s| s.text)
        })
        .collect();

    sections.join("\n")
}

fn record_shape_valid(record: &ChangeRecord) -> bool {
    match record.kind {
        ChangeKind::Added => record.before.is_none() && record.after.is_some(),
        ChangeKind::Deleted => record.before.is_some() && record.after.is_none(),
        ChangeKind::Modified => record.before.is_some() && record.after.is_some(),
    }
}

fn new_file_section(path: &str, content: &str) -> String {
    format!(
        "diff --git a/{path} b/{path}\nnew file mode 100644\nindex 0000000..{OID_PLACEHOLDER}\n--- /dev/null\n+++ b/{path}\n{}",
        prefix_lines(content, '+')
    )
}

fn deleted_file_section(path: &str, content: &str) -> String {
    format!(
        "diff --git a/{path} b/{path}\ndeleted file mode 100644\nindex {OID_PLACEHOLDER}..0000000\n--- a/{path}\n+++ /dev/null\n{}",
        prefix_lines(content, '-')
    )
}

/// Positional line comparison, not a minimal-edit diff.
///
/// An insertion near the top of a file shifts every later line and shows up
/// as a run of remove/add pairs. Known quality tradeoff, kept deliberately.
fn modified_section(path: &str, old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    let mut lines = vec![
        format!("diff --git a/{path} b/{path}"),
        format!("index {OID_PLACEHOLDER}..{OID_PLACEHOLDER} 100644"),
        format!("--- a/{path}"),
        format!("+++ b/{path}"),
    ];

    for i in 0..old_lines.len().max(new_lines.len()) {
        let old_line = old_lines.get(i).copied().unwrap_or("");
        let new_line = new_lines.get(i).copied().unwrap_or("");

        if old_line != new_line {
            if !old_line.is_empty() {
                lines.push(format!("-{old_line}"));
            }
            if !new_line.is_empty() {
                lines.push(format!("+{new_line}"));
            }
        }
    }

    lines.join("\n")
}

/// Prefix every line of `content` with `marker`, leaving a trailing empty
/// line (from a final newline) unprefixed so the trailing newline survives.
fn prefix_lines(content: &str, marker: char) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let last = lines.len() - 1;

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == last && line.is_empty() {
                String::new()
            } else {
                format!("{marker}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
