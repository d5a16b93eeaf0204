//! Splitting diff text back into per-file sections.
//!
//! The ignore-filter stage works on rendered diff text, so it needs to
//! recover section boundaries and the path each section belongs to. Only
//! the `diff --git` header line is interpreted; everything else is opaque.

use std::sync::OnceLock;

use regex_lite::Regex;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^diff --git a/(.+) b/").expect("header regex is valid")
    })
}

/// Split a full diff text into per-file sections.
///
/// A new section starts at every `diff --git` line. Lines preceding the
/// first header (none are produced by the synthesizer, but filter input is
/// not trusted) form a headerless leading section that the filter drops.
pub fn split_sections(diff: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in diff.split('\n') {
        if line.starts_with("diff --git") && !current.is_empty() {
            sections.push(current.join("\n"));
            current = vec![line];
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        sections.push(current.join("\n"));
    }

    sections
}

/// Extract the repository-relative path from a section's header line.
///
/// Takes the first path token of the `diff --git a/<path> b/<path>` line
/// with its `a/` prefix stripped. Returns `None` for sections without a
/// well-formed header.
pub fn section_path(section: &str) -> Option<&str> {
    for line in section.lines() {
        if let Some(captures) = header_re().captures(line) {
            return captures.get(1).map(|m| m.as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SECTIONS: &str = "diff --git a/app.rs b/app.rs\nindex xxxxxxx..xxxxxxx 100644\n--- a/app.rs\n+++ b/app.rs\n-old\n+new\ndiff --git a/debug.log b/debug.log\nnew file mode 100644\nindex 0000000..xxxxxxx\n--- /dev/null\n+++ b/debug.log\n+noise";

    #[test]
    fn split_recovers_one_section_per_header() {
        let sections = split_sections(TWO_SECTIONS);
        assert_eq!(sections.len(), 2);
        assert!(sections[0].starts_with("diff --git a/app.rs"));
        assert!(sections[1].starts_with("diff --git a/debug.log"));
    }

    #[test]
    fn split_section_count_matches_header_count() {
        let headers = TWO_SECTIONS
            .lines()
            .filter(|l| l.starts_with("diff --git"))
            .count();
        assert_eq!(split_sections(TWO_SECTIONS).len(), headers);
    }

    #[test]
    fn split_keeps_section_bodies_intact() {
        let sections = split_sections(TWO_SECTIONS);
        assert!(sections[0].contains("-old"));
        assert!(sections[0].contains("+new"));
        assert!(!sections[0].contains("noise"));
        assert!(sections[1].contains("+noise"));
    }

    #[test]
    fn split_of_single_section_is_identity() {
        let single = "diff --git a/x b/x\n--- a/x\n+++ b/x\n+hi";
        let sections = split_sections(single);
        assert_eq!(sections, vec![single.to_string()]);
    }

    #[test]
    fn leading_garbage_becomes_headerless_section() {
        let diff = format!("stray line\n{TWO_SECTIONS}");
        let sections = split_sections(&diff);
        assert_eq!(sections.len(), 3);
        assert_eq!(section_path(&sections[0]), None);
    }

    #[test]
    fn path_extracted_from_header() {
        assert_eq!(
            section_path("diff --git a/src/deep/file.rs b/src/deep/file.rs\n+x"),
            Some("src/deep/file.rs")
        );
    }

    #[test]
    fn path_with_spaces_is_preserved() {
        assert_eq!(
            section_path("diff --git a/my notes.txt b/my notes.txt"),
            Some("my notes.txt")
        );
    }

    #[test]
    fn no_header_no_path() {
        assert_eq!(section_path("+just content\n-lines"), None);
    }
}
