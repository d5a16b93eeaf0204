//! Repository access and change-set selection using git2.
//!
//! The selector decides which comparison to present: staged changes win
//! over unstaged ones, a repository with no history yet produces an
//! "everything is newly added" diff, and a quiet tree yields
//! [`ChangeSet::Clean`]. Repository metadata failures abort the run;
//! failures reading any single file only drop that file from the output.

pub mod changes;

pub use changes::{ChangeKind, ChangeRecord};

use std::path::{Component, Path, PathBuf};

use git2::{ErrorCode, IndexAddOption, Oid, Repository, Status, StatusOptions, Statuses, Tree};
use tracing::debug;

use crate::diff;
use crate::error::RepoError;

const STAGED_MASK: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const WORKTREE_MASK: Status = Status::WT_NEW
    .union(Status::WT_MODIFIED)
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);

/// The selected change-set, carrying its rendered diff text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// Last snapshot vs. the staging area.
    Staged(String),
    /// Last snapshot vs. the working copy.
    Unstaged(String),
    /// Brand-new repository: every present file as an addition.
    InitialImport(String),
    /// Nothing to summarize. A normal outcome, not an error.
    Clean,
}

impl ChangeSet {
    /// The raw diff text, or `None` for a clean tree.
    pub fn diff_text(&self) -> Option<&str> {
        match self {
            ChangeSet::Staged(text)
            | ChangeSet::Unstaged(text)
            | ChangeSet::InitialImport(text) => Some(text),
            ChangeSet::Clean => None,
        }
    }
}

/// A git repository bound to its working directory root.
pub struct WorkingRepo {
    repo: Repository,
    root: PathBuf,
}

impl WorkingRepo {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        let repo = Repository::discover(path).map_err(|source| RepoError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let root = repo
            .workdir()
            .ok_or(RepoError::BareRepository)?
            .to_path_buf();
        Ok(Self { repo, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Select and render the change-set most likely wanted for a summary.
    ///
    /// Policy order: staged, unstaged, initial import (no history yet),
    /// clean. A staged diff that renders empty (for example, a staged file
    /// reverted to its snapshot content) falls through to the unstaged
    /// comparison.
    pub fn pending_changes(&self) -> Result<ChangeSet, RepoError> {
        let statuses = self.statuses()?;

        let Some(head_tree) = self.head_tree()? else {
            let text = diff::render(&self.initial_records(&statuses));
            return Ok(if text.is_empty() {
                ChangeSet::Clean
            } else {
                ChangeSet::InitialImport(text)
            });
        };

        let staged = diff::render(&self.staged_records(&statuses, &head_tree));
        if !staged.is_empty() {
            return Ok(ChangeSet::Staged(staged));
        }

        let unstaged = diff::render(&self.unstaged_records(&statuses, &head_tree));
        if !unstaged.is_empty() {
            return Ok(ChangeSet::Unstaged(unstaged));
        }

        Ok(ChangeSet::Clean)
    }

    fn statuses(&self) -> Result<Statuses<'_>, RepoError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .exclude_submodules(true);
        self.repo
            .statuses(Some(&mut opts))
            .map_err(RepoError::StatusFailed)
    }

    /// Resolve the HEAD tree, distinguishing no-history-yet from real
    /// failures: `Ok(None)` for an unborn branch, `Err` for anything else.
    fn head_tree(&self) -> Result<Option<Tree<'_>>, RepoError> {
        let head = match self.repo.head() {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(RepoError::HeadFailed(e)),
        };
        let tree = head.peel_to_tree().map_err(RepoError::HeadFailed)?;
        Ok(Some(tree))
    }

    /// Snapshot-vs-index records for every staged entry.
    fn staged_records(&self, statuses: &Statuses<'_>, head_tree: &Tree<'_>) -> Vec<ChangeRecord> {
        let mut records = Vec::new();

        for entry in statuses.iter() {
            let status = entry.status();
            if !status.intersects(STAGED_MASK) {
                continue;
            }
            let Some(path) = entry.path() else {
                debug!("skipping entry with non-UTF-8 path");
                continue;
            };

            let record = if status.contains(Status::INDEX_DELETED) {
                self.snapshot_content(head_tree, path)
                    .map(|before| ChangeRecord::deleted(path, before))
            } else {
                let after = self.index_content(path);
                match (self.snapshot_content(head_tree, path), after) {
                    (Some(before), Some(after)) => {
                        Some(ChangeRecord::modified(path, before, after))
                    }
                    (None, Some(after)) => Some(ChangeRecord::added(path, after)),
                    _ => None,
                }
            };

            match record {
                Some(record) => records.push(record),
                None => debug!(path, "skipping staged entry with unreadable content"),
            }
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    /// Snapshot-vs-working-copy records for every worktree entry.
    fn unstaged_records(&self, statuses: &Statuses<'_>, head_tree: &Tree<'_>) -> Vec<ChangeRecord> {
        let mut records = Vec::new();

        for entry in statuses.iter() {
            let status = entry.status();
            if !status.intersects(WORKTREE_MASK) || status.contains(Status::IGNORED) {
                continue;
            }
            let Some(path) = entry.path() else {
                debug!("skipping entry with non-UTF-8 path");
                continue;
            };

            let record = if status.contains(Status::WT_DELETED) {
                self.snapshot_content(head_tree, path)
                    .map(|before| ChangeRecord::deleted(path, before))
            } else {
                let after = self.workdir_content(path);
                match (self.snapshot_content(head_tree, path), after) {
                    (Some(before), Some(after)) => {
                        Some(ChangeRecord::modified(path, before, after))
                    }
                    (None, Some(after)) => Some(ChangeRecord::added(path, after)),
                    _ => None,
                }
            };

            match record {
                Some(record) => records.push(record),
                None => debug!(path, "skipping worktree entry with unreadable content"),
            }
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    /// Everything-is-new records for a repository without history.
    ///
    /// Files whose content cannot be read (permissions, non-UTF-8 bytes)
    /// are silently dropped rather than failing the whole operation.
    fn initial_records(&self, statuses: &Statuses<'_>) -> Vec<ChangeRecord> {
        let mut records = Vec::new();

        for entry in statuses.iter() {
            let status = entry.status();
            if status.contains(Status::IGNORED) {
                continue;
            }
            if !status.intersects(STAGED_MASK.union(WORKTREE_MASK)) {
                continue;
            }
            let Some(path) = entry.path() else {
                continue;
            };

            match self.workdir_content(path) {
                Some(content) => records.push(ChangeRecord::added(path, content)),
                None => debug!(path, "skipping unreadable file in initial import"),
            }
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    /// File content as of the last snapshot, when it is valid text.
    fn snapshot_content(&self, tree: &Tree<'_>, path: &str) -> Option<String> {
        let entry = tree.get_path(Path::new(path)).ok()?;
        let object = entry.to_object(&self.repo).ok()?;
        let blob = object.into_blob().ok()?;
        String::from_utf8(blob.content().to_vec()).ok()
    }

    /// File content as recorded in the staging area.
    fn index_content(&self, path: &str) -> Option<String> {
        let index = self.repo.index().ok()?;
        let entry = index.get_path(Path::new(path), 0)?;
        let blob = self.repo.find_blob(entry.id).ok()?;
        String::from_utf8(blob.content().to_vec()).ok()
    }

    /// File content as currently on disk.
    fn workdir_content(&self, path: &str) -> Option<String> {
        if !path_is_safe(path) {
            debug!(path, "skipping path that escapes the repository");
            return None;
        }
        let bytes = std::fs::read(self.root.join(path)).ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Stage all changes, like `git add -A`.
    pub fn stage_all(&self) -> Result<(), RepoError> {
        let mut index = self.repo.index().map_err(RepoError::StagingFailed)?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(RepoError::StagingFailed)?;
        index.write().map_err(RepoError::StagingFailed)?;
        Ok(())
    }

    /// Create a commit from the staging area with the given message.
    ///
    /// Supports the initial commit (unborn HEAD gets no parents). Refuses
    /// to commit when nothing is staged.
    pub fn commit(&self, message: &str) -> Result<Oid, RepoError> {
        let has_staged = self
            .statuses()?
            .iter()
            .any(|entry| entry.status().intersects(STAGED_MASK));
        if !has_staged {
            return Err(RepoError::NothingStaged);
        }

        let mut index = self.repo.index().map_err(RepoError::StagingFailed)?;
        let tree_id = index.write_tree().map_err(RepoError::CommitFailed)?;
        let tree = self.repo.find_tree(tree_id).map_err(RepoError::CommitFailed)?;

        let sig = self.repo.signature().map_err(RepoError::SignatureMissing)?;

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(RepoError::CommitFailed)
    }

    /// Message of the last commit, for `--show`.
    pub fn last_commit_message(&self) -> Result<String, RepoError> {
        let commit = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(RepoError::HeadFailed)?;
        Ok(commit.message().unwrap_or_default().to_string())
    }
}

/// Repository-relative paths must stay inside the repository: no absolute
/// paths, no `..` traversal segments.
fn path_is_safe(path: &str) -> bool {
    let path = Path::new(path);
    !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo() -> (tempfile::TempDir, WorkingRepo) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        drop(repo);
        let working = WorkingRepo::open(dir.path()).unwrap();
        (dir, working)
    }

    fn commit_file(repo: &WorkingRepo, dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
        repo.stage_all().unwrap();
        repo.commit("setup").unwrap();
    }

    #[test]
    fn open_fails_outside_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WorkingRepo::open(dir.path()),
            Err(RepoError::OpenFailed { .. })
        ));
    }

    #[test]
    fn clean_tree_yields_clean_change_set() {
        let (dir, repo) = init_repo();
        commit_file(&repo, dir.path(), "file.txt", "content\n");

        assert_eq!(repo.pending_changes().unwrap(), ChangeSet::Clean);
    }

    #[test]
    fn unstaged_modification_is_selected() {
        let (dir, repo) = init_repo();
        commit_file(&repo, dir.path(), "file.txt", "original\n");

        std::fs::write(dir.path().join("file.txt"), "changed\n").unwrap();

        match repo.pending_changes().unwrap() {
            ChangeSet::Unstaged(text) => {
                assert!(text.contains("-original"));
                assert!(text.contains("+changed"));
            }
            other => panic!("expected unstaged change-set, got {other:?}"),
        }
    }

    #[test]
    fn staged_wins_over_unstaged() {
        let (dir, repo) = init_repo();
        commit_file(&repo, dir.path(), "file.txt", "original\n");

        // Stage one version, then modify the working copy further.
        std::fs::write(dir.path().join("file.txt"), "staged version\n").unwrap();
        repo.stage_all().unwrap();
        std::fs::write(dir.path().join("file.txt"), "disk version\n").unwrap();

        match repo.pending_changes().unwrap() {
            ChangeSet::Staged(text) => {
                assert!(text.contains("+staged version"));
                assert!(
                    !text.contains("disk version"),
                    "unstaged edits must not leak into the staged diff"
                );
            }
            other => panic!("expected staged change-set, got {other:?}"),
        }
    }

    #[test]
    fn deleted_file_appears_as_removals() {
        let (dir, repo) = init_repo();
        commit_file(&repo, dir.path(), "doomed.txt", "line one\n");

        std::fs::remove_file(dir.path().join("doomed.txt")).unwrap();

        match repo.pending_changes().unwrap() {
            ChangeSet::Unstaged(text) => {
                assert!(text.contains("deleted file mode 100644"));
                assert!(text.contains("-line one"));
            }
            other => panic!("expected unstaged change-set, got {other:?}"),
        }
    }

    #[test]
    fn new_repository_produces_initial_import() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("a.txt"), "hi\n").unwrap();

        match repo.pending_changes().unwrap() {
            ChangeSet::InitialImport(text) => {
                assert!(text.contains("new file mode 100644"));
                assert!(text.contains("+hi"));
            }
            other => panic!("expected initial import, got {other:?}"),
        }
    }

    #[test]
    fn initial_import_skips_unreadable_files_silently() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("a.txt"), "hi\n").unwrap();
        // Not valid UTF-8: the text pipeline cannot represent it.
        std::fs::write(dir.path().join("b.bin"), [0u8, 159, 146, 150]).unwrap();

        match repo.pending_changes().unwrap() {
            ChangeSet::InitialImport(text) => {
                assert!(text.contains("a.txt"));
                assert!(!text.contains("b.bin"));
            }
            other => panic!("expected initial import, got {other:?}"),
        }
    }

    #[test]
    fn empty_new_repository_is_clean() {
        let (_dir, repo) = init_repo();
        assert_eq!(repo.pending_changes().unwrap(), ChangeSet::Clean);
    }

    #[test]
    fn commit_refuses_empty_staging_area() {
        let (dir, repo) = init_repo();
        commit_file(&repo, dir.path(), "file.txt", "content\n");

        assert!(matches!(
            repo.commit("chore: nothing"),
            Err(RepoError::NothingStaged)
        ));
    }

    #[test]
    fn stage_all_then_commit_records_message() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("new.txt"), "hello\n").unwrap();

        repo.stage_all().unwrap();
        let oid = repo.commit("feat: add new file").unwrap();

        let stored = WorkingRepo::open(dir.path()).unwrap();
        assert_eq!(stored.last_commit_message().unwrap(), "feat: add new file");
        assert!(!oid.is_zero());
    }

    #[test]
    fn path_safety_rejects_traversal() {
        assert!(path_is_safe("src/main.rs"));
        assert!(path_is_safe("./notes.txt"));
        assert!(!path_is_safe("../outside.txt"));
        assert!(!path_is_safe("a/../../outside.txt"));
        assert!(!path_is_safe("/etc/passwd"));
    }
}
