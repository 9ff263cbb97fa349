//! Make sure the working directory is a repository that ignores our own files.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::git::{GitError, Vcs};

/// Name of the exclusion file at the repository root.
pub const EXCLUSION_FILE: &str = ".gitignore";

/// Initialize a repository unless one already exists.
///
/// Returns whether a new repository was created.
pub fn ensure_repository(vcs: &dyn Vcs) -> Result<bool, GitError> {
    if vcs.repo_status()?.is_repository {
        return Ok(false);
    }

    log::info!("Initializing empty git repository...");
    vcs.init()?;
    Ok(true)
}

/// Exclusion file governing the repository, resolved from its top level.
pub fn exclusion_file(vcs: &dyn Vcs) -> Result<PathBuf, GitError> {
    Ok(vcs.toplevel()?.join(EXCLUSION_FILE))
}

/// Entries not yet present, compared against trimmed existing lines.
fn missing_entries<'a>(existing: &str, entries: &[&'a str]) -> Vec<&'a str> {
    let lines: Vec<&str> = existing.lines().map(str::trim).collect();
    let mut missing: Vec<&str> = Vec::new();
    for entry in entries {
        if !lines.contains(entry) && !missing.contains(entry) {
            missing.push(*entry);
        }
    }
    missing
}

fn append_entries(path: &Path, entries: &[&str]) -> io::Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            log::debug!("cannot read {}: {}", path.display(), e);
            String::new()
        }
    };

    let missing = missing_entries(&existing, entries);
    if missing.is_empty() {
        return Ok(());
    }

    let mut block = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        block.push('\n');
    }
    for entry in missing {
        block.push_str(entry);
        block.push('\n');
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(block.as_bytes())
}

/// Append every entry missing from the exclusion file at `path`.
///
/// Existing content and ordering are preserved. A write failure is only a
/// warning; returns whether the file is known to be up to date.
pub fn ensure_ignore_entries(path: &Path, entries: &[&str]) -> bool {
    match append_entries(path, entries) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Can't edit .gitignore file [{}]: {}", path.display(), e);
            false
        }
    }
}

/// Run the whole bootstrap and return the exclusion file path.
pub fn bootstrap(vcs: &dyn Vcs, entries: &[&str]) -> Result<PathBuf, GitError> {
    ensure_repository(vcs)?;
    let path = exclusion_file(vcs)?;
    ensure_ignore_entries(&path, entries);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IGNORE_ENTRIES;
    use crate::git::GitCli;
    use crate::git::tests::git_available;
    use crate::sync::tests::FakeVcs;
    use tempfile::TempDir;

    #[test]
    fn missing_entries_skips_present_lines() {
        let existing = "*.aux\n  sharelatex-git  \n";
        assert_eq!(
            missing_entries(existing, &IGNORE_ENTRIES),
            vec!["sharelatex-git.py", ".sharelatex-git"]
        );
    }

    #[test]
    fn missing_entries_deduplicates_requested_entries() {
        assert_eq!(missing_entries("", &["a", "a", "b"]), vec!["a", "b"]);
    }

    #[test]
    fn creates_exclusion_file_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(EXCLUSION_FILE);

        assert!(ensure_ignore_entries(&path, &IGNORE_ENTRIES));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "sharelatex-git.py\nsharelatex-git\n.sharelatex-git\n"
        );
    }

    #[test]
    fn preserves_existing_content_and_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(EXCLUSION_FILE);
        fs::write(&path, "*.log\nsharelatex-git\nbuild/").unwrap();

        ensure_ignore_entries(&path, &IGNORE_ENTRIES);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "*.log\nsharelatex-git\nbuild/\nsharelatex-git.py\n.sharelatex-git\n"
        );
    }

    #[test]
    fn update_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(EXCLUSION_FILE);
        fs::write(&path, "*.pdf\n").unwrap();

        ensure_ignore_entries(&path, &IGNORE_ENTRIES);
        let once = fs::read_to_string(&path).unwrap();
        ensure_ignore_entries(&path, &IGNORE_ENTRIES);
        assert_eq!(fs::read_to_string(&path).unwrap(), once);
    }

    #[test]
    fn unwritable_exclusion_file_is_a_warning() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join(EXCLUSION_FILE);
        assert!(!ensure_ignore_entries(&path, &IGNORE_ENTRIES));
    }

    #[test]
    fn ensure_repository_initializes_only_when_absent() {
        let absent = FakeVcs::new().without_repository();
        assert!(ensure_repository(&absent).unwrap());
        assert_eq!(absent.calls(), vec!["status", "init"]);

        let present = FakeVcs::new();
        assert!(!ensure_repository(&present).unwrap());
        assert_eq!(present.calls(), vec!["status"]);
    }

    #[test]
    fn exclusion_file_lives_at_toplevel() {
        let vcs = FakeVcs::new().with_toplevel("/work/thesis");
        assert_eq!(
            exclusion_file(&vcs).unwrap(),
            PathBuf::from("/work/thesis/.gitignore")
        );
    }

    #[test]
    fn bootstrap_real_repository_from_subdirectory() {
        if !git_available() {
            eprintln!("skipping git test (git not found)");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        GitCli::new(temp_dir.path()).init().unwrap();
        let sub = temp_dir.path().join("paper");
        fs::create_dir(&sub).unwrap();

        let path = bootstrap(&GitCli::new(&sub), &IGNORE_ENTRIES).unwrap();
        assert_eq!(
            path.parent().unwrap().canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
        assert!(
            fs::read_to_string(&path)
                .unwrap()
                .contains(".sharelatex-git")
        );
        assert!(!sub.join(EXCLUSION_FILE).exists());
    }
}
