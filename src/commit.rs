//! Detect changes after a fetch and record them in a single commit.

use std::path::Path;

use crate::git::{GitError, Vcs};

/// Marker opening every generated commit message.
pub const MARKER: &str = "sharelatex-git-integration";

/// Local time, e.g. `2024/01/02 03:04:05`.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// What the coordinator did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created with this message.
    Committed { message: String },
    /// The working tree matched the last commit.
    NoChanges,
}

/// Build `[<marker> <title> <timestamp>] <text>`.
///
/// The title and the free text are optional; empty strings count as absent.
pub fn commit_message(title: Option<&str>, text: Option<&str>, timestamp: &str) -> String {
    let mut message = match title.filter(|t| !t.is_empty()) {
        Some(title) => format!("[{MARKER} {title} {timestamp}]"),
        None => format!("[{MARKER} {timestamp}]"),
    };
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        message.push(' ');
        message.push_str(text);
    }
    message
}

/// Commit everything under the working directory plus the exclusion file,
/// unless the scoped status reports a clean tree.
pub fn commit_changes(
    vcs: &dyn Vcs,
    exclusion_file: &Path,
    title: Option<&str>,
    text: Option<&str>,
) -> Result<CommitOutcome, GitError> {
    if !vcs.working_tree_status()?.changes_present {
        log::info!("No changes to commit.");
        return Ok(CommitOutcome::NoChanges);
    }

    match text.filter(|t| !t.is_empty()) {
        Some(text) => log::info!("Committing changes. Message: {}.", text),
        None => log::info!("Committing changes. No message."),
    }

    vcs.add_all(Path::new("."))?;
    vcs.add_all(exclusion_file)?;

    let message = commit_message(title, text, &timestamp_now());
    vcs.commit(&message)?;
    Ok(CommitOutcome::Committed { message })
}
