//! Git operations through the git CLI.
//!
//! Every command runs in a fixed working directory with `LC_ALL=C`, and
//! its stdout and stderr are captured together. The free-form status
//! output is interpreted in exactly one place: [`RepoStatus::from_output`]
//! and [`WorkingTreeStatus::from_output`].

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Phrase git prints when run outside a repository.
const NOT_A_REPOSITORY: &str = "not a git repository";

/// Phrases git prints for a clean working tree. Git 2.9 renamed
/// "working directory" to "working tree".
const CLEAN_PHRASES: [&str; 2] = [
    "nothing to commit, working directory clean",
    "nothing to commit, working tree clean",
];

/// Errors returned by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// The git executable could not be started.
    #[error("failed to run \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// A command exited unsuccessfully.
    #[error("Error executing \"{command}\": error code {}. Output: {output}", display_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },
    /// Output parsing or unexpected git data.
    #[error("failed to parse git data: {0}")]
    ParseError(String),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// Whether the working directory belongs to a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoStatus {
    pub is_repository: bool,
}

impl RepoStatus {
    /// Interpret the combined output of `git status`.
    pub fn from_output(output: &str) -> Self {
        Self {
            is_repository: !output.to_lowercase().contains(NOT_A_REPOSITORY),
        }
    }
}

/// Whether the scoped working tree differs from the last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    pub changes_present: bool,
}

impl WorkingTreeStatus {
    /// Interpret the combined output of `git status .`.
    pub fn from_output(output: &str) -> Self {
        let lower = output.to_lowercase();
        Self {
            changes_present: !CLEAN_PHRASES.iter().any(|phrase| lower.contains(phrase)),
        }
    }
}

/// Captured result of a git invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

/// The version-control operations a sync run needs.
pub trait Vcs {
    /// `git status`, tolerating failure.
    fn repo_status(&self) -> Result<RepoStatus, GitError>;
    /// `git init`.
    fn init(&self) -> Result<(), GitError>;
    /// `git rev-parse --show-toplevel`.
    fn toplevel(&self) -> Result<PathBuf, GitError>;
    /// `git status .`
    fn working_tree_status(&self) -> Result<WorkingTreeStatus, GitError>;
    /// `git add -A <path>`.
    fn add_all(&self, path: &Path) -> Result<(), GitError>;
    /// `git commit -m <message>`.
    fn commit(&self, message: &str) -> Result<(), GitError>;
    /// `git push <remote> <branch>`.
    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError>;
}

/// Push targets come from configuration and are passed to git as bare
/// arguments, so anything git could read as an option or refspec is refused.
fn check_push_target(value: &str, what: &str) -> Result<(), GitError> {
    let problem = if value.is_empty() {
        "is empty"
    } else if value.starts_with('-') {
        "starts with '-'"
    } else if value.contains(':') || value.contains("..") {
        "is not a plain name"
    } else if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "contains whitespace"
    } else {
        return Ok(());
    };
    Err(GitError::InvalidInput(format!("{what} {value:?} {problem}")))
}

/// Git CLI wrapper bound to a working directory.
pub struct GitCli {
    git_path: String,
    workdir: PathBuf,
}

impl GitCli {
    /// Use the system git inside `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            git_path: "git".into(),
            workdir: workdir.into(),
        }
    }

    /// Create a Command with a stable locale so status phrases parse.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.current_dir(&self.workdir);
        cmd.env("LC_ALL", "C");
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Run git with `args`, returning the combined output.
    ///
    /// A non-zero exit is an error unless `allow_fail` is set.
    fn run(&self, mut cmd: Command, args: &[&str], allow_fail: bool) -> Result<CommandOutput, GitError> {
        let command = format!("git {}", args.join(" "));
        log::debug!("running {}", command);

        let output = cmd.args(args).output().map_err(|source| GitError::Spawn {
            command: command.clone(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        let result = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            output: text,
        };

        if !allow_fail && !result.success {
            return Err(GitError::CommandFailed {
                command,
                code: result.code,
                output: result.output,
            });
        }

        Ok(result)
    }

    fn run_checked(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        self.run(self.command(), args, false)
    }
}

impl Vcs for GitCli {
    fn repo_status(&self) -> Result<RepoStatus, GitError> {
        let result = self.run(self.command(), &["status"], true)?;
        Ok(RepoStatus::from_output(&result.output))
    }

    fn init(&self) -> Result<(), GitError> {
        self.run_checked(&["init"])?;
        Ok(())
    }

    fn toplevel(&self) -> Result<PathBuf, GitError> {
        let result = self.run_checked(&["rev-parse", "--show-toplevel"])?;
        let top = result.output.trim();
        if top.is_empty() {
            return Err(GitError::ParseError(
                "rev-parse returned an empty top-level directory".to_string(),
            ));
        }
        Ok(PathBuf::from(top))
    }

    fn working_tree_status(&self) -> Result<WorkingTreeStatus, GitError> {
        let result = self.run_checked(&["status", "."])?;
        Ok(WorkingTreeStatus::from_output(&result.output))
    }

    fn add_all(&self, path: &Path) -> Result<(), GitError> {
        let path = path
            .to_str()
            .ok_or_else(|| GitError::ParseError("path is not valid UTF-8".to_string()))?;
        self.run_checked(&["add", "-A", "--", path])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run_checked(&["commit", "-m", message])?;
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        check_push_target(remote, "remote")?;
        check_push_target(branch, "branch")?;

        // Credentials may be requested on the terminal.
        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit());
        self.run(cmd, &["push", remote, branch], false)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// `git init` plus a local identity so commits succeed anywhere.
    pub(crate) fn init_repo(dir: &Path) -> GitCli {
        let git = GitCli::new(dir);
        git.init().unwrap();
        for (key, value) in [
            ("user.name", "Sync Test"),
            ("user.email", "sync@example.com"),
            ("commit.gpgsign", "false"),
        ] {
            git.run_checked(&["config", key, value]).unwrap();
        }
        git
    }

    #[test]
    fn repo_status_detects_missing_repository() {
        let status = RepoStatus::from_output(
            "fatal: Not a git repository (or any of the parent directories): .git",
        );
        assert!(!status.is_repository);
    }

    #[test]
    fn repo_status_treats_other_output_as_repository() {
        assert!(RepoStatus::from_output("On branch master\n").is_repository);
        assert!(RepoStatus::from_output("fatal: something else broke").is_repository);
    }

    #[test]
    fn working_tree_status_recognizes_clean_phrase() {
        let status = WorkingTreeStatus::from_output(
            "On branch master\nnothing to commit, working directory clean\n",
        );
        assert!(!status.changes_present);

        let status = WorkingTreeStatus::from_output("Nothing To Commit, Working Tree Clean");
        assert!(!status.changes_present);
    }

    #[test]
    fn working_tree_status_reports_changes() {
        let status = WorkingTreeStatus::from_output(
            "Untracked files:\n  main.tex\nnothing added to commit but untracked files present\n",
        );
        assert!(status.changes_present);
    }

    #[test]
    fn push_target_must_be_a_plain_name() {
        for bad in ["", "--force", "master:main", "a..b", "my branch"] {
            assert!(
                matches!(check_push_target(bad, "branch"), Err(GitError::InvalidInput(_))),
                "{bad:?} was accepted"
            );
        }
        assert!(check_push_target("origin", "remote").is_ok());
        assert!(check_push_target("feature/thesis", "branch").is_ok());
    }

    #[test]
    fn command_failed_message_includes_command_and_code() {
        let err = GitError::CommandFailed {
            command: "git push origin master".to_string(),
            code: Some(128),
            output: "fatal: 'origin' does not appear to be a git repository".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("git push origin master"));
        assert!(message.contains("error code 128"));
    }

    #[test]
    fn git_cli_detects_repository_state() {
        if !git_available() {
            eprintln!("skipping git test (git not found)");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let git = GitCli::new(temp_dir.path());
        assert!(!git.repo_status().unwrap().is_repository);

        git.init().unwrap();
        assert!(git.repo_status().unwrap().is_repository);
    }

    #[test]
    fn git_cli_toplevel_from_subdirectory() {
        if !git_available() {
            eprintln!("skipping git test (git not found)");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path());
        let sub = temp_dir.path().join("chapters");
        std::fs::create_dir(&sub).unwrap();

        let top = GitCli::new(&sub).toplevel().unwrap();
        assert_eq!(
            top.canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn git_cli_commit_cycle() {
        if !git_available() {
            eprintln!("skipping git test (git not found)");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let git = init_repo(temp_dir.path());
        std::fs::write(temp_dir.path().join("main.tex"), "\\documentclass{article}").unwrap();
        assert!(git.working_tree_status().unwrap().changes_present);

        git.add_all(Path::new(".")).unwrap();
        git.commit("[sharelatex-git-integration 2024/01/02 03:04:05] first").unwrap();
        assert!(!git.working_tree_status().unwrap().changes_present);

        let repo = git2::Repository::open(temp_dir.path()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(
            head.message().unwrap().trim(),
            "[sharelatex-git-integration 2024/01/02 03:04:05] first"
        );
    }

    #[test]
    fn git_cli_commit_without_changes_fails() {
        if !git_available() {
            eprintln!("skipping git test (git not found)");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let git = init_repo(temp_dir.path());
        let result = git.commit("empty");
        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
    }

    #[test]
    fn git_cli_push_without_remote_fails() {
        if !git_available() {
            eprintln!("skipping git test (git not found)");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let git = init_repo(temp_dir.path());
        std::fs::write(temp_dir.path().join("a.tex"), "a").unwrap();
        git.add_all(Path::new(".")).unwrap();
        git.commit("first").unwrap();

        assert!(matches!(
            git.push("origin", "master"),
            Err(GitError::CommandFailed { .. })
        ));
    }
}
