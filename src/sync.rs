//! One synchronization run, start to finish.

use std::io;
use std::path::Path;
use thiserror::Error;

use crate::bootstrap::bootstrap;
use crate::commit::{CommitOutcome, commit_changes};
use crate::config::{Config, IGNORE_ENTRIES};
use crate::fetch::{ArchiveFetcher, FetchError};
use crate::git::{GitError, Vcs};
use crate::project::{ProjectId, ProjectIdError};
use crate::push::push_to_origin;
use crate::resolve::{ConflictStrategy, ResolveError, resolve};
use crate::state::SyncState;
use crate::upload::{CredentialSource, Uploader};

/// Fatal errors of a run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    ProjectId(#[from] ProjectIdError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What the caller asked for.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Identifier given for this run, if any.
    pub id: Option<ProjectId>,
    /// Free text appended to the commit message.
    pub message: Option<String>,
    /// Push the new commit to the origin remote.
    pub push: bool,
    /// Upload the local archive to the hosting service.
    pub upload: bool,
    /// Refresh files only, without touching history.
    pub no_commit: bool,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub id: ProjectId,
    pub title: Option<String>,
    /// `None` when committing was skipped.
    pub commit: Option<CommitOutcome>,
}

/// Everything a run needs from its environment.
pub struct SyncRun<'a> {
    pub config: &'a Config,
    pub workdir: &'a Path,
    pub vcs: &'a dyn Vcs,
    pub strategy: &'a mut dyn ConflictStrategy,
    pub credentials: &'a mut dyn CredentialSource,
}

impl SyncRun<'_> {
    /// Resolve the identifier, bootstrap the repository, fetch, commit,
    /// optionally push or upload, then record the identifier.
    pub fn run(self, options: SyncOptions) -> Result<SyncReport, SyncError> {
        let state = SyncState::new(self.workdir, &self.config.state_file);
        let id = resolve(options.id, state.load(), self.strategy)?;
        log::debug!("using project {}", id);

        let exclusion_file = bootstrap(self.vcs, &IGNORE_ENTRIES)?;

        let fetcher = ArchiveFetcher::new(self.config.clone());
        let title = fetcher.fetch(&id, self.workdir, true)?;

        let commit = if options.no_commit {
            log::info!("Not committing, files were only downloaded.");
            None
        } else {
            Some(commit_changes(
                self.vcs,
                &exclusion_file,
                title.as_deref(),
                options.message.as_deref(),
            )?)
        };

        if options.push {
            match commit {
                Some(CommitOutcome::Committed { .. }) => {
                    push_to_origin(self.vcs, &self.config.remote, &self.config.branch)?;
                }
                _ => log::info!("Nothing was committed, not pushing."),
            }
        }

        if options.upload {
            upload_to_hosting(self.config, self.workdir, self.credentials);
        }

        state.save(&id);
        log::info!("All done!");

        Ok(SyncReport { id, title, commit })
    }
}

/// Experimental and best-effort: failures are only logged.
fn upload_to_hosting(config: &Config, workdir: &Path, source: &mut dyn CredentialSource) {
    log::warn!("Pushing to sharelatex is an experimental feature. Use at your own risk.");

    let credentials = match source.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            log::warn!("Could not read credentials: {}", e);
            return;
        }
    };

    let uploader = Uploader::new(config.clone());
    if let Err(e) = uploader.upload(&credentials, &workdir.join(&config.upload_archive)) {
        log::warn!("Upload to sharelatex failed: {}", e);
    }
}
