//! Forward the new commit to the origin remote.

use crate::git::{GitError, Vcs};

/// Push `branch` to `remote`.
///
/// The push may block waiting for credentials; an interrupt while it runs
/// ends the process quietly instead of as a crash.
pub fn push_to_origin(vcs: &dyn Vcs, remote: &str, branch: &str) -> Result<(), GitError> {
    log::warn!(
        "Pushing is an experimental feature. If you experience lockdowns, hit CTRL+C. \
         It means you probably have not configured password caching and/or passwordless pushes."
    );

    if let Err(e) = ctrlc::set_handler(|| {
        log::warn!("Push interrupted.");
        std::process::exit(130);
    }) {
        log::debug!("could not install interrupt handler: {}", e);
    }

    log::info!("Pushing to {} {}...", remote, branch);
    vcs.push(remote, branch)
}
