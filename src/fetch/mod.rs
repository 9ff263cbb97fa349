//! Download and unpack the remote project archive.

mod archive;
mod title;

use archive::{extract, flatten};
use title::discover;

use std::fs::{self, File};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::config::Config;
use crate::project::ProjectId;

/// Errors returned while fetching a project.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The archive could not be downloaded.
    #[error("Could not retrieve files from {url}. Perhaps a temporary network failure? Invalid id? ({source})")]
    Download {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    /// The downloaded payload is not a readable zip archive.
    #[error("Downloaded file is not a zip file. Have you made sure that your project is public? ({0})")]
    NotAnArchive(#[source] zip::result::ZipError),
    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Retrieves project archives from the hosting service.
pub struct ArchiveFetcher {
    agent: ureq::Agent,
    config: Config,
}

impl ArchiveFetcher {
    pub fn new(config: Config) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("sharelatex-git/", env!("CARGO_PKG_VERSION")))
                .build(),
            config,
        }
    }

    /// Download `id` into `dest`, unpack it, and look up its title.
    ///
    /// With `normalize`, content nested under the configured folder is moved
    /// up into `dest`. The title is `None` when it cannot be determined.
    pub fn fetch(&self, id: &ProjectId, dest: &Path, normalize: bool) -> Result<Option<String>, FetchError> {
        let url = self.config.download_url(id.as_str());
        let artifact = dest.join(&self.config.archive_name);

        log::info!("Downloading files from {}...", url);
        if let Err(e) = self.download(&url, &artifact) {
            let _ = fs::remove_file(&artifact);
            return Err(e);
        }

        log::info!("Decompressing files...");
        let extracted = extract(&artifact, dest);
        if let Err(e) = fs::remove_file(&artifact) {
            log::warn!("Could not remove {}: {}", artifact.display(), e);
        }
        extracted.map_err(FetchError::NotAnArchive)?;

        if normalize {
            flatten(dest, &self.config.nested_folder)?;
        }

        Ok(discover(
            &self.agent,
            &self.config.project_url(id.as_str()),
            &self.config.product_name,
        ))
    }

    fn download(&self, url: &str, artifact: &Path) -> Result<(), FetchError> {
        let response = self.agent.get(url).call().map_err(|e| FetchError::Download {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        let mut file = File::create(artifact)?;
        io::copy(&mut response.into_reader(), &mut file)?;
        Ok(())
    }
}
