//! Runtime configuration for a sync run.

use std::path::PathBuf;

/// Default hosting service.
pub const DEFAULT_HOST: &str = "https://www.sharelatex.com";

/// Environment variable overriding [`DEFAULT_HOST`].
pub const HOST_ENV: &str = "SHARELATEX_GIT_HOST";

/// Name of the file holding the last identifier used.
pub const STATE_FILE_NAME: &str = ".sharelatex-git";

/// Entries that must always be present in the exclusion file.
pub const IGNORE_ENTRIES: [&str; 3] = ["sharelatex-git.py", "sharelatex-git", STATE_FILE_NAME];

/// Settings shared by every component of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the hosting service, without a trailing slash.
    pub host: String,
    /// Product name appearing in the project page title suffix.
    pub product_name: String,
    /// File the downloaded archive is written to before extraction.
    pub archive_name: String,
    /// Folder the archive nests its content under.
    pub nested_folder: String,
    /// Sync state file name, relative to the working directory.
    pub state_file: String,
    /// Remote the commit is pushed to.
    pub remote: String,
    /// Branch the commit is pushed to.
    pub branch: String,
    /// Local archive posted by the experimental upload.
    pub upload_archive: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            product_name: "ShareLaTeX".to_string(),
            archive_name: "sharelatex.zip".to_string(),
            nested_folder: "LaTeX".to_string(),
            state_file: STATE_FILE_NAME.to_string(),
            remote: "origin".to_string(),
            branch: "master".to_string(),
            upload_archive: PathBuf::from("thesis.zip"),
        }
    }
}

impl Config {
    /// Build the default configuration, honoring `SHARELATEX_GIT_HOST`.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(HOST_ENV) {
            Ok(host) if !host.trim().is_empty() => config.with_host(host.trim()),
            _ => config,
        }
    }

    /// Builder-style host override.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    /// Project page, used for title discovery.
    pub fn project_url(&self, id: &str) -> String {
        format!("{}/project/{}", self.host, id)
    }

    /// Archive download location for a project.
    pub fn download_url(&self, id: &str) -> String {
        format!("{}/download/zip", self.project_url(id))
    }

    /// Login page of the hosting service.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.host)
    }

    /// Project listing page of the hosting service.
    pub fn projects_url(&self) -> String {
        format!("{}/project", self.host)
    }

    /// Upload endpoint for new projects.
    pub fn upload_url(&self) -> String {
        format!("{}/project/new/upload", self.host)
    }
}
