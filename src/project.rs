//! Project identifiers and extraction from user input.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static PROJECT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/project/([a-z0-9]+)").expect("valid project path regex"));

/// Errors raised while turning user input into a [`ProjectId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectIdError {
    #[error("identifier cannot be empty")]
    Empty,
    #[error("invalid character in identifier: {0}")]
    InvalidCharacter(char),
    #[error("Unrecognized id supplied ({0}) [http/https]")]
    UnrecognizedUrl(String),
}

/// Opaque alphanumeric token naming a remote project.
///
/// Validation rules:
/// - Non-empty
/// - ASCII alphanumeric characters only
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProjectId {
    type Err = ProjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ProjectIdError::Empty);
        }

        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(ProjectIdError::InvalidCharacter(c));
        }

        Ok(ProjectId(s.to_string()))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the input carries an `http:` or `https:` scheme anywhere.
fn looks_like_url(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.contains("http:") || lower.contains("https:")
}

/// Extract a project identifier from a bare id or a project URL.
///
/// URLs are strict: the path must contain `/project/<id>`, otherwise the
/// input is rejected. Bare input that is not a valid identifier only
/// produces a warning and yields `None`.
pub fn extract_from_input(input: &str) -> Result<Option<ProjectId>, ProjectIdError> {
    let input = input.trim();

    if looks_like_url(input) {
        let unrecognized = || ProjectIdError::UnrecognizedUrl(input.to_string());
        let url = url::Url::parse(input).map_err(|_| unrecognized())?;
        let captures = PROJECT_PATH.captures(url.path()).ok_or_else(unrecognized)?;
        return captures[1].parse().map(Some).map_err(|_| unrecognized());
    }

    match input.parse::<ProjectId>() {
        Ok(id) => Ok(Some(id)),
        Err(e) => {
            log::warn!("Unrecognized id supplied ({}): {}", input, e);
            Ok(None)
        }
    }
}
