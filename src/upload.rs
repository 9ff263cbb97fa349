//! Experimental upload of a local archive to the hosting service.
//!
//! Logs in with a session cookie, scrapes the anti-forgery token from the
//! login page, refreshes it from the project listing once authenticated,
//! and posts the archive as a multipart form.

use regex::Regex;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::Config;

static CSRF_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"window\.csrfToken = "(.+?)""#).expect("valid csrf regex"));

/// Upload session identifier expected by the upload endpoint.
const UPLOAD_UUID: &str = "b6331504-dd0b-4b59-b067-d5205501e93d";

const BOUNDARY: &str = "----sharelatex-git-7MA4YWxkTrZu0gW";

/// Errors returned by the upload flow.
#[derive(Error, Debug)]
pub enum UploadError {
    /// An HTTP request failed.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    /// A page did not carry the anti-forgery token.
    #[error("no csrf token found on {0}")]
    MissingToken(String),
    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Login details for the hosting service.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies login details when an upload is requested.
pub trait CredentialSource {
    fn credentials(&mut self) -> io::Result<Credentials>;
}

/// Reads credentials from the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalCredentials;

impl CredentialSource for TerminalCredentials {
    fn credentials(&mut self) -> io::Result<Credentials> {
        prompt_credentials()
    }
}

/// Ask for the email on stdin and the password without echo.
pub fn prompt_credentials() -> io::Result<Credentials> {
    print!("sharelatex email: ");
    io::stdout().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    let password = rpassword::prompt_password("sharelatex password: ")?;
    Ok(Credentials {
        email: email.trim().to_string(),
        password,
    })
}

/// Anti-forgery token embedded in a page's script.
pub fn csrf_token(html: &str) -> Option<String> {
    CSRF_TOKEN
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Encode text fields and one file part as `multipart/form-data`.
fn multipart_body(fields: &[(&str, String)], file_field: &str, file_name: &str, file: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.len() + 512);
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/zip\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Session-based client for the upload endpoint.
pub struct Uploader {
    agent: ureq::Agent,
    config: Config,
}

impl Uploader {
    pub fn new(config: Config) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("sharelatex-git/", env!("CARGO_PKG_VERSION")))
                .build(),
            config,
        }
    }

    fn http_error(url: &str, e: ureq::Error) -> UploadError {
        UploadError::Http {
            url: url.to_string(),
            source: Box::new(e),
        }
    }

    /// GET `url` and return its token.
    fn fetch_token(&self, url: &str) -> Result<String, UploadError> {
        let response = self.agent.get(url).call().map_err(|e| Self::http_error(url, e))?;
        log::info!("GET {}: {} {}", url, response.status(), response.status_text());
        let mut page = String::new();
        response.into_reader().read_to_string(&mut page)?;
        csrf_token(&page).ok_or_else(|| UploadError::MissingToken(url.to_string()))
    }

    /// Log in and post `archive` to the upload endpoint.
    pub fn upload(&self, credentials: &Credentials, archive: &Path) -> Result<(), UploadError> {
        let login_url = self.config.login_url();
        let token = self.fetch_token(&login_url)?;

        let response = self
            .agent
            .post(&login_url)
            .send_form(&[
                ("_csrf", token.as_str()),
                ("email", credentials.email.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .map_err(|e| Self::http_error(&login_url, e))?;
        log::info!("POST {}: {} {}", login_url, response.status(), response.status_text());

        let token = self.fetch_token(&self.config.projects_url())?;

        let file = std::fs::read(archive)?;
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project.zip".to_string());
        let body = multipart_body(
            &[
                ("_csrf", token),
                ("qquuid", UPLOAD_UUID.to_string()),
                ("qqtotalfilesize", file.len().to_string()),
            ],
            "qqfile",
            &file_name,
            &file,
        );

        let upload_url = self.config.upload_url();
        let response = self
            .agent
            .post(&upload_url)
            .set("Content-Type", &format!("multipart/form-data; boundary={BOUNDARY}"))
            .send_bytes(&body)
            .map_err(|e| Self::http_error(&upload_url, e))?;
        log::info!("POST {}: {} {}", upload_url, response.status(), response.status_text());
        let mut reply = String::new();
        response.into_reader().read_to_string(&mut reply)?;
        log::info!("{}", reply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::StubServer;
    use tempfile::TempDir;

    fn token_page(token: &str) -> Vec<u8> {
        format!("<script>window.csrfToken = \"{token}\";</script>").into_bytes()
    }

    #[test]
    fn csrf_token_is_extracted() {
        let html = String::from_utf8(token_page("abc-123")).unwrap();
        assert_eq!(csrf_token(&html), Some("abc-123".to_string()));
        assert_eq!(csrf_token("<html></html>"), None);
    }

    #[test]
    fn multipart_body_contains_fields_and_file() {
        let body = multipart_body(&[("_csrf", "tok".to_string())], "qqfile", "a.zip", b"PK\x03\x04");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("name=\"_csrf\"\r\n\r\ntok\r\n"));
        assert!(text.contains("name=\"qqfile\"; filename=\"a.zip\""));
        assert!(text.ends_with(&format!("--{BOUNDARY}--\r\n")));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials {
            email: "me@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }

    #[test]
    fn upload_logs_in_and_posts_archive_with_fresh_token() {
        let server = StubServer::start(vec![
            ("GET", "/login".to_string(), 200, token_page("login-token")),
            ("POST", "/login".to_string(), 200, b"ok".to_vec()),
            ("GET", "/project".to_string(), 200, token_page("fresh-token")),
            ("POST", "/project/new/upload".to_string(), 200, b"{\"success\":true}".to_vec()),
        ]);
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("thesis.zip");
        std::fs::write(&archive, b"zip-bytes").unwrap();

        let uploader = Uploader::new(Config::default().with_host(&server.url));
        let credentials = Credentials {
            email: "me@example.com".to_string(),
            password: "secret".to_string(),
        };
        uploader.upload(&credentials, &archive).unwrap();

        let requests = server.requests.lock().unwrap();
        let login = String::from_utf8_lossy(&requests[1].body).into_owned();
        assert!(login.contains("_csrf=login-token"));
        assert!(login.contains("email=me%40example.com"));

        let upload = String::from_utf8_lossy(&requests[3].body).into_owned();
        assert_eq!(requests[3].path, "/project/new/upload");
        assert!(upload.contains("fresh-token"));
        assert!(upload.contains(UPLOAD_UUID));
        assert!(upload.contains("zip-bytes"));
    }

    #[test]
    fn missing_token_is_reported() {
        let server = StubServer::get(vec![("/login".to_string(), 200, b"<html></html>".to_vec())]);
        let uploader = Uploader::new(Config::default().with_host(&server.url));
        let credentials = Credentials {
            email: "a".to_string(),
            password: "b".to_string(),
        };

        let result = uploader.upload(&credentials, Path::new("missing.zip"));
        assert!(matches!(result, Err(UploadError::MissingToken(_))));
    }
}
