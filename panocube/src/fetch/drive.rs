//! HTTP downloaders for the drive service.
//!
//! [`DriveClient`] is the primary path: the classic export endpoint, which
//! answers large files with a virus-scan warning that must be confirmed with
//! a token. [`UsercontentClient`] is the fallback: the content host that
//! accepts an unconditional confirmation and serves large files directly.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, Response};
use tracing::{debug, trace};

use super::stream::stream_to_file;
use super::{Downloader, FetchError, RemoteFile};

const DRIVE_EXPORT_URL: &str = "https://drive.google.com/uc";
const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3/files";
const USERCONTENT_URL: &str = "https://drive.usercontent.google.com/download";

/// User-Agent sent with every request.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Cookie name prefix the service uses for the large-file warning token.
const WARNING_COOKIE_PREFIX: &str = "download_warning";

/// Confirmation token in a warning page: either a `confirm=` query
/// parameter in a link or the value of a hidden `confirm` form field.
fn confirm_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:confirm=|name="confirm"\s+value=")([0-9A-Za-z_\-]+)"#).unwrap()
    })
}

/// Builds the shared HTTP client.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Http(format!("failed to create HTTP client: {}", e)))
}

/// Extracts the large-file confirmation cookie, as `(name, token)`.
pub fn warning_cookie(response: &Response) -> Option<(String, String)> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim().starts_with(WARNING_COOKIE_PREFIX))
        .map(|(name, token)| (name.trim().to_string(), token.trim().to_string()))
}

/// Extracts a confirmation token embedded in a warning page.
pub fn confirm_token_from_html(html: &str) -> Option<String> {
    confirm_token_pattern()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false)
}

fn check_status(response: &Response, url: &str) -> Result<(), FetchError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(FetchError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }
}

async fn write_body(response: Response, dest: &Path) -> Result<u64, FetchError> {
    let expected = response.content_length();
    stream_to_file(Box::pin(response.bytes_stream()), dest, expected).await
}

/// Primary downloader over the export endpoint.
#[derive(Clone)]
pub struct DriveClient {
    client: Client,
    api_key: Option<String>,
    export_url: String,
    api_url: String,
}

impl DriveClient {
    pub fn new(timeout: Duration, api_key: Option<String>) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            export_url: DRIVE_EXPORT_URL.to_string(),
            api_url: DRIVE_API_URL.to_string(),
        })
    }

    fn export_url(&self, file: &RemoteFile, confirm: Option<&str>) -> String {
        match confirm {
            Some(token) => format!(
                "{}?export=download&id={}&confirm={}",
                self.export_url, file.id, token
            ),
            None => format!("{}?export=download&id={}", self.export_url, file.id),
        }
    }

    /// Reissues the request with the confirmation token.
    async fn confirmed(
        &self,
        file: &RemoteFile,
        token: &str,
        cookie: Option<String>,
    ) -> Result<(Response, String), FetchError> {
        let url = self.export_url(file, Some(token));
        debug!(file = %file.name, "Confirming large-file download");
        let mut request = self.client.get(&url);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        Ok((request.send().await?, url))
    }
}

impl Downloader for DriveClient {
    fn name(&self) -> &'static str {
        "drive"
    }

    async fn probe_size(&self, file: &RemoteFile) -> Result<Option<u64>, FetchError> {
        let Some(key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let url = format!("{}/{}?fields=size", self.api_url, file.id);
        let response = self
            .client
            .get(&url)
            .query(&[("key", key)])
            .send()
            .await?;
        check_status(&response, &url)?;

        let body: serde_json::Value = response.json().await?;
        let size = body
            .get("size")
            .and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_u64()));
        trace!(file = %file.name, size = ?size, "Probed remote size");
        Ok(size)
    }

    async fn download(&self, file: &RemoteFile, dest: &Path) -> Result<u64, FetchError> {
        let url = self.export_url(file, None);
        let response = self.client.get(&url).send().await?;
        check_status(&response, &url)?;

        let (response, url) = if let Some((name, token)) = warning_cookie(&response) {
            let cookie = format!("{}={}", name, token);
            self.confirmed(file, &token, Some(cookie)).await?
        } else if is_html(&response) {
            let page = response.text().await?;
            match confirm_token_from_html(&page) {
                Some(token) => self.confirmed(file, &token, None).await?,
                None => return Err(FetchError::Interstitial { url }),
            }
        } else {
            (response, url)
        };

        check_status(&response, &url)?;
        if is_html(&response) {
            return Err(FetchError::Interstitial { url });
        }
        write_body(response, dest).await
    }
}

/// Fallback downloader for large or stubborn files.
#[derive(Clone)]
pub struct UsercontentClient {
    client: Client,
    base_url: String,
}

impl UsercontentClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: USERCONTENT_URL.to_string(),
        })
    }
}

impl Downloader for UsercontentClient {
    fn name(&self) -> &'static str {
        "usercontent"
    }

    async fn download(&self, file: &RemoteFile, dest: &Path) -> Result<u64, FetchError> {
        let url = format!(
            "{}?id={}&export=download&confirm=t",
            self.base_url, file.id
        );
        let response = self.client.get(&url).send().await?;
        check_status(&response, &url)?;
        if is_html(&response) {
            return Err(FetchError::Interstitial { url });
        }
        write_body(response, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_token_from_link() {
        let html = r#"<a href="/uc?export=download&amp;confirm=Ab3_x-9&amp;id=xyz">Download anyway</a>"#;
        assert_eq!(confirm_token_from_html(html).as_deref(), Some("Ab3_x-9"));
    }

    #[test]
    fn test_confirm_token_from_form() {
        let html = r#"<form><input type="hidden" name="confirm" value="t0k3n"></form>"#;
        assert_eq!(confirm_token_from_html(html).as_deref(), Some("t0k3n"));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(confirm_token_from_html("<html>quota exceeded</html>"), None);
    }

    #[test]
    fn test_confirm_pattern_is_shared() {
        let first = confirm_token_pattern() as *const Regex;
        let second = confirm_token_pattern() as *const Regex;
        assert_eq!(first, second);
        assert!(confirm_token_pattern().is_match("?confirm=abc"));
    }

    #[test]
    fn test_export_url() {
        let client = DriveClient::new(Duration::from_secs(5), None).unwrap();
        let file = RemoteFile::new("abc", "hall.jpg");
        assert_eq!(
            client.export_url(&file, None),
            "https://drive.google.com/uc?export=download&id=abc"
        );
        assert!(client
            .export_url(&file, Some("tok"))
            .ends_with("&confirm=tok"));
    }

    #[test]
    fn test_blank_api_key_disables_probe() {
        let client = DriveClient::new(Duration::from_secs(5), Some("  ".to_string())).unwrap();
        assert!(client.api_key.is_none());
    }
}
