use crate::parser::ParseError;

use reqwest::Client;
use reqwest::multipart::Form;
use std::fmt;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Could not download CSV file from {url} (status {status})")]
    CsvDownload { url: String, status: u16 },
    #[error("Portal session has already been parsed")]
    AlreadyParsed,
}

/// Login data for the club portal.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Transport used by the portal session and the clubs.
///
/// Implementations keep whatever session state (cookies) the portal hands
/// out on login.
#[allow(async_fn_in_trait)]
pub trait PortalFetcher {
    /// Submits the login form and returns the resulting page.
    async fn login(&self, url: &str, credentials: &Credentials) -> Result<String, ScraperError>;

    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError>;

    /// Downloads a CSV export as raw bytes; a non-success status is
    /// [`ScraperError::CsvDownload`].
    async fn fetch_csv(&self, url: &str) -> Result<Vec<u8>, ScraperError>;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

impl PortalFetcher for WebScraper {
    async fn login(&self, url: &str, credentials: &Credentials) -> Result<String, ScraperError> {
        log::info!("Logging in to {} as {}...", url, credentials.user);

        let form = Form::new()
            .text("m", "101")
            .text("n", credentials.user.clone())
            .text("p", credentials.password.clone())
            .text("d", "vereinsdb");

        Ok(self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        log::debug!("Fetching page {}", url);
        Ok(self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }

    async fn fetch_csv(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        log::debug!("Downloading CSV {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::CsvDownload {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
