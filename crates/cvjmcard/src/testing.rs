use std::collections::HashMap;
use std::sync::Mutex;

use crate::scraper::{Credentials, PortalFetcher, ScraperError};

/// In-memory portal: pages and CSV files keyed by URL, every request recorded.
#[derive(Debug, Default)]
pub(crate) struct FakePortal {
    pub login_page: String,
    pub pages: HashMap<String, String>,
    pub csv_files: HashMap<String, Vec<u8>>,
    pub requests: Mutex<Vec<String>>,
}

impl FakePortal {
    pub fn with_login_page(login_page: impl Into<String>) -> Self {
        Self {
            login_page: login_page.into(),
            ..Default::default()
        }
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn csv(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.csv_files.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    fn record(&self, request: String) {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request);
    }
}

impl PortalFetcher for FakePortal {
    async fn login(&self, url: &str, credentials: &Credentials) -> Result<String, ScraperError> {
        self.record(format!("LOGIN {} {}", url, credentials.user));
        Ok(self.login_page.clone())
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        self.record(format!("PAGE {}", url));
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }

    async fn fetch_csv(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        self.record(format!("CSV {}", url));
        self.csv_files
            .get(url)
            .cloned()
            .ok_or_else(|| ScraperError::CsvDownload {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Semicolon CSV export with a heading line, one row per
/// `(club, function, name, mail)`.
pub(crate) fn address_csv(rows: &[(&str, &str, &str, &str)]) -> Vec<u8> {
    let mut out = String::from("\"Verein\";\"Nr\";\"Funktion\";\"Bezeichnung\";\"Name\";\"Zusatz\";\"Strasse\";\"PLZ Ort\";\"Telefon\";\"Fax\";\"E-Mail\";\"\"\n");
    for (i, (club, function, name, mail)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "\"{}\";\"{}\";\"{}\";\"\";\"{}\";\"\";\"Hauptstr. {}\";\"56112 Lahnstein\";\"\";\"\";\"{}\";\"\"\n",
            club,
            i + 1,
            function,
            name,
            i + 1,
            mail
        ));
    }
    out.into_bytes()
}
