use crate::club::Club;
use crate::directory::Directory;
use crate::parser::parse_overview;
use crate::scraper::{Credentials, PortalFetcher, ScraperError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// Logged in, overview page received but clubs not (fully) parsed yet.
    Authenticated,
    Parsed,
}

/// One report run against the portal: login, district club, member clubs.
#[derive(Debug)]
pub struct PortalSession<F> {
    fetcher: F,
    login_url: String,
    credentials: Credentials,
    state: SessionState,
    district_club: Option<Club>,
    member_clubs: Vec<Club>,
}

impl<F: PortalFetcher> PortalSession<F> {
    pub fn new(fetcher: F, login_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            fetcher,
            login_url: login_url.into(),
            credentials,
            state: SessionState::Unauthenticated,
            district_club: None,
            member_clubs: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn district_club(&self) -> Option<&Club> {
        self.district_club.as_ref()
    }

    pub fn member_clubs(&self) -> &[Club] {
        &self.member_clubs
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn directory(&self) -> Directory<'_> {
        Directory::new(self.district_club.as_ref(), &self.member_clubs)
    }

    /// Logs in and parses the district club and every member club.
    ///
    /// Clubs are fetched one after another, each completely (statistic, then
    /// addresses) before the next. The first failing request aborts the run.
    pub async fn parse(&mut self) -> Result<(), ScraperError> {
        if self.state == SessionState::Parsed {
            return Err(ScraperError::AlreadyParsed);
        }
        self.district_club = None;
        self.member_clubs.clear();

        let html = self
            .fetcher
            .login(&self.login_url, &self.credentials)
            .await?;
        self.state = SessionState::Authenticated;

        let overview = parse_overview(&html, &self.login_url)
            .inspect_err(|e| log::error!("Could not identify overview tables: {e}"))?;

        if let Some(info) = overview.district {
            let mut club = Club::from_district_info(info);
            club.parse(&self.fetcher).await?;
            self.district_club = Some(club);
        }

        log::info!("Found {} member clubs", overview.member_clubs.len());
        for row in overview.member_clubs {
            let mut club = Club::from_member_row(row);
            club.parse(&self.fetcher).await?;
            self.member_clubs.push(club);
        }

        self.state = SessionState::Parsed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseError;
    use crate::testing::{FakePortal, address_csv};
    use std::fs;

    const LOGIN: &str = crate::LOGIN_URL;

    fn url(query: &str) -> String {
        format!("{}?{}", LOGIN, query)
    }

    fn csv_url(id: &str) -> String {
        format!("https://cvjm-card.de/cvjm-card/tmp/adressen_{}.csv", id)
    }

    fn export_page(id: &str) -> String {
        format!(
            "<html><body><a href=\"javascript:window.close()\">x</a>\
             <a href=\"/cvjm-card/tmp/adressen_{}.csv\">csv</a></body></html>",
            id
        )
    }

    fn portal() -> FakePortal {
        let statistic = fs::read_to_string("fixtures/statistic.html").unwrap();
        FakePortal::with_login_page(fs::read_to_string("fixtures/overview.html").unwrap())
            .page(&url("m=401&v=4711"), export_page("4711"))
            .csv(
                &csv_url("4711"),
                address_csv(&[
                    ("Kreisverband", "KG", "Buero Kreis", ""),
                    ("Kreisverband", "VV", "Klaus Kreis", "klaus@example.org"),
                ]),
            )
            .page(&url("m=301&v=1001&trap=1"), statistic.clone())
            .page(&url("m=401&v=1001"), export_page("1001"))
            .csv(
                &csv_url("1001"),
                address_csv(&[("CVJM Lahnstein", "VV", "Max Muster", "max@example.org")]),
            )
            .page(&url("m=301&v=1002&trap=1"), statistic)
            .page(&url("m=401&v=1002"), export_page("1002"))
            .csv(
                &csv_url("1002"),
                address_csv(&[("CVJM Nassau", "V2", "Max Muster", "max@example.org")]),
            )
    }

    fn credentials() -> Credentials {
        Credentials::new("kv-rhein-lahn", "geheim")
    }

    #[tokio::test]
    async fn test_parse_full_session() {
        let mut session = PortalSession::new(portal(), LOGIN, credentials());
        assert_eq!(session.state(), SessionState::Unauthenticated);

        session.parse().await.expect("session should parse");
        assert_eq!(session.state(), SessionState::Parsed);

        let district = session.district_club().expect("district club");
        assert_eq!(district.name, "CVJM-Kreisverband Rhein-Lahn");
        assert_eq!(district.club_no.as_deref(), Some("4711"));
        assert_eq!(district.contact_no.as_deref(), Some("815"));
        assert_eq!(district.addresses.len(), 2);

        let members = session.member_clubs();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "CVJM Lahnstein");
        assert_eq!(members[1].name, "CVJM Nassau");
        assert_eq!(members[1].statistic().unwrap().total_all(), 62);

        assert_eq!(
            session.fetcher().requests(),
            vec![
                format!("LOGIN {} kv-rhein-lahn", LOGIN),
                format!("PAGE {}", url("m=401&v=4711")),
                format!("CSV {}", csv_url("4711")),
                format!("PAGE {}", url("m=301&v=1001&trap=1")),
                format!("PAGE {}", url("m=401&v=1001")),
                format!("CSV {}", csv_url("1001")),
                format!("PAGE {}", url("m=301&v=1002&trap=1")),
                format!("PAGE {}", url("m=401&v=1002")),
                format!("CSV {}", csv_url("1002")),
            ]
        );
    }

    #[tokio::test]
    async fn test_wrong_table_count_aborts_before_club_parsing() {
        for count in [5, 7] {
            let login_page = format!(
                "<html><body>{}</body></html>",
                "<table><tr><td>x</td></tr></table>".repeat(count)
            );
            let mut session =
                PortalSession::new(FakePortal::with_login_page(login_page), LOGIN, credentials());

            let err = session.parse().await.unwrap_err();
            assert!(matches!(
                err,
                ScraperError::ParseError(ParseError::TableLayout { found, .. }) if found == count
            ));
            assert_eq!(session.fetcher().requests().len(), 1);
            assert!(session.district_club().is_none());
            assert!(session.member_clubs().is_empty());
            assert_ne!(session.state(), SessionState::Parsed);
        }
    }

    #[tokio::test]
    async fn test_missing_district_block_still_parses_member_clubs() {
        let overview = fs::read_to_string("fixtures/overview.html").unwrap();
        let welcome = "<font face=\"Arial\" size=\"4\"><b>Willkommen</b></font>";
        assert!(overview.contains(welcome));
        let fake = FakePortal {
            login_page: overview.replacen(welcome, "", 1),
            ..portal()
        };
        let mut session = PortalSession::new(fake, LOGIN, credentials());

        session.parse().await.expect("session should parse without district");

        assert_eq!(session.state(), SessionState::Parsed);
        assert!(session.district_club().is_none());
        assert_eq!(session.member_clubs().len(), 2);
        assert!(
            session
                .fetcher()
                .requests()
                .iter()
                .all(|request| !request.contains("v=4711") && !request.contains("_4711"))
        );
        assert!(session.directory().district_members().is_empty());
    }

    #[tokio::test]
    async fn test_parse_twice_is_rejected() {
        let mut session = PortalSession::new(portal(), LOGIN, credentials());
        session.parse().await.expect("first parse");
        assert!(matches!(
            session.parse().await,
            Err(ScraperError::AlreadyParsed)
        ));
    }

    #[tokio::test]
    async fn test_member_csv_failure_aborts_run() {
        let mut fake = portal();
        fake.csv_files.remove(&csv_url("1002"));
        let mut session = PortalSession::new(fake, LOGIN, credentials());

        let err = session.parse().await.unwrap_err();
        assert!(matches!(err, ScraperError::CsvDownload { status: 404, .. }));
        assert_eq!(session.state(), SessionState::Authenticated);
    }
}
