use chrono::NaiveDate;
use serde::Serialize;

use crate::parser::{
    DistrictClubInfo, MemberClubRow, find_csv_link, parse_address_csv, parse_statistic_page,
};
use crate::scraper::{PortalFetcher, ScraperError};
use crate::statistic::Statistic;
use crate::types::AddressRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClubKind {
    /// The umbrella club the portal account belongs to.
    District { statistic_url: Option<String> },
    /// A local club listed in the district's overview table.
    Member {
        number: u32,
        statistic_url: Option<String>,
        statistic_date: String,
        paying_members: u32,
        statistic: Statistic,
    },
}

/// A club with its address roster; member clubs also carry their statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Club {
    pub name: String,
    pub club_no: Option<String>,
    pub contact_no: Option<String>,
    pub export_url: Option<String>,
    pub addresses: Vec<AddressRecord>,
    #[serde(flatten)]
    pub kind: ClubKind,
}

impl Club {
    pub fn new_district(
        name: impl Into<String>,
        club_no: Option<String>,
        contact_no: Option<String>,
        statistic_url: Option<String>,
        export_url: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            club_no,
            contact_no,
            export_url,
            addresses: Vec::new(),
            kind: ClubKind::District { statistic_url },
        }
    }

    pub fn new_member(
        number: u32,
        name: impl Into<String>,
        statistic_date: impl Into<String>,
        paying_members: u32,
        statistic_url: Option<String>,
        export_url: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            club_no: None,
            contact_no: None,
            export_url,
            addresses: Vec::new(),
            kind: ClubKind::Member {
                number,
                statistic_url,
                statistic_date: statistic_date.into(),
                paying_members,
                statistic: Statistic::new(),
            },
        }
    }

    pub(crate) fn from_district_info(info: DistrictClubInfo) -> Self {
        Club::new_district(
            info.name.unwrap_or_default(),
            info.club_no,
            info.contact_no,
            info.statistic_url,
            info.export_url,
        )
    }

    pub(crate) fn from_member_row(row: MemberClubRow) -> Self {
        Club::new_member(
            row.number,
            row.name,
            row.statistic_date,
            row.paying_members,
            row.statistic_url,
            row.export_url,
        )
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, ClubKind::Member { .. })
    }

    /// Running number in the district's member table.
    pub fn number(&self) -> Option<u32> {
        match &self.kind {
            ClubKind::Member { number, .. } => Some(*number),
            ClubKind::District { .. } => None,
        }
    }

    pub fn statistic_url(&self) -> Option<&str> {
        match &self.kind {
            ClubKind::District { statistic_url } | ClubKind::Member { statistic_url, .. } => {
                statistic_url.as_deref()
            }
        }
    }

    pub fn statistic(&self) -> Option<&Statistic> {
        match &self.kind {
            ClubKind::Member { statistic, .. } => Some(statistic),
            ClubKind::District { .. } => None,
        }
    }

    /// Paying members as reported in the district overview table.
    pub fn paying_members(&self) -> Option<u32> {
        match &self.kind {
            ClubKind::Member { paying_members, .. } => Some(*paying_members),
            ClubKind::District { .. } => None,
        }
    }

    pub fn statistic_date(&self) -> Option<NaiveDate> {
        match &self.kind {
            ClubKind::Member { statistic_date, .. } => {
                NaiveDate::parse_from_str(statistic_date.trim(), "%d.%m.%Y").ok()
            }
            ClubKind::District { .. } => None,
        }
    }

    /// Address invoices go to: the alternate invoice contact if one is
    /// listed, the treasurer otherwise.
    pub fn invoice_address(&self) -> Option<&AddressRecord> {
        self.last_with_function("WKAN")
            .or_else(|| self.last_with_function("VK"))
    }

    pub fn treasurer(&self) -> Option<&AddressRecord> {
        self.last_with_function("VK")
    }

    fn last_with_function(&self, code: &str) -> Option<&AddressRecord> {
        self.addresses.iter().rev().find(|a| a.function == code)
    }

    /// Fetches everything the club has on offer: the statistic first (member
    /// clubs only), then the address roster.
    pub async fn parse<F: PortalFetcher>(&mut self, fetcher: &F) -> Result<(), ScraperError> {
        if self.is_member() {
            self.parse_statistic(fetcher).await?;
        }
        self.parse_addresses(fetcher).await
    }

    pub async fn parse_addresses<F: PortalFetcher>(
        &mut self,
        fetcher: &F,
    ) -> Result<(), ScraperError> {
        let Some(export_url) = self.export_url.as_deref() else {
            log::debug!("{} has no address export", self.name);
            return Ok(());
        };

        log::info!("Fetching addresses of {}...", self.name);
        let html = fetcher.fetch_page(export_url).await?;
        let Some(csv_url) = find_csv_link(&html, export_url) else {
            log::warn!("No CSV link on export page of {}", self.name);
            return Ok(());
        };

        let raw = fetcher.fetch_csv(&csv_url).await?;
        self.addresses = parse_address_csv(&raw)?;
        log::debug!("{}: {} addresses", self.name, self.addresses.len());

        Ok(())
    }

    pub async fn parse_statistic<F: PortalFetcher>(
        &mut self,
        fetcher: &F,
    ) -> Result<(), ScraperError> {
        let ClubKind::Member {
            statistic_url,
            statistic,
            ..
        } = &mut self.kind
        else {
            return Ok(());
        };
        let Some(url) = statistic_url.as_deref() else {
            log::warn!("{} has no statistic link", self.name);
            return Ok(());
        };

        log::info!("Fetching statistic of {}...", self.name);
        let html = fetcher.fetch_page(url).await?;
        parse_statistic_page(&html, statistic)?;

        Ok(())
    }
}
