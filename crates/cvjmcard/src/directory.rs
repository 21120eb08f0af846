use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::club::Club;
use crate::types::AddressRecord;

const CHAIRPERSONS: &[&str] = &["VV", "V2"];
const BOARD: &[&str] = &["VV", "V2", "VS", "VK"];
const DISTRICT_REPRESENTATIVES: &[&str] = &["VV", "KT"];
const YOUTH_LEADERS: &[&str] = &["MJ", "GJ", "JJ", "IN", "JF"];

#[derive(Debug, thiserror::Error)]
#[error(
    "Invalid contact list '{0}'. Accepted values: 'district', 'all', 'chairpersons', 'board', 'representatives', 'youth-leaders'"
)]
pub struct ContactListParseError(String);

/// The contact lists a district report is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactList {
    District,
    All,
    Chairpersons,
    Board,
    Representatives,
    YouthLeaders,
}

impl ContactList {
    /// Sections of the full district report, in print order. The district
    /// list is only available on its own.
    pub const REPORT: [ContactList; 5] = [
        ContactList::Board,
        ContactList::Representatives,
        ContactList::YouthLeaders,
        ContactList::Chairpersons,
        ContactList::All,
    ];
}

impl FromStr for ContactList {
    type Err = ContactListParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "district" => Ok(ContactList::District),
            "all" => Ok(ContactList::All),
            "chairpersons" => Ok(ContactList::Chairpersons),
            "board" => Ok(ContactList::Board),
            "representatives" => Ok(ContactList::Representatives),
            "youth-leaders" => Ok(ContactList::YouthLeaders),
            _ => Err(ContactListParseError(s.to_string())),
        }
    }
}

impl Display for ContactList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactList::District => write!(f, "Kreisverband"),
            ContactList::All => write!(f, "Alle"),
            ContactList::Chairpersons => write!(f, "OV Vorsitzende"),
            ContactList::Board => write!(f, "Vorstände"),
            ContactList::Representatives => write!(f, "Kreisvertreter"),
            ContactList::YouthLeaders => write!(f, "Jungscharleiter"),
        }
    }
}

/// Read-only role lookups over a parsed district.
///
/// Lists walk the district club first, then the member clubs in table
/// order, each in roster order. De-duplicated lists keep the first address
/// seen for a name.
#[derive(Debug, Clone, Copy)]
pub struct Directory<'a> {
    district: Option<&'a Club>,
    members: &'a [Club],
}

impl<'a> Directory<'a> {
    pub fn new(district: Option<&'a Club>, members: &'a [Club]) -> Self {
        Self { district, members }
    }

    pub fn list(&self, list: ContactList) -> Vec<&'a AddressRecord> {
        match list {
            ContactList::District => self.district_members(),
            ContactList::All => self.all_members(),
            ContactList::Chairpersons => self.all_chairpersons(),
            ContactList::Board => self.board_members(),
            ContactList::Representatives => self.district_representatives(),
            ContactList::YouthLeaders => self.youth_leaders(),
        }
    }

    pub fn district_members(&self) -> Vec<&'a AddressRecord> {
        self.district
            .into_iter()
            .flat_map(|club| club.addresses.iter())
            .filter(|a| a.function != "KG")
            .collect()
    }

    pub fn all_members(&self) -> Vec<&'a AddressRecord> {
        unique_by_name(self.addresses().filter(|a| a.function != "VA"))
    }

    pub fn all_chairpersons(&self) -> Vec<&'a AddressRecord> {
        unique_by_name(self.with_functions(CHAIRPERSONS))
    }

    pub fn board_members(&self) -> Vec<&'a AddressRecord> {
        self.with_functions(BOARD).collect()
    }

    pub fn district_representatives(&self) -> Vec<&'a AddressRecord> {
        unique_by_name(self.with_functions(DISTRICT_REPRESENTATIVES))
    }

    pub fn youth_leaders(&self) -> Vec<&'a AddressRecord> {
        self.with_functions(YOUTH_LEADERS).collect()
    }

    fn addresses(&self) -> impl Iterator<Item = &'a AddressRecord> {
        self.district
            .into_iter()
            .chain(self.members.iter())
            .flat_map(|club| club.addresses.iter())
    }

    fn with_functions(
        &self,
        codes: &'static [&'static str],
    ) -> impl Iterator<Item = &'a AddressRecord> {
        self.addresses().filter(move |a| a.has_function(codes))
    }
}

fn unique_by_name<'a>(
    addresses: impl Iterator<Item = &'a AddressRecord>,
) -> Vec<&'a AddressRecord> {
    let mut seen = HashSet::new();
    addresses
        .filter(|a| seen.insert(a.name.as_str()))
        .collect()
}
