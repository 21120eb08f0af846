use std::sync::LazyLock;

use encoding_rs::WINDOWS_1252;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};

use crate::statistic::{Category, Gender, Statistic};
use crate::types::AddressRecord;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected page layout: expected {expected} tables, found {found}")]
    TableLayout { expected: usize, found: usize },
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Failed to parse number: '{0}'")]
    Number(String),
    #[error("Name '{0}' cannot be split into first and last name")]
    NameFormat(String),
    #[error("Malformed CSV row {row}: expected at least {expected} fields, found {found}")]
    CsvRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Number of `<table>` elements on the page shown after login.
///
/// Table 0 holds the district club block, table 4 the member club list.
pub(crate) const OVERVIEW_TABLE_COUNT: usize = 6;
const DISTRICT_TABLE: usize = 0;
const MEMBER_CLUBS_TABLE: usize = 4;

const ADDRESS_FIELDS: usize = 11;

const STATISTIC_COLUMNS: [(Category, Gender); 6] = [
    (Category::Members, Gender::Male),
    (Category::Members, Gender::Female),
    (Category::Guests, Gender::Male),
    (Category::Guests, Gender::Female),
    (Category::Workers, Gender::Male),
    (Category::Workers, Gender::Female),
];

static SEL_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("invalid selector: table"));
static SEL_TR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("invalid selector: tr"));
static SEL_TD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: td"));
static SEL_FONT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("font").expect("invalid selector: font"));
static SEL_A: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid selector: a"));
static SEL_A_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: a[href]"));

static RE_LABELLED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":\s*(\d+)\s*$").expect("invalid regex: labelled number")
});

/// District club block as found in the first overview table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DistrictClubInfo {
    pub name: Option<String>,
    pub club_no: Option<String>,
    pub contact_no: Option<String>,
    pub statistic_url: Option<String>,
    pub export_url: Option<String>,
}

/// One data row of the member club table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberClubRow {
    pub number: u32,
    pub name: String,
    pub statistic_date: String,
    pub paying_members: u32,
    pub statistic_url: Option<String>,
    pub export_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PortalOverview {
    pub district: Option<DistrictClubInfo>,
    pub member_clubs: Vec<MemberClubRow>,
}

/// Visible text below `element`, every text node trimmed before joining.
pub fn text_of(element: ElementRef) -> String {
    element
        .children()
        .map(|child| match child.value() {
            Node::Text(text) => text.trim().to_string(),
            Node::Element(_) => ElementRef::wrap(child).map(text_of).unwrap_or_default(),
            _ => String::new(),
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn absolute_url(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

fn parse_count(text: &str) -> Result<u32, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| ParseError::Number(text.to_string()))
}

/// Parses the page returned by the login form.
///
/// Every positional lookup below depends on the overview carrying exactly
/// [`OVERVIEW_TABLE_COUNT`] tables, so any other count is rejected before
/// anything is extracted.
pub(crate) fn parse_overview(html: &str, base_url: &str) -> Result<PortalOverview, ParseError> {
    let document = Html::parse_document(html);
    let tables: Vec<ElementRef> = document.select(&SEL_TABLE).collect();

    if tables.len() != OVERVIEW_TABLE_COUNT {
        return Err(ParseError::TableLayout {
            expected: OVERVIEW_TABLE_COUNT,
            found: tables.len(),
        });
    }

    let district = parse_district_block(tables[DISTRICT_TABLE], base_url);
    if district.is_none() {
        log::warn!("District club block not found in overview table");
    }

    let member_clubs = parse_member_club_rows(tables[MEMBER_CLUBS_TABLE], base_url)?;

    Ok(PortalOverview {
        district,
        member_clubs,
    })
}

fn parse_district_block(table: ElementRef, base_url: &str) -> Option<DistrictClubInfo> {
    let cell = table.select(&SEL_TD).next()?;
    let font = cell.select(&SEL_FONT).nth(1)?;

    let chunks = text_chunks(font);
    let name = chunks.get(1).cloned();
    let (club_no, contact_no) = chunks
        .get(2)
        .map(|numbers| parse_club_numbers(numbers))
        .unwrap_or((None, None));

    let links: Vec<ElementRef> = font.select(&SEL_A).collect();
    let link_at = |index: usize| {
        links
            .get(index)
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolute_url(base_url, href))
    };

    log::debug!(
        "District club block: name={:?} club_no={:?} contact_no={:?}",
        name,
        club_no,
        contact_no
    );

    Some(DistrictClubInfo {
        name,
        club_no,
        contact_no,
        statistic_url: link_at(2),
        export_url: link_at(3),
    })
}

/// Non-empty text runs among the direct children of `element`, ignoring
/// nested tables and line breaks.
fn text_chunks(element: ElementRef) -> Vec<String> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(text.trim().to_string()),
            Node::Element(e) if matches!(e.name(), "table" | "br") => None,
            Node::Element(_) => ElementRef::wrap(child).map(text_of),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect()
}

/// Reads "(Vereinsnummer: 123, Kontaktnummer: 456)".
fn parse_club_numbers(text: &str) -> (Option<String>, Option<String>) {
    let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
    let Some((club, contact)) = inner.split_once(',') else {
        return (None, None);
    };
    if contact.contains(',') {
        return (None, None);
    }

    let labelled_number = |part: &str| {
        RE_LABELLED_NUMBER
            .captures(part)
            .map(|caps| caps[1].to_string())
    };

    (labelled_number(club), labelled_number(contact))
}

fn parse_member_club_rows(
    table: ElementRef,
    base_url: &str,
) -> Result<Vec<MemberClubRow>, ParseError> {
    let mut rows = Vec::new();

    for (index, row) in table.select(&SEL_TR).enumerate().skip(1) {
        let cells: Vec<ElementRef> = row.select(&SEL_TD).collect();
        let [number, name, statistic_date, paying_members, _all_members, links] =
            cells.as_slice()
        else {
            log::warn!(
                "Could not extract club statistic from row {}: expected 6 cells, found {}",
                index + 1,
                cells.len()
            );
            continue;
        };

        let number = text_of(*number);
        if number.is_empty() {
            log::debug!("Skipping summary row {}", index + 1);
            continue;
        }

        let mut statistic_url = None;
        let mut export_url = None;
        for link in links.select(&SEL_A_HREF) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if href.contains("&trap") {
                statistic_url = Some(absolute_url(base_url, href));
            } else {
                export_url = Some(absolute_url(base_url, href));
            }
        }

        rows.push(MemberClubRow {
            number: number
                .parse()
                .map_err(|_| ParseError::Number(number.clone()))?,
            name: text_of(*name),
            statistic_date: text_of(*statistic_date),
            paying_members: parse_count(&text_of(*paying_members))?,
            statistic_url,
            export_url,
        });
    }

    Ok(rows)
}

/// Adds the counts of a club's statistics page to `statistic`.
///
/// The counts live in the second table; its first two rows are headings.
pub(crate) fn parse_statistic_page(html: &str, statistic: &mut Statistic) -> Result<(), ParseError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&SEL_TABLE)
        .nth(1)
        .ok_or_else(|| ParseError::MissingField("statistic table".to_string()))?;

    for row in table.select(&SEL_TR).skip(2) {
        let cells: Vec<ElementRef> = row.select(&SEL_TD).collect();
        let Some((label, counts)) = cells.split_first() else {
            continue;
        };
        if counts.len() != STATISTIC_COLUMNS.len() {
            log::warn!(
                "Skipping statistic row with {} cells: '{}'",
                cells.len(),
                text_of(*label)
            );
            continue;
        }

        let bracket = text_of(*label);
        for (cell, (category, gender)) in counts.iter().zip(STATISTIC_COLUMNS) {
            let amount = parse_count(&text_of(*cell))?;
            statistic.add_count(&bracket, category, gender, amount);
        }
    }

    Ok(())
}

/// Target of the first link on the export page pointing to a CSV file.
pub(crate) fn find_csv_link(html: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&SEL_A_HREF)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(".csv"))
        .map(|href| absolute_url(base_url, href))
}

/// Reads an address export.
///
/// The first line is a heading and is dropped before the Latin-1 payload is
/// decoded. Rows are `;`-separated with `"` quoting; a twelfth trailing
/// column is ignored.
pub(crate) fn parse_address_csv(raw: &[u8]) -> Result<Vec<AddressRecord>, ParseError> {
    let Some(newline) = raw.iter().position(|b| *b == b'\n') else {
        return Ok(Vec::new());
    };
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&raw[newline + 1..]);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut addresses = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() < ADDRESS_FIELDS {
            return Err(ParseError::CsvRow {
                row: index + 2,
                expected: ADDRESS_FIELDS,
                found: record.len(),
            });
        }

        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        addresses.push(AddressRecord::new(
            field(0),
            field(1),
            field(2),
            field(3),
            field(4),
            field(5),
            field(6),
            field(7),
            field(8),
            field(9),
            Some(field(10)),
        ));
    }

    Ok(addresses)
}
