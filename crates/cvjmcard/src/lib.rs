pub mod club;
pub mod directory;
pub mod fees;
mod parser;
pub mod scraper;
pub mod session;
pub mod statistic;
pub mod types;

#[cfg(test)]
mod testing;

pub use club::{Club, ClubKind};
pub use parser::{ParseError, text_of};
pub use scraper::{Credentials, PortalFetcher, ScraperError, WebScraper};
pub use session::PortalSession;

/// Login endpoint of the cvjm-card.de club portal.
pub const LOGIN_URL: &str = "https://cvjm-card.de/cvjm-card/cgi/verein/verein.pl";
