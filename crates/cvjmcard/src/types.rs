use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::parser::ParseError;

/// One row of a club's exported address roster.
///
/// `function` is the raw role code from the export ("VV", "VK", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub club: String,
    pub address_no: String,
    pub function: String,
    pub description: String,
    pub name: String,
    pub additional_address: String,
    pub street: String,
    pub post_code_city: String,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub phone: String,
    pub fax: String,
    pub mail: Option<String>,
}

impl AddressRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        club: String,
        address_no: String,
        function: String,
        description: String,
        name: String,
        additional_address: String,
        street: String,
        post_code_city: String,
        phone: String,
        fax: String,
        mail: Option<String>,
    ) -> Self {
        let (zip_code, city) = split_zip_city(&post_code_city).unzip();
        Self {
            club,
            address_no,
            function,
            description,
            name,
            additional_address,
            street,
            post_code_city,
            zip_code,
            city,
            phone,
            fax,
            mail: mail.filter(|m| !m.trim().is_empty()),
        }
    }

    pub fn has_function(&self, codes: &[&str]) -> bool {
        codes.contains(&self.function.as_str())
    }

    /// Splits the name at its last space into first name(s) and last name.
    pub fn name_parts(&self) -> Result<(&str, &str), ParseError> {
        self.name
            .trim()
            .rsplit_once(' ')
            .ok_or_else(|| ParseError::NameFormat(self.name.clone()))
    }

    pub fn first_name(&self) -> Result<&str, ParseError> {
        Ok(self.name_parts()?.0)
    }

    pub fn last_name(&self) -> Result<&str, ParseError> {
        Ok(self.name_parts()?.1)
    }

    /// "Last, First" form used for sorted contact lists.
    pub fn formatted_name(&self) -> Result<String, ParseError> {
        let (first, last) = self.name_parts()?;
        Ok(format!("{}, {}", last, first))
    }
}

impl Display for AddressRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.mail {
            Some(mail) => write!(
                f,
                "\"{} ({} von {})\" <{}>",
                self.name, self.function, self.club, mail
            ),
            None => write!(f, "{} does not have E-Mail!", self.name),
        }
    }
}

fn split_zip_city(post_code_city: &str) -> Option<(String, String)> {
    let (zip, city) = post_code_city.trim_start().split_once(' ')?;
    if zip.is_empty() || !zip.chars().all(|c| c.is_ascii_digit()) || city.is_empty() {
        return None;
    }
    Some((zip.to_string(), city.to_string()))
}
