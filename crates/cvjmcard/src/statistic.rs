use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Youngest age bracket; pays neither club nor district dues.
pub const BRACKET_UP_TO_8: &str = "bis 8 Jahre";
/// Second youngest bracket; exempt from club dues but counted for the district fee.
pub const BRACKET_9_TO_13: &str = "9 - 13 Jahre";

const NON_PAYING_BRACKETS: [&str; 2] = [BRACKET_UP_TO_8, BRACKET_9_TO_13];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Members,
    Guests,
    Workers,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Members, Category::Guests, Category::Workers];

    /// Column group heading as printed in the portal's statistics table.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Members => "Mitglieder",
            Category::Guests => "Gäste (1)",
            Category::Workers => "Mitarbeiter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Sub-column heading as printed in the portal's statistics table.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "männl.",
            Gender::Female => "weibl.",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderCounts {
    pub male: u32,
    pub female: u32,
}

impl GenderCounts {
    pub fn total(&self) -> u32 {
        self.male + self.female
    }

    fn cell_mut(&mut self, gender: Gender) -> &mut u32 {
        match gender {
            Gender::Male => &mut self.male,
            Gender::Female => &mut self.female,
        }
    }
}

/// Head-counts of one age bracket, always carrying all six cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketCounts {
    pub label: String,
    pub members: GenderCounts,
    pub guests: GenderCounts,
    pub workers: GenderCounts,
}

impl BracketCounts {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn category(&self, category: Category) -> GenderCounts {
        match category {
            Category::Members => self.members,
            Category::Guests => self.guests,
            Category::Workers => self.workers,
        }
    }

    pub fn get(&self, category: Category, gender: Gender) -> u32 {
        let counts = self.category(category);
        match gender {
            Gender::Male => counts.male,
            Gender::Female => counts.female,
        }
    }

    pub fn total(&self) -> u32 {
        Category::ALL.iter().map(|c| self.category(*c).total()).sum()
    }

    fn category_mut(&mut self, category: Category) -> &mut GenderCounts {
        match category {
            Category::Members => &mut self.members,
            Category::Guests => &mut self.guests,
            Category::Workers => &mut self.workers,
        }
    }
}

/// Per-bracket member/guest/worker counts of one club.
///
/// The aggregator only counts; fee rates are applied by the caller
/// (see [`crate::fees::FeeReport`]). Brackets keep the order in which they
/// were first seen, which is the row order of the portal's table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistic {
    brackets: Vec<BracketCounts>,
}

impl Statistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_count(&mut self, bracket: &str, category: Category, gender: Gender, amount: u32) {
        let index = match self.brackets.iter().position(|b| b.label == bracket) {
            Some(index) => index,
            None => {
                self.brackets.push(BracketCounts::new(bracket));
                self.brackets.len() - 1
            }
        };
        *self.brackets[index].category_mut(category).cell_mut(gender) += amount;
    }

    pub fn bracket(&self, label: &str) -> Option<&BracketCounts> {
        self.brackets.iter().find(|b| b.label == label)
    }

    pub fn get(&self, bracket: &str, category: Category, gender: Gender) -> u32 {
        self.bracket(bracket)
            .map(|b| b.get(category, gender))
            .unwrap_or(0)
    }

    pub fn brackets(&self) -> impl Iterator<Item = &BracketCounts> {
        self.brackets.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    pub fn total_all(&self) -> u32 {
        self.brackets.iter().map(BracketCounts::total).sum()
    }

    /// Members liable for club dues: everybody older than 13.
    pub fn total_paying_members(&self) -> u32 {
        self.category_total_excluding(Category::Members, &NON_PAYING_BRACKETS)
    }

    /// Members counted for the district fee: everybody older than 8.
    pub fn total_paying_for_district_fee(&self) -> u32 {
        self.category_total_excluding(Category::Members, &[BRACKET_UP_TO_8])
    }

    pub fn total_guests(&self) -> u32 {
        self.category_total_excluding(Category::Guests, &[])
    }

    pub fn total_workers(&self) -> u32 {
        self.category_total_excluding(Category::Workers, &[])
    }

    fn category_total_excluding(&self, category: Category, excluded: &[&str]) -> u32 {
        self.brackets
            .iter()
            .filter(|b| !excluded.contains(&b.label.as_str()))
            .map(|b| b.category(category).total())
            .sum()
    }
}

const LABEL_WIDTH: usize = 20;

impl Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<LABEL_WIDTH$}", "")?;
        for category in Category::ALL {
            write!(f, " {:^17}", category.label())?;
        }
        writeln!(f)?;

        write!(f, "{:<LABEL_WIDTH$}", "")?;
        for _ in Category::ALL {
            for gender in Gender::ALL {
                write!(f, " {:>8}", gender.label())?;
            }
        }
        writeln!(f)?;

        for b in &self.brackets {
            write!(f, "{:<LABEL_WIDTH$}", b.label)?;
            for category in Category::ALL {
                for gender in Gender::ALL {
                    write!(f, " {:>8}", b.get(category, gender))?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "{:<LABEL_WIDTH$} {:>8}", "Gesamt", self.total_all())
    }
}
