use std::fmt::Display;

use serde::Serialize;

use crate::club::Club;

/// Default district fee per counted member, in Euro.
pub const DEFAULT_RATE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeLine {
    pub club: String,
    pub members: u32,
    pub amount: f64,
}

/// District fee owed by each member club, based on the members older than
/// eight years in the club's statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeReport {
    pub rate: f64,
    pub lines: Vec<FeeLine>,
    pub total: f64,
}

impl FeeReport {
    pub fn new(clubs: &[Club], rate: f64) -> Self {
        let lines: Vec<FeeLine> = clubs
            .iter()
            .filter_map(|club| {
                let members = club.statistic()?.total_paying_for_district_fee();
                Some(FeeLine {
                    club: club.name.clone(),
                    members,
                    amount: f64::from(members) * rate,
                })
            })
            .collect();
        let total = lines.iter().map(|l| l.amount).sum();

        Self { rate, lines, total }
    }

    pub fn total_members(&self) -> u32 {
        self.lines.iter().map(|l| l.members).sum()
    }
}

impl Display for FeeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(
                f,
                "{} has {} so needs to pay {:.2} Euro",
                line.club, line.members, line.amount
            )?;
        }
        write!(f, "In total the district gets {:.2} Euro.", self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistic::{BRACKET_9_TO_13, BRACKET_UP_TO_8, Category, Gender};

    fn member(name: &str, counts: &[(&str, u32)]) -> Club {
        let mut club = Club::new_member(1, name, "01.01.2024", 0, None, None);
        if let crate::ClubKind::Member { statistic, .. } = &mut club.kind {
            for (bracket, amount) in counts {
                statistic.add_count(bracket, Category::Members, Gender::Female, *amount);
                statistic.add_count(bracket, Category::Guests, Gender::Male, 100);
            }
        }
        club
    }

    #[test]
    fn test_fee_report_counts_members_older_than_eight() {
        let clubs = vec![
            member(
                "CVJM Lahnstein",
                &[(BRACKET_UP_TO_8, 5), (BRACKET_9_TO_13, 3), ("27 - 60 Jahre", 7)],
            ),
            member("CVJM Nassau", &[("über 60 Jahre", 2)]),
        ];
        let report = FeeReport::new(&clubs, 2.5);

        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.lines[0].members, 10);
        assert_eq!(report.lines[0].amount, 25.0);
        assert_eq!(report.lines[1].members, 2);
        assert_eq!(report.total, 30.0);
        assert_eq!(report.total_members(), 12);
    }

    #[test]
    fn test_fee_report_skips_district_club() {
        let clubs = vec![Club::new_district("Kreisverband", None, None, None, None)];
        let report = FeeReport::new(&clubs, DEFAULT_RATE);
        assert!(report.lines.is_empty());
        assert_eq!(report.total, 0.0);
    }

    #[test]
    fn test_fee_report_display() {
        let clubs = vec![member("CVJM Nassau", &[("über 60 Jahre", 2)])];
        let report = FeeReport::new(&clubs, DEFAULT_RATE);
        assert_eq!(
            report.to_string(),
            "CVJM Nassau has 2 so needs to pay 2.00 Euro\nIn total the district gets 2.00 Euro."
        );
    }
}
