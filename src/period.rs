use std::{cmp::Ordering, fmt, str::FromStr};

use time::{format_description::BorrowedFormatItem, macros::format_description, Date, Month};

use crate::error::FileError;

static TAB_NAME_FMT: &[BorrowedFormatItem] =
    format_description!("[month repr:short] [year repr:last_two]");

/// Billing month a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    year: i32,
    month: Month,
}

impl PeriodKey {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// `YYYY-MM`, e.g. `2025-01`.
    pub fn standardized(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month as u8)
    }

    /// `Mon YY`, e.g. `Jan 25`. Used as the spreadsheet tab name.
    pub fn display_name(&self) -> String {
        Date::from_calendar_date(self.year, self.month, 1)
            .ok()
            .and_then(|d| d.format(TAB_NAME_FMT).ok())
            .unwrap_or_else(|| self.standardized())
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month as u8).cmp(&(other.year, other.month as u8))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.standardized())
    }
}

/// Accepts the raw `M-YYYY` token found in export file names as well as the
/// standardized `YYYY-MM` form.
impl FromStr for PeriodKey {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FileError::InvalidPeriod(s.to_string());
        let (a, b) = s.trim().split_once('-').ok_or_else(invalid)?;
        let (month, year) = if a.len() == 4 { (b, a) } else { (a, b) };
        if year.len() != 4 {
            return Err(invalid());
        }
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Ok(Self { year, month })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_token_standardizes_and_displays() {
        let p: PeriodKey = "1-2025".parse().unwrap();
        assert_eq!(p.standardized(), "2025-01");
        assert_eq!(p.display_name(), "Jan 25");

        let p: PeriodKey = "12-2024".parse().unwrap();
        assert_eq!(p.standardized(), "2024-12");
        assert_eq!(p.display_name(), "Dec 24");
    }

    #[test]
    fn standardized_form_round_trips() {
        let p: PeriodKey = "3-2026".parse().unwrap();
        let again: PeriodKey = p.standardized().parse().unwrap();
        assert_eq!(p, again);
        assert_eq!(again.month(), Month::March);
        assert_eq!(again.year(), 2026);
    }

    #[test]
    fn rejects_bad_tokens() {
        for bad in ["13-2025", "0-2025", "Jan-2025", "2025", "1-25", ""] {
            assert!(bad.parse::<PeriodKey>().is_err(), "{bad}");
        }
    }

    #[test]
    fn orders_chronologically() {
        let dec: PeriodKey = "12-2024".parse().unwrap();
        let jan: PeriodKey = "1-2025".parse().unwrap();
        assert!(dec < jan);
    }
}
