use std::{fmt, str::FromStr};

use crate::{error::FileError, period::PeriodKey};

const CSV_EXTENSION: &str = ".csv";
const REPORT_SUFFIX: &str = "Report";

/// Prefix rewrites applied to the raw specifier, most specific first.
const SPECIFIER_RULES: &[(&str, CanonicalSpecifier)] = &[
    ("Shorts Ads Revenue", CanonicalSpecifier::ShortsAdsRevenue),
    ("Ads Adjustment", CanonicalSpecifier::AdsAdjustment),
    (
        "Shorts Subscription Revenue",
        CanonicalSpecifier::ShortsSubscriptionRevenue,
    ),
    (
        "Premium Non Music Asset",
        CanonicalSpecifier::NonMusicVideoSummaryPremium,
    ),
];

/// Exports that carry a metadata line above the real header row.
const FORCE_SKIP_PREFIXES: &[&str] = &[
    "Paid Features Report",
    "Shorts Subscription Revenue Video Summary",
    "Premium Non Music Asset Video Summary",
];

/// Report types we know how to consolidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalSpecifier {
    PaidFeatures,
    ShortsAdsRevenue,
    AdsRevenueVideoSummary,
    AdsAdjustment,
    SubscriptionRevenueVideo,
    SubscriptionRevenue,
    NonMusicVideoSummaryPremium,
    ShortsSubscriptionRevenue,
}

impl CanonicalSpecifier {
    pub const ALL: [CanonicalSpecifier; 8] = [
        CanonicalSpecifier::PaidFeatures,
        CanonicalSpecifier::ShortsAdsRevenue,
        CanonicalSpecifier::AdsRevenueVideoSummary,
        CanonicalSpecifier::AdsAdjustment,
        CanonicalSpecifier::SubscriptionRevenueVideo,
        CanonicalSpecifier::SubscriptionRevenue,
        CanonicalSpecifier::NonMusicVideoSummaryPremium,
        CanonicalSpecifier::ShortsSubscriptionRevenue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalSpecifier::PaidFeatures => "Paid Features",
            CanonicalSpecifier::ShortsAdsRevenue => "Shorts Ads Revenue",
            CanonicalSpecifier::AdsRevenueVideoSummary => "Ads Revenue Video Summary",
            CanonicalSpecifier::AdsAdjustment => "Ads Adjustment",
            CanonicalSpecifier::SubscriptionRevenueVideo => "Subscription Revenue Video",
            CanonicalSpecifier::SubscriptionRevenue => "Subscription Revenue",
            CanonicalSpecifier::NonMusicVideoSummaryPremium => "Non Music Video Summary Premium",
            CanonicalSpecifier::ShortsSubscriptionRevenue => "Shorts Subscription Revenue",
        }
    }

    /// Name of the column holding the amount to sum for this report type.
    pub fn revenue_column(&self) -> &'static str {
        match self {
            CanonicalSpecifier::PaidFeatures => "Earnings (USD)",
            CanonicalSpecifier::ShortsAdsRevenue => "Net Partner Revenue (Post revshare)",
            CanonicalSpecifier::AdsRevenueVideoSummary
            | CanonicalSpecifier::AdsAdjustment
            | CanonicalSpecifier::SubscriptionRevenueVideo
            | CanonicalSpecifier::SubscriptionRevenue
            | CanonicalSpecifier::NonMusicVideoSummaryPremium
            | CanonicalSpecifier::ShortsSubscriptionRevenue => "Partner Revenue",
        }
    }
}

impl fmt::Display for CanonicalSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalSpecifier {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| FileError::UnrecognizedSpecifier(s.to_string()))
    }
}

/// Period token and raw specifier split out of an export file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub period_token: String,
    pub raw_specifier: String,
}

/// `"Paid Features Report 1-2025.csv"` gives period `1-2025` and specifier
/// `Paid Features Report`.
pub fn parse_filename(file_name: &str) -> Result<ParsedFilename, FileError> {
    let stem = strip_extension(file_name);
    let mut parts: Vec<&str> = stem.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(FileError::UnparseableFilename(file_name.to_string()));
    }
    let period_token = parts.pop().unwrap_or_default().to_string();
    Ok(ParsedFilename {
        period_token,
        raw_specifier: parts.join(" "),
    })
}

fn strip_extension(file_name: &str) -> &str {
    let n = file_name.len();
    if n >= CSV_EXTENSION.len()
        && file_name.is_char_boundary(n - CSV_EXTENSION.len())
        && file_name[n - CSV_EXTENSION.len()..].eq_ignore_ascii_case(CSV_EXTENSION)
    {
        &file_name[..n - CSV_EXTENSION.len()]
    } else {
        file_name
    }
}

/// Rewrites a raw specifier to its canonical spelling. Unknown specifiers come
/// back with a trailing "Report" word removed and nothing else changed.
pub fn normalize_specifier(raw: &str) -> String {
    if let Some((_, canonical)) = SPECIFIER_RULES
        .iter()
        .find(|(prefix, _)| raw.starts_with(prefix))
    {
        return canonical.as_str().to_string();
    }
    match raw.strip_suffix(REPORT_SUFFIX) {
        Some(rest) if rest.is_empty() || rest.ends_with(char::is_whitespace) => {
            rest.trim_end().to_string()
        }
        _ => raw.to_string(),
    }
}

pub fn classify_specifier(raw: &str) -> Result<CanonicalSpecifier, FileError> {
    normalize_specifier(raw).parse()
}

/// Whether the first record of this export must always be discarded before
/// reading headers.
///
/// The choice follows the raw file name, not the canonical specifier, so two
/// names that classify the same way can differ here: `Paid Features Report
/// 1-2025.csv` is forced while `Paid Features 1-2025.csv` is not. Unforced
/// files still go through header detection at offsets 0 and 1, which finds a
/// title line on its own.
pub fn force_skip_header(file_name: &str) -> bool {
    FORCE_SKIP_PREFIXES
        .iter()
        .any(|prefix| file_name.starts_with(prefix))
}

/// Everything the pipeline needs to know about a file before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDescriptor {
    pub period: PeriodKey,
    pub specifier: CanonicalSpecifier,
    pub source_file_name: String,
}

impl ReportDescriptor {
    pub fn from_file_name(file_name: &str) -> Result<Self, FileError> {
        let parsed = parse_filename(file_name)?;
        let specifier = classify_specifier(&parsed.raw_specifier)?;
        let period = parsed.period_token.parse()?;
        Ok(Self {
            period,
            specifier,
            source_file_name: file_name.to_string(),
        })
    }

    pub fn revenue_column(&self) -> &'static str {
        self.specifier.revenue_column()
    }

    pub fn force_skip_header(&self) -> bool {
        force_skip_header(&self.source_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_token_is_period() {
        let p = parse_filename("Paid Features Report 1-2025.csv").unwrap();
        assert_eq!(p.period_token, "1-2025");
        assert_eq!(p.raw_specifier, "Paid Features Report");

        let p = parse_filename("Ads   Revenue\tVideo Summary 11-2024.CSV").unwrap();
        assert_eq!(p.period_token, "11-2024");
        assert_eq!(p.raw_specifier, "Ads Revenue Video Summary");
    }

    #[test]
    fn single_token_is_unparseable() {
        assert!(matches!(
            parse_filename("1-2025.csv"),
            Err(FileError::UnparseableFilename(_))
        ));
        assert!(parse_filename(".csv").is_err());
    }

    #[test]
    fn prefix_rules_win() {
        assert_eq!(
            normalize_specifier("Shorts Ads Revenue Video Summary"),
            "Shorts Ads Revenue"
        );
        assert_eq!(normalize_specifier("Ads Adjustment Report"), "Ads Adjustment");
        assert_eq!(
            normalize_specifier("Premium Non Music Asset Video Summary"),
            "Non Music Video Summary Premium"
        );
        assert_eq!(
            normalize_specifier("Shorts Subscription Revenue Video Summary"),
            "Shorts Subscription Revenue"
        );
    }

    #[test]
    fn trailing_report_word_is_stripped() {
        assert_eq!(normalize_specifier("Paid Features Report"), "Paid Features");
        assert_eq!(
            normalize_specifier("Subscription Revenue Video Report"),
            "Subscription Revenue Video"
        );
        assert_eq!(normalize_specifier("Something Odd"), "Something Odd");
        assert_eq!(normalize_specifier("Monthly Reports"), "Monthly Reports");
    }

    #[test]
    fn normalizing_is_idempotent() {
        for c in CanonicalSpecifier::ALL {
            assert_eq!(normalize_specifier(c.as_str()), c.as_str());
            assert_eq!(classify_specifier(c.as_str()).unwrap(), c);
        }
    }

    #[test]
    fn unknown_specifier_is_reported() {
        match classify_specifier("Music Asset Summary Report") {
            Err(FileError::UnrecognizedSpecifier(s)) => assert_eq!(s, "Music Asset Summary"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn revenue_columns() {
        assert_eq!(
            CanonicalSpecifier::PaidFeatures.revenue_column(),
            "Earnings (USD)"
        );
        assert_eq!(
            CanonicalSpecifier::ShortsAdsRevenue.revenue_column(),
            "Net Partner Revenue (Post revshare)"
        );
        assert_eq!(
            CanonicalSpecifier::AdsRevenueVideoSummary.revenue_column(),
            "Partner Revenue"
        );
    }

    #[test]
    fn forced_skip_follows_the_file_name() {
        assert!(force_skip_header("Paid Features Report 1-2025.csv"));
        assert!(!force_skip_header("Paid Features 1-2025.csv"));
        assert_eq!(
            classify_specifier("Paid Features").unwrap(),
            classify_specifier("Paid Features Report").unwrap()
        );
        assert!(force_skip_header(
            "Shorts Subscription Revenue Video Summary 1-2025.csv"
        ));
        assert!(!force_skip_header("Shorts Subscription Revenue 1-2025.csv"));
    }

    #[test]
    fn descriptor_from_file_name() {
        let d = ReportDescriptor::from_file_name("Paid Features Report 1-2025.csv").unwrap();
        assert_eq!(d.specifier, CanonicalSpecifier::PaidFeatures);
        assert_eq!(d.period.standardized(), "2025-01");
        assert!(d.force_skip_header());

        let d = ReportDescriptor::from_file_name("Ads Revenue Video Summary 1-2025.csv").unwrap();
        assert!(!d.force_skip_header());
        assert_eq!(d.revenue_column(), "Partner Revenue");

        assert!(matches!(
            ReportDescriptor::from_file_name("Paid Features Report January.csv"),
            Err(FileError::InvalidPeriod(_))
        ));
    }
}
