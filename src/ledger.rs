use std::{collections::BTreeMap, io::Write};

use rust_decimal::Decimal;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

use crate::{
    aggregate::ChannelAggregate, identity::ChannelIdentity, period::PeriodKey,
    report::ReportDescriptor, Result,
};

pub const OUTPUT_NAME_PREFIX: &str = "Consolidated Earnings Sheet";

pub const STATE_ACTUAL: &str = "Actual";
pub const CATEGORY_REVENUE: &str = "Revenue";
pub const SUBCATEGORY_AD_REVENUE: &str = "Ad Revenue";

pub const LEDGER_HEADER: [&str; 9] = [
    "State",
    "Channel ID",
    "Channel Display Name",
    "1 - Category",
    "2 - Subcategory",
    "Actual Date",
    "3 - Specifier",
    "4 - Detail",
    "Value",
];

static OUTPUT_DATE_FMT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// One line of the consolidated ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub state: &'static str,
    pub channel_id: String,
    pub channel_display_name: String,
    pub category: &'static str,
    pub subcategory: &'static str,
    pub period: PeriodKey,
    pub specifier: &'static str,
    pub detail: &'static str,
    pub value: Decimal,
}

/// Aggregates of one file, waiting for display names to be resolved.
#[derive(Debug, Clone)]
pub struct FileAggregates {
    pub descriptor: ReportDescriptor,
    pub aggregates: Vec<ChannelAggregate>,
}

/// Builds the ledger rows in file order, then group order, filling display
/// names from `identity`.
pub fn assemble(files: &[FileAggregates], identity: &ChannelIdentity) -> Vec<OutputRow> {
    files
        .iter()
        .flat_map(|file| {
            file.aggregates.iter().map(move |agg| OutputRow {
                state: STATE_ACTUAL,
                channel_id: agg.channel_id.clone().unwrap_or_default(),
                channel_display_name: identity
                    .resolve(agg.channel_id.as_deref(), agg.display_name.as_deref()),
                category: CATEGORY_REVENUE,
                subcategory: SUBCATEGORY_AD_REVENUE,
                period: file.descriptor.period,
                specifier: file.descriptor.specifier.as_str(),
                detail: file.descriptor.revenue_column(),
                value: agg.value,
            })
        })
        .collect()
}

/// Splits rows by period, keeping their relative order within each period.
pub fn group_by_period(rows: &[OutputRow]) -> BTreeMap<PeriodKey, Vec<&OutputRow>> {
    let mut by_period: BTreeMap<PeriodKey, Vec<&OutputRow>> = BTreeMap::new();
    for row in rows {
        by_period.entry(row.period).or_default().push(row);
    }
    by_period
}

pub fn output_file_name(today: Date) -> Result<String> {
    Ok(format!(
        "{} {}.csv",
        OUTPUT_NAME_PREFIX,
        today.format(OUTPUT_DATE_FMT)?
    ))
}

pub fn is_output_artifact(file_name: &str) -> bool {
    file_name.starts_with(OUTPUT_NAME_PREFIX)
}

pub fn write_ledger_csv<W: Write>(rows: &[OutputRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(LEDGER_HEADER)?;
    for r in rows {
        wtr.write_record(&[
            r.state,
            r.channel_id.as_str(),
            r.channel_display_name.as_str(),
            r.category,
            r.subcategory,
            r.period.standardized().as_str(),
            r.specifier,
            r.detail,
            r.value.to_string().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
