use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use crate::{
    ledger::{group_by_period, OutputRow},
    Result,
};

pub const SHEET_HEADER: [&str; 11] = [
    "State",
    "Job Code",
    "Channel ID",
    "Channel Display Name",
    "1 - Category",
    "2 - Subcategory",
    "Actual Date",
    "3 - Specifier",
    "4 - Detail",
    "Value",
    "Current Split Lookup",
];

const ROW_PLACEHOLDER: &str = "{row}";
const SPLIT_SHEET_PLACEHOLDER: &str = "{split}";

/// Literal text and formula templates written into each period tab. `{row}`
/// is replaced with the sheet row of the revenue line and `{split}` with the
/// name of the payout split reference tab.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub split_sheet: String,
    pub revenue_subcategory: String,
    pub revenue_account: String,
    pub expense_category: String,
    pub expense_subcategory_prefix: String,
    pub expense_account: String,
    pub job_code_formula: String,
    pub split_lookup_formula: String,
    pub expense_job_code_formula: String,
    pub expense_value_formula: String,
    pub expense_split_formula: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            split_sheet: "Payout Split Detail".into(),
            revenue_subcategory: "Revenue - Adrev".into(),
            revenue_account: "4110-Advertising Fee Income".into(),
            expense_category: "Expense".into(),
            expense_subcategory_prefix: "Payout - Ad Revenue ".into(),
            expense_account: "4520-Channel Partner Payouts".into(),
            job_code_formula:
                "=XLOOKUP(D{row},'{split}'!$A$2:$A$1000,'{split}'!$B$2:$B$1000)".into(),
            split_lookup_formula: concat!(
                "=IF(H{row}=\"Snap\",XLOOKUP(B{row},'{split}'!$B$2:$B,'{split}'!$F$2:$F),",
                "IF(H{row}=\"FB\",XLOOKUP(B{row},'{split}'!$B$2:$B,'{split}'!$E$2:$E),",
                "XLOOKUP(B{row},'{split}'!$B$2:$B,'{split}'!$D$2:$D)))"
            )
            .into(),
            expense_job_code_formula: "=B{row}".into(),
            expense_value_formula: "=-1*(J{row}*K{row})".into(),
            expense_split_formula: "=K{row}".into(),
        }
    }
}

impl SheetLayout {
    pub fn with_split_sheet(split_sheet: impl Into<String>) -> Self {
        Self {
            split_sheet: split_sheet.into(),
            ..Self::default()
        }
    }

    fn formula(&self, template: &str, row: usize) -> Cell {
        Cell::Formula(
            template
                .replace(ROW_PLACEHOLDER, &row.to_string())
                .replace(SPLIT_SHEET_PLACEHOLDER, &self.split_sheet),
        )
    }

    fn revenue_row(&self, r: &OutputRow, sheet_row: usize) -> Vec<Cell> {
        vec![
            Cell::text(r.state),
            self.formula(&self.job_code_formula, sheet_row),
            Cell::text(&r.channel_id),
            Cell::text(&r.channel_display_name),
            Cell::text(r.category),
            Cell::text(&self.revenue_subcategory),
            Cell::text(r.period.standardized()),
            Cell::text(&self.revenue_account),
            Cell::text(r.specifier),
            Cell::Number(r.value),
            self.formula(&self.split_lookup_formula, sheet_row),
        ]
    }

    /// Offsetting payout entry for the revenue line on `revenue_row`.
    fn expense_row(&self, r: &OutputRow, revenue_row: usize) -> Vec<Cell> {
        vec![
            Cell::text(r.state),
            self.formula(&self.expense_job_code_formula, revenue_row),
            Cell::text(&r.channel_id),
            Cell::text(&r.channel_display_name),
            Cell::text(&self.expense_category),
            Cell::text(format!("{}{}", self.expense_subcategory_prefix, r.subcategory)),
            Cell::text(r.period.standardized()),
            Cell::text(&self.expense_account),
            Cell::text(r.specifier),
            self.formula(&self.expense_value_formula, revenue_row),
            self.formula(&self.expense_split_formula, revenue_row),
        ]
    }
}

/// A single spreadsheet cell. Formulas are passed through for the sheet to
/// evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
    Formula(String),
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Values go out as `USER_ENTERED`, so text that the sheet would read as a
    /// formula or a number gets a leading apostrophe to stay literal.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) if needs_literal_quote(s) => Value::String(format!("'{s}")),
            Cell::Text(s) | Cell::Formula(s) => Value::String(s.clone()),
            Cell::Number(d) => Value::String(d.to_string()),
        }
    }
}

fn needs_literal_quote(s: &str) -> bool {
    s.starts_with(['=', '+', '-', '\'']) || Decimal::from_str(s).is_ok()
}

/// Full contents of one period tab, header included.
#[derive(Debug, Clone, PartialEq)]
pub struct TabContent {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl TabContent {
    pub fn values_json(&self) -> Value {
        Value::Array(
            self.rows
                .iter()
                .map(|row| Value::Array(row.iter().map(Cell::to_json).collect()))
                .collect(),
        )
    }
}

/// One tab per period: all revenue rows first, then one expense row for each
/// of them in the same order.
pub fn build_tabs(rows: &[OutputRow], layout: &SheetLayout) -> Vec<TabContent> {
    group_by_period(rows)
        .into_iter()
        .map(|(period, rows)| {
            let mut values: Vec<Vec<Cell>> = Vec::with_capacity(rows.len() * 2 + 1);
            values.push(SHEET_HEADER.iter().map(|h| Cell::text(*h)).collect());
            // Header sits on sheet row 1.
            for (i, r) in rows.iter().enumerate() {
                values.push(layout.revenue_row(r, i + 2));
            }
            for (i, r) in rows.iter().enumerate() {
                values.push(layout.expense_row(r, i + 2));
            }
            TabContent {
                name: period.display_name(),
                rows: values,
            }
        })
        .collect()
}

/// Destination holding one tab per period.
pub trait TabSink {
    fn ensure_tab(&mut self, name: &str) -> Result<()>;
    fn clear_tab(&mut self, name: &str) -> Result<()>;
    fn write_tab(&mut self, tab: &TabContent) -> Result<usize>;
}

/// Replaces each tab's contents. Prior data in a tab is dropped, never merged.
pub fn publish_tabs<S: TabSink>(sink: &mut S, tabs: &[TabContent]) -> Result<usize> {
    let mut written = 0;
    for tab in tabs {
        sink.ensure_tab(&tab.name)?;
        sink.clear_tab(&tab.name)?;
        let n = sink.write_tab(tab)?;
        info!(tab = %tab.name, rows = n, "tab written");
        written += n;
    }
    Ok(written)
}
