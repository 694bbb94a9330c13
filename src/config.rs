use std::env;

use anyhow::Context;

use crate::{sheet::SheetLayout, Result};

pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_ACCESS_TOKEN";
pub const SHEET_ID_VAR: &str = "YT_SHEET_ID";
pub const SPLIT_SHEET_VAR: &str = "YT_SPLIT_SHEET";

/// Where the consolidated ledger ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Upload one CSV into the input folder.
    File,
    /// Write one tab per period into this spreadsheet.
    Spreadsheet { sheet_id: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub output: OutputMode,
    pub layout: SheetLayout,
}

impl Config {
    /// Reads settings from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let access_token = non_empty(ACCESS_TOKEN_VAR)
            .with_context(|| format!("{ACCESS_TOKEN_VAR} is not set"))?;
        let output = match non_empty(SHEET_ID_VAR) {
            Some(sheet_id) => OutputMode::Spreadsheet { sheet_id },
            None => OutputMode::File,
        };
        let layout = match non_empty(SPLIT_SHEET_VAR) {
            Some(name) => SheetLayout::with_split_sheet(name),
            None => SheetLayout::default(),
        };
        Ok(Self {
            access_token,
            output,
            layout,
        })
    }
}
