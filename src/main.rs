use std::{env, process};

use time::OffsetDateTime;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use yt_revenue_ledger::{
    build_tabs, cli, consolidate,
    config::{Config, OutputMode},
    google::{DriveFolder, SheetsClient},
    ledger::output_file_name,
    publish_tabs, write_ledger_csv, Result,
};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    let test_mode = env::args().nth(1).is_some_and(|a| a == "--test");
    let folder_id = if test_mode {
        info!("using test folder ID {}", cli::TEST_FOLDER_ID);
        cli::TEST_FOLDER_ID.to_string()
    } else {
        let folder_url = cli::ask_for_folder_url()?;
        let Some(folder_id) = cli::parse_folder_id(&folder_url) else {
            error!("could not parse a folder ID from the URL");
            process::exit(1);
        };
        info!("using folder ID {folder_id}");
        folder_id
    };

    let config = Config::from_env()?;
    let drive = DriveFolder::new(&config.access_token, &folder_id);
    let batch = consolidate(&drive)?;

    match &config.output {
        OutputMode::File => {
            let name = output_file_name(OffsetDateTime::now_utc().date())?;
            let mut content = Vec::new();
            write_ledger_csv(&batch.rows, &mut content)?;
            drive.upload_csv(&name, &content)?;
            info!("consolidated data uploaded to Drive as '{name}'");
        }
        OutputMode::Spreadsheet { sheet_id } => {
            let mut sheets = SheetsClient::new(&config.access_token, sheet_id);
            let tabs = build_tabs(&batch.rows, &config.layout);
            publish_tabs(&mut sheets, &tabs)?;
            info!("all data has been written to Google Sheets");
        }
    }

    info!(
        rows = batch.rows.len(),
        skipped = batch.skipped.len(),
        channels = batch.identity.len(),
        renamed = batch.identity.renamed(),
        "done"
    );
    Ok(())
}
