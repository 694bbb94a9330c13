use anyhow::Error;
use tracing::{info, warn};

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod google;
pub mod identity;
pub mod ledger;
pub mod period;
pub mod report;
pub mod sheet;
pub mod source;
pub mod table;

pub use aggregate::{aggregate_revenue, ChannelAggregate};
pub use error::FileError;
pub use identity::ChannelIdentity;
pub use ledger::{assemble, write_ledger_csv, FileAggregates, OutputRow};
pub use period::PeriodKey;
pub use report::{CanonicalSpecifier, ReportDescriptor};
pub use sheet::{build_tabs, publish_tabs, SheetLayout, TabContent, TabSink};
pub use source::{LocalFolder, ReportSource, SourceFile};
pub use table::{resolve_table, RawTable};

pub type Result<T> = std::result::Result<T, Error>;

/// A file left out of the ledger, and why.
#[derive(Debug)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: FileError,
}

/// Result of consolidating one batch of exports.
#[derive(Debug, Default)]
pub struct Consolidation {
    pub rows: Vec<OutputRow>,
    pub skipped: Vec<SkippedFile>,
    pub identity: ChannelIdentity,
}

/// Turns one export into per-channel aggregates, feeding its channel names
/// into `identity` once the file is known to be good.
pub fn process_report(
    descriptor: ReportDescriptor,
    content: &str,
    identity: &mut ChannelIdentity,
) -> std::result::Result<FileAggregates, FileError> {
    let table = resolve_table(content, descriptor.force_skip_header())?;
    let aggregates = aggregate_revenue(&table, descriptor.revenue_column())?;
    identity.absorb(&table);
    Ok(FileAggregates {
        descriptor,
        aggregates,
    })
}

/// Fetches, parses and aggregates every report in `source`, one file at a
/// time, then assembles the ledger. Bad files are skipped; source failures
/// abort the batch.
pub fn consolidate<S: ReportSource>(source: &S) -> Result<Consolidation> {
    let mut identity = ChannelIdentity::new();
    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for file in source.list()? {
        if ledger::is_output_artifact(&file.name) {
            info!(name = %file.name, "ignoring previous output");
            continue;
        }
        let processed = match ReportDescriptor::from_file_name(&file.name) {
            Ok(descriptor) => {
                let content = source.fetch(&file)?;
                process_report(descriptor, &content, &mut identity)
            }
            Err(reason) => Err(reason),
        };
        match processed {
            Ok(aggregates) => {
                info!(
                    name = %file.name,
                    specifier = %aggregates.descriptor.specifier,
                    period = %aggregates.descriptor.period,
                    channels = aggregates.aggregates.len(),
                    "processed"
                );
                files.push(aggregates);
            }
            Err(reason) => {
                warn!(name = %file.name, %reason, "skipping file");
                skipped.push(SkippedFile {
                    file_name: file.name,
                    reason,
                });
            }
        }
    }

    let rows = assemble(&files, &identity);
    Ok(Consolidation {
        rows,
        skipped,
        identity,
    })
}
