use csv::StringRecord;
use tracing::debug;

use crate::error::FileError;

pub const CHANNEL_ID: &str = "Channel ID";
pub const CHANNEL_DISPLAY_NAME: &str = "Channel Display Name";
pub const CHANNEL_LABEL: &str = "Channel";

/// A parsed export with whitespace-trimmed column names.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
    header_offset: usize,
}

impl RawTable {
    /// Reads `content` as headerless records, drops the first `header_offset`
    /// of them and takes the next one as the header row.
    fn parse(content: &str, header_offset: usize) -> Result<Self, FileError> {
        let mut records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes())
            .into_records()
            .skip(header_offset);
        let headers = match records.next() {
            Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
            None => Vec::new(),
        };
        let rows = records.collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            headers,
            rows,
            header_offset,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn rows(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    /// Trimmed cell value; blank and missing cells are `None`.
    pub fn cell<'a>(row: &'a StringRecord, index: usize) -> Option<&'a str> {
        row.get(index).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Reads one export, locating the header row. Exports that are forced to skip
/// their first line are read at offset 1 only; everything else tries offset 0
/// and then offset 1. Either way the channel ID column must be present.
pub fn resolve_table(content: &str, force_skip: bool) -> Result<RawTable, FileError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let offsets: &[usize] = if force_skip { &[1] } else { &[0, 1] };
    for &offset in offsets {
        let table = RawTable::parse(content, offset)?;
        if table.has_column(CHANNEL_ID) {
            debug!(offset, rows = table.len(), "header row located");
            return Ok(table);
        }
    }
    Err(FileError::SchemaMismatch(CHANNEL_ID))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_on_first_line() {
        let t = resolve_table(" Channel ID ,Channel,Partner Revenue\nUC1,A,1.5\n", false).unwrap();
        assert_eq!(t.header_offset(), 0);
        assert_eq!(t.headers(), ["Channel ID", "Channel", "Partner Revenue"]);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn header_on_second_line() {
        let csv = "Report for January 2025\nChannel ID,Channel,Earnings (USD)\nUC1,A,2\nUC2,B,3\n";
        let t = resolve_table(csv, false).unwrap();
        assert_eq!(t.header_offset(), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.column("Earnings (USD)"), Some(2));
    }

    #[test]
    fn header_missing_everywhere() {
        let csv = "Title\nVideo ID,Revenue\nv1,2\n";
        assert!(matches!(
            resolve_table(csv, false),
            Err(FileError::SchemaMismatch(CHANNEL_ID))
        ));
    }

    #[test]
    fn forced_skip_never_reads_first_line_as_header() {
        let csv = "Channel ID,Partner Revenue\nChannel ID,Partner Revenue\nUC1,4\n";
        let t = resolve_table(csv, true).unwrap();
        assert_eq!(t.header_offset(), 1);
        assert_eq!(t.len(), 1);

        assert!(resolve_table("Channel ID,Partner Revenue\nUC1,4\n", true).is_err());
    }

    #[test]
    fn header_beyond_second_line_is_rejected() {
        let csv = "t1\nt2\nChannel ID,Partner Revenue\nUC1,1\n";
        for force in [false, true] {
            assert!(matches!(
                resolve_table(csv, force),
                Err(FileError::SchemaMismatch(CHANNEL_ID))
            ));
        }
    }

    #[test]
    fn carriage_return_line_endings() {
        let csv = "Report for January 2025\rChannel ID,Channel,Earnings (USD)\rUC1,A,2\r";
        for force in [false, true] {
            let t = resolve_table(csv, force).unwrap();
            assert_eq!(t.header_offset(), 1);
            assert_eq!(t.len(), 1);
            assert_eq!(t.column("Earnings (USD)"), Some(2));
        }
    }

    #[test]
    fn quoted_title_spanning_lines_counts_as_one_row() {
        let csv = "\"Earnings report\nJanuary 2025\"\nChannel ID,Partner Revenue\nUC1,4\n";
        for force in [false, true] {
            let t = resolve_table(csv, force).unwrap();
            assert_eq!(t.header_offset(), 1);
            assert_eq!(t.headers(), ["Channel ID", "Partner Revenue"]);
            assert_eq!(t.len(), 1);
        }
    }

    #[test]
    fn empty_export_has_no_header() {
        assert!(matches!(
            resolve_table("", false),
            Err(FileError::SchemaMismatch(CHANNEL_ID))
        ));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let t = resolve_table("\u{feff}Channel ID,Partner Revenue\nUC1,4\n", false).unwrap();
        assert_eq!(t.header_offset(), 0);
    }

    #[test]
    fn blank_cells_are_none() {
        let t = resolve_table("Channel ID,Channel\n , x \n", false).unwrap();
        let row = t.rows().next().unwrap();
        assert_eq!(RawTable::cell(row, 0), None);
        assert_eq!(RawTable::cell(row, 1), Some("x"));
        assert_eq!(RawTable::cell(row, 5), None);
    }
}
