use std::{collections::HashMap, str::FromStr};

use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    error::FileError,
    table::{RawTable, CHANNEL_ID, CHANNEL_LABEL},
};

/// Revenue summed for one channel (and label, when the export has one) within
/// a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAggregate {
    pub channel_id: Option<String>,
    pub display_name: Option<String>,
    pub value: Decimal,
}

/// Groups `table` by channel ID, plus the `Channel` label column when present,
/// and sums `revenue_column`. Groups keep the order in which they first show up.
pub fn aggregate_revenue(
    table: &RawTable,
    revenue_column: &'static str,
) -> Result<Vec<ChannelAggregate>, FileError> {
    let id_index = table
        .column(CHANNEL_ID)
        .ok_or(FileError::SchemaMismatch(CHANNEL_ID))?;
    let value_index = table
        .column(revenue_column)
        .ok_or(FileError::MissingRevenueColumn(revenue_column))?;
    let label_index = table.column(CHANNEL_LABEL);

    let mut groups: Vec<ChannelAggregate> = Vec::new();
    let mut positions: HashMap<(Option<&str>, Option<&str>), usize> = HashMap::new();

    for (row_number, row) in table.rows().enumerate() {
        let channel_id = RawTable::cell(row, id_index);
        let label = label_index.and_then(|i| RawTable::cell(row, i));
        let value = match RawTable::cell(row, value_index) {
            Some(raw) => parse_amount(raw).ok_or_else(|| FileError::MalformedValue {
                column: revenue_column,
                value: raw.to_string(),
                row: row_number + 1,
            })?,
            None => Decimal::ZERO,
        };

        let position = *positions.entry((channel_id, label)).or_insert_with(|| {
            groups.push(ChannelAggregate {
                channel_id: channel_id.map(str::to_string),
                display_name: label.map(str::to_string),
                value: Decimal::ZERO,
            });
            groups.len() - 1
        });
        let group = &mut groups[position];
        group.value = group
            .value
            .checked_add(value)
            .ok_or(FileError::Overflow {
                column: revenue_column,
                row: row_number + 1,
            })?;
    }

    if groups.iter().any(|g| g.channel_id.is_none()) {
        warn!("rows without a channel ID were kept as their own group");
    }
    Ok(groups)
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::resolve_table;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn groups_by_id_and_label() {
        let csv = "Channel ID,Channel,Partner Revenue\n\
                   UC1,Alpha,1.10\n\
                   UC2,Beta,2.00\n\
                   UC1,Alpha,0.20\n\
                   UC1,Alpha Old,5\n";
        let table = resolve_table(csv, false).unwrap();
        let groups = aggregate_revenue(&table, "Partner Revenue").unwrap();
        assert_eq!(
            groups,
            vec![
                ChannelAggregate {
                    channel_id: Some("UC1".into()),
                    display_name: Some("Alpha".into()),
                    value: dec("1.30"),
                },
                ChannelAggregate {
                    channel_id: Some("UC2".into()),
                    display_name: Some("Beta".into()),
                    value: dec("2.00"),
                },
                ChannelAggregate {
                    channel_id: Some("UC1".into()),
                    display_name: Some("Alpha Old".into()),
                    value: dec("5"),
                },
            ]
        );
    }

    #[test]
    fn without_label_display_name_is_unset() {
        let csv = "Channel ID,Channel Display Name,Partner Revenue\nUC1,Alpha,1\nUC1,Alpha,2\n";
        let table = resolve_table(csv, false).unwrap();
        let groups = aggregate_revenue(&table, "Partner Revenue").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].display_name, None);
        assert_eq!(groups[0].value, dec("3"));
    }

    #[test]
    fn missing_channel_id_is_its_own_group() {
        let csv = "Channel ID,Partner Revenue\nUC1,1\n,2\n ,3\n";
        let table = resolve_table(csv, false).unwrap();
        let groups = aggregate_revenue(&table, "Partner Revenue").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].channel_id, None);
        assert_eq!(groups[1].value, dec("5"));
    }

    #[test]
    fn sum_is_conserved() {
        let csv = "Channel ID,Channel,Partner Revenue\n\
                   UC1,A,0.1\nUC2,B,0.2\nUC1,A,0.3\n,C,0.4\nUC3,,1e-2\nUC2,B,\n";
        let table = resolve_table(csv, false).unwrap();
        let groups = aggregate_revenue(&table, "Partner Revenue").unwrap();
        let total: Decimal = groups.iter().map(|g| g.value).sum();
        assert_eq!(total, dec("1.01"));
    }

    #[test]
    fn non_numeric_revenue_fails_the_file() {
        let csv = "Channel ID,Partner Revenue\nUC1,1\nUC2,n/a\n";
        let table = resolve_table(csv, false).unwrap();
        match aggregate_revenue(&table, "Partner Revenue") {
            Err(FileError::MalformedValue { value, row, .. }) => {
                assert_eq!(value, "n/a");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overflowing_sum_fails_the_file() {
        let csv = "Channel ID,Partner Revenue\nUC1,79228162514264337593543950335\nUC1,1\n";
        let table = resolve_table(csv, false).unwrap();
        assert!(matches!(
            aggregate_revenue(&table, "Partner Revenue"),
            Err(FileError::Overflow {
                column: "Partner Revenue",
                row: 2
            })
        ));
    }

    #[test]
    fn missing_revenue_column() {
        let table = resolve_table("Channel ID,Earnings (USD)\nUC1,1\n", false).unwrap();
        assert!(matches!(
            aggregate_revenue(&table, "Partner Revenue"),
            Err(FileError::MissingRevenueColumn("Partner Revenue"))
        ));
    }
}
