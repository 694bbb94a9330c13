use std::collections::{hash_map::Entry, HashMap};

use tracing::warn;

use crate::table::{RawTable, CHANNEL_DISPLAY_NAME, CHANNEL_ID};

pub const MISSING_CHANNEL_NAME: &str = "(missing channel id)";

/// Channel ID to display name lookup gathered across every file in a batch.
#[derive(Debug, Default, Clone)]
pub struct ChannelIdentity {
    names: HashMap<String, String>,
    renamed: usize,
}

impl ChannelIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the (channel ID, display name) pairs of a table that has both
    /// columns. Within the table the last name per ID counts, and a later name
    /// for a known ID replaces the earlier one.
    pub fn absorb(&mut self, table: &RawTable) {
        let (Some(id_index), Some(name_index)) =
            (table.column(CHANNEL_ID), table.column(CHANNEL_DISPLAY_NAME))
        else {
            return;
        };
        let mut order: Vec<&str> = Vec::new();
        let mut latest: HashMap<&str, &str> = HashMap::new();
        for row in table.rows() {
            if let (Some(id), Some(name)) = (
                RawTable::cell(row, id_index),
                RawTable::cell(row, name_index),
            ) {
                if latest.insert(id, name).is_none() {
                    order.push(id);
                }
            }
        }
        for id in order {
            if let Some(name) = latest.get(id) {
                self.insert(id, name);
            }
        }
    }

    pub fn insert(&mut self, channel_id: &str, display_name: &str) {
        match self.names.entry(channel_id.to_string()) {
            Entry::Occupied(mut e) => {
                if e.get() != display_name {
                    warn!(
                        channel_id,
                        previous = %e.get(),
                        current = display_name,
                        "channel has more than one display name; keeping the latest"
                    );
                    e.insert(display_name.to_string());
                    self.renamed += 1;
                }
            }
            Entry::Vacant(e) => {
                e.insert(display_name.to_string());
            }
        }
    }

    /// How many times a known channel's display name was replaced.
    pub fn renamed(&self) -> usize {
        self.renamed
    }

    pub fn get(&self, channel_id: &str) -> Option<&str> {
        self.names.get(channel_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Display name for an aggregate: its own label if it has one, else the
    /// batch-wide lookup, else the channel ID itself.
    pub fn resolve(&self, channel_id: Option<&str>, provisional: Option<&str>) -> String {
        if let Some(name) = provisional.filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match channel_id {
            Some(id) => self.get(id).unwrap_or(id).to_string(),
            None => MISSING_CHANNEL_NAME.to_string(),
        }
    }
}
