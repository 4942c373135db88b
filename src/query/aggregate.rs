//! Sample set → every table's records for those samples.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;
use crate::metrics::QueryMetrics;
use crate::record::QcRecord;
use crate::schema::QcTable;
use crate::store::QcStore;

/// Table → records, with an entry for each of the twelve tables. Serializes
/// keyed by display name in table order.
pub type TableData = BTreeMap<QcTable, Vec<QcRecord>>;

/// One page of the anchor table's samples with their per-table data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub total_count: usize,
    pub data: TableData,
}

/// Every table mapped to an empty list
pub fn empty_table_data() -> TableData {
    QcTable::ALL.into_iter().map(|t| (t, Vec::new())).collect()
}

pub struct Aggregator<'a> {
    store: &'a dyn QcStore,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a dyn QcStore) -> Self {
        Self { store }
    }

    /// Each table's records restricted to `samples`. An empty sample list
    /// returns all-empty lists without touching storage.
    pub fn collect(&self, samples: &[String]) -> Result<TableData> {
        if samples.is_empty() {
            return Ok(empty_table_data());
        }

        QueryMetrics::record_aggregate(samples.len());
        let mut data = TableData::new();
        for table in QcTable::ALL {
            let records = self.store.fetch_by_samples(table, samples)?;
            debug!("{}: {} records", table, records.len());
            data.insert(table, records);
        }
        Ok(data)
    }

    /// Browse the anchor table `limit` samples at a time
    pub fn page(&self, anchor: QcTable, offset: usize, limit: usize) -> Result<Page> {
        let total_count = self.store.count_samples(anchor)?;
        let samples = self.store.list_samples(anchor, offset, limit)?;
        Ok(Page {
            total_count,
            data: self.collect(&samples)?,
        })
    }
}
