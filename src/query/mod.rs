//! Query path: search term or filter spec → sample set → per-table data.

pub mod aggregate;
pub mod filter;
pub mod resolver;
pub mod spec;

pub use aggregate::{empty_table_data, Aggregator, Page, TableData};
pub use filter::{FilterCompiler, FILTER_BASE_TABLE};
pub use resolver::{SampleResolver, SearchTerm, ANCHOR_TABLE};
pub use spec::{CompareOp, FilterExpression, FilterSpec, LogicalOp};

use tracing::instrument;

use crate::error::Result;
use crate::store::QcStore;

/// The search, filter and browse flows over one storage handle
pub struct QueryService<'a> {
    store: &'a dyn QcStore,
}

impl<'a> QueryService<'a> {
    pub fn new(store: &'a dyn QcStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub fn search(&self, term: &str) -> Result<TableData> {
        let samples = SampleResolver::new(self.store).resolve(term)?;
        Aggregator::new(self.store).collect(&samples)
    }

    #[instrument(skip(self, spec), fields(clauses = spec.expressions.len()))]
    pub fn filter(&self, spec: &FilterSpec) -> Result<TableData> {
        let samples = FilterCompiler::new(self.store).run(spec)?;
        Aggregator::new(self.store).collect(&samples)
    }

    pub fn page(&self, offset: usize, limit: usize) -> Result<Page> {
        Aggregator::new(self.store).page(ANCHOR_TABLE, offset, limit)
    }
}
