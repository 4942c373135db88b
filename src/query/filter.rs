//! Filter spec → sample set.
//!
//! Clauses are combined by a strict left-to-right fold with no precedence:
//! `[A, B, C]` with `[or, and]` means `(A or B) and C`. Every table a clause
//! references is inner-joined to the base table on the sample key, so a
//! sample missing from any referenced table never matches, whatever the
//! clause's own connective.

use std::time::Instant;
use tracing::{debug, info, warn};

use super::spec::{FilterSpec, LogicalOp};
use crate::error::{QcError, Result};
use crate::metrics::QueryMetrics;
use crate::schema::{FilterField, QcTable};
use crate::store::{Comparison, Predicate, QcStore, SampleQuery};

/// Table every filter query starts from
pub const FILTER_BASE_TABLE: QcTable = QcTable::BsRate;

pub struct FilterCompiler<'a> {
    store: &'a dyn QcStore,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(store: &'a dyn QcStore) -> Self {
        Self { store }
    }

    /// Build the query for a spec. `None` when no clause survives resolution.
    ///
    /// A clause naming an unknown field is dropped together with the
    /// connective in front of it. A missing connective defaults to `and`.
    pub fn compile(&self, spec: &FilterSpec) -> Result<Option<SampleQuery>> {
        if spec.operators.len() + 1 != spec.expressions.len() && !spec.expressions.is_empty() {
            warn!(
                "Filter has {} expressions but {} operators; missing operators default to 'and'",
                spec.expressions.len(),
                spec.operators.len()
            );
        }

        let mut query = SampleQuery::new(FILTER_BASE_TABLE);
        let mut clauses = 0usize;

        for (i, expr) in spec.expressions.iter().enumerate() {
            let field = match expr.field.parse::<FilterField>() {
                Ok(f) => f,
                Err(e) => {
                    debug!("{}; dropping clause", e);
                    QueryMetrics::record_unknown_field();
                    continue;
                }
            };

            let table = field.table();
            if query.join(table) {
                debug!("Joining {} on sample", table);
            }

            let op = match i {
                0 => LogicalOp::And,
                _ => spec.operators.get(i - 1).copied().unwrap_or(LogicalOp::And),
            };
            query.fold(
                op,
                Predicate::Compare(Comparison {
                    table,
                    column: field.column().name,
                    op: expr.op,
                    value: expr.value,
                }),
            );
            clauses += 1;
        }

        if clauses == 0 {
            return Ok(None);
        }

        for table in query.tables() {
            if !self.store.table_exists(table)? {
                return Err(QcError::NoJoinPath {
                    table: table.table_name().to_string(),
                });
            }
        }
        Ok(Some(query))
    }

    /// Samples satisfying the spec, ordered by sample. An empty spec (or one
    /// whose every field is unknown) matches nothing and issues no query.
    pub fn run(&self, spec: &FilterSpec) -> Result<Vec<String>> {
        let started = Instant::now();
        let Some(query) = self.compile(spec)? else {
            info!("Filter resolved to no clauses; returning no samples");
            return Ok(Vec::new());
        };

        let samples = self.store.run_sample_query(&query)?;
        QueryMetrics::record_filter(
            query.tables().count(),
            samples.len(),
            started.elapsed().as_secs_f64(),
        );
        info!("Filter matched {} samples", samples.len());
        Ok(samples)
    }
}
