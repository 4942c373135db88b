//! Storage-neutral query value for "which samples satisfy this predicate".

use crate::query::spec::{CompareOp, LogicalOp};
use crate::schema::{QcTable, SAMPLE_KEY};

/// `table.column op value`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub table: QcTable,
    pub column: &'static str,
    pub op: CompareOp,
    pub value: f64,
}

/// Predicate tree. Built by folding comparisons left to right, so the tree
/// is always left-deep.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Comparison),
    Combine {
        left: Box<Predicate>,
        op: LogicalOp,
        right: Box<Predicate>,
    },
}

impl Predicate {
    pub fn combine(self, op: LogicalOp, right: Predicate) -> Predicate {
        Predicate::Combine {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Evaluate with SQL NULL semantics. `lookup` returns `None` for a NULL
    /// column; the result is `None` when the predicate is unknown.
    pub fn eval<F>(&self, lookup: &F) -> Option<bool>
    where
        F: Fn(QcTable, &str) -> Option<f64>,
    {
        match self {
            Predicate::Compare(c) => lookup(c.table, c.column).map(|lhs| c.op.apply(lhs, c.value)),
            Predicate::Combine { left, op, right } => op.apply(left.eval(lookup), right.eval(lookup)),
        }
    }

    fn render(&self, sql: &mut String, params: &mut Vec<f64>) {
        match self {
            Predicate::Compare(c) => {
                sql.push_str(&format!(
                    "\"{}\".\"{}\" {} ?",
                    c.table.table_name(),
                    c.column,
                    c.op.sql()
                ));
                params.push(c.value);
            }
            Predicate::Combine { left, op, right } => {
                sql.push('(');
                left.render(sql, params);
                sql.push(' ');
                sql.push_str(op.sql());
                sql.push(' ');
                right.render(sql, params);
                sql.push(')');
            }
        }
    }
}

/// A base table, inner joins on the sample key, and an optional predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleQuery {
    base: QcTable,
    joins: Vec<QcTable>,
    predicate: Option<Predicate>,
}

impl SampleQuery {
    pub fn new(base: QcTable) -> Self {
        Self {
            base,
            joins: Vec::new(),
            predicate: None,
        }
    }

    pub fn base(&self) -> QcTable {
        self.base
    }

    pub fn joins(&self) -> &[QcTable] {
        &self.joins
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Base table followed by the joined tables, in join order
    pub fn tables(&self) -> impl Iterator<Item = QcTable> + '_ {
        std::iter::once(self.base).chain(self.joins.iter().copied())
    }

    /// Inner-join `table` unless it is already part of the query. Returns
    /// whether a join was added.
    pub fn join(&mut self, table: QcTable) -> bool {
        if table == self.base || self.joins.contains(&table) {
            return false;
        }
        self.joins.push(table);
        true
    }

    /// Fold `predicate` into the current one: `current op predicate`
    pub fn fold(&mut self, op: LogicalOp, predicate: Predicate) {
        self.predicate = Some(match self.predicate.take() {
            None => predicate,
            Some(current) => current.combine(op, predicate),
        });
    }

    /// Distinct matching samples, ordered by sample, plus positional parameters
    pub fn to_sql(&self) -> (String, Vec<f64>) {
        let base = self.base.table_name();
        let mut sql = format!("SELECT DISTINCT \"{base}\".{SAMPLE_KEY} FROM \"{base}\"");
        for table in &self.joins {
            let name = table.table_name();
            sql.push_str(&format!(
                " INNER JOIN \"{name}\" ON \"{name}\".{SAMPLE_KEY} = \"{base}\".{SAMPLE_KEY}"
            ));
        }

        let mut params = Vec::new();
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            predicate.render(&mut sql, &mut params);
        }
        sql.push_str(&format!(" ORDER BY \"{base}\".{SAMPLE_KEY}"));
        (sql, params)
    }
}
