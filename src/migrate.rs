//! Additive schema migration: create missing tables, then add every
//! declared column an existing table lacks. Columns are never dropped.

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::schema::QcTable;
use crate::store::QcStore;

/// A column added by [`apply`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedColumn {
    pub table: QcTable,
    pub column: &'static str,
}

/// Bring the store's tables up to the declared schema. Running it twice adds
/// nothing the second time.
pub fn apply(store: &dyn QcStore) -> Result<Vec<AddedColumn>> {
    store.ensure_tables()?;

    let mut added = Vec::new();
    for table in QcTable::ALL {
        let existing = store.column_names(table)?;
        for field in table.schema().fields {
            if existing.iter().any(|c| c == field.name) {
                continue;
            }
            store.add_column(table, field)?;
            info!("Added column {}.{} ({})", table.table_name(), field.name, field.ty.sql_type());
            added.push(AddedColumn {
                table,
                column: field.name,
            });
        }
    }
    Ok(added)
}
