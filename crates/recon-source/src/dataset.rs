//! In-memory table source.

use std::collections::BTreeMap;

use recon_core::{RawRecord, Scalar};

use crate::TableSource;
use crate::error::SourceError;
use crate::filter::RowFilter;

/// One physical table: declared columns plus rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<RawRecord>,
}

impl Table {
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A set of named tables held in memory.
///
/// Every row carries a cell for every declared column (null when the export
/// had none), so column presence is a property of the table, not the row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    tables: BTreeMap<String, Table>,
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table from positional rows.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::DuplicateTable` if the name is taken and
    /// `SourceError::RowShape` if a row is wider than the column list.
    pub fn insert(
        &mut self,
        name: &str,
        columns: Vec<String>,
        rows: Vec<Vec<Scalar>>,
    ) -> Result<(), SourceError> {
        if self.tables.contains_key(name) {
            return Err(SourceError::DuplicateTable(name.to_string()));
        }
        let mut records = Vec::with_capacity(rows.len());
        for (index, cells) in rows.into_iter().enumerate() {
            if cells.len() > columns.len() {
                return Err(SourceError::RowShape {
                    table: name.to_string(),
                    row: index,
                    found: cells.len(),
                    expected: columns.len(),
                });
            }
            let mut cells = cells.into_iter();
            let fields = columns
                .iter()
                .map(|c| (c.clone(), cells.next().unwrap_or_default()))
                .collect();
            records.push(RawRecord::from_fields(name, fields));
        }
        self.tables.insert(
            name.to_string(),
            Table {
                columns,
                rows: records,
            },
        );
        Ok(())
    }

    /// Insert a table from records. Columns are the union of the records'
    /// columns in first-seen order; cells a record lacks are stored as null.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::DuplicateTable` if the name is taken.
    pub fn insert_records(
        &mut self,
        name: &str,
        records: Vec<RawRecord>,
    ) -> Result<(), SourceError> {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for column in record.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }
        self.insert_records_with_columns(name, columns, records)
    }

    /// Insert a table from records with an explicit column list. Use this
    /// for tables that must exist with columns but no rows.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::DuplicateTable` if the name is taken.
    pub fn insert_records_with_columns(
        &mut self,
        name: &str,
        columns: Vec<String>,
        records: Vec<RawRecord>,
    ) -> Result<(), SourceError> {
        if self.tables.contains_key(name) {
            return Err(SourceError::DuplicateTable(name.to_string()));
        }
        let rows = records
            .into_iter()
            .map(|record| {
                let fields = columns
                    .iter()
                    .map(|c| (c.clone(), record.get(c).cloned().unwrap_or_default()))
                    .collect();
                RawRecord::from_fields(name, fields)
            })
            .collect();
        self.tables.insert(name.to_string(), Table { columns, rows });
        Ok(())
    }

    /// Remove a table, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total rows across all tables.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Table::len).sum()
    }
}

impl TableSource for Dataset {
    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn columns(&self, table: &str) -> Option<Vec<String>> {
        self.tables.get(table).map(|t| t.columns.clone())
    }

    fn scan(&self, table: &str, filter: &RowFilter) -> Vec<RawRecord> {
        self.tables
            .get(table)
            .map(|t| t.rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default()
    }
}
