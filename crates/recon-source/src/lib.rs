//! # recon-source
//!
//! Where the engine's rows come from.
//!
//! The engine reads through the [`TableSource`] trait and never assumes a
//! table exists: an absent table has no columns and scans to no rows.
//! [`Dataset`] is the in-memory implementation; [`TsvLoader`] fills one from
//! a directory of tab-separated export files.

mod dataset;
mod error;
mod filter;
mod tsv;

pub use dataset::{Dataset, Table};
pub use error::SourceError;
pub use filter::RowFilter;
pub use tsv::{ColumnType, TsvLoader};

use recon_core::RawRecord;

/// Read access to a set of named tables.
pub trait TableSource {
    /// Names of every table present, in a stable order.
    fn table_names(&self) -> Vec<String>;

    /// Declared columns of `table`, or `None` if the table is absent.
    fn columns(&self, table: &str) -> Option<Vec<String>>;

    /// Rows of `table` that match `filter`, in the table's row order. Rows
    /// come back tagged with the physical table name. An absent table scans
    /// to an empty list.
    fn scan(&self, table: &str, filter: &RowFilter) -> Vec<RawRecord>;

    fn has_table(&self, table: &str) -> bool {
        self.columns(table).is_some()
    }
}
