//! Loading a directory of TSV export files.
//!
//! Each `<TABLE>.tsv` file holds one table: a header row, then one record
//! per row, cells separated by tabs. A cell wrapped in double quotes may
//! carry tabs and line breaks (long note text does). When a schema
//! directory is given, a `<TABLE>.json` document beside it declares the
//! column list, types and primary key:
//!
//! ```json
//! {
//!   "primaryKey": [{ "columnName": "PAT_ENC_CSN_ID", "ordinalPosition": 1 }],
//!   "columns": [{ "name": "PAT_ENC_CSN_ID", "type": "NUMERIC(18,0)" }]
//! }
//! ```
//!
//! Without a schema every cell is text.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use recon_core::Scalar;
use serde::Deserialize;

use crate::dataset::Dataset;
use crate::error::SourceError;

/// Storage class of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    Text,
    Integer,
    /// `NUMERIC` and `FLOAT`: integral when the text has no decimal point.
    Real,
}

impl ColumnType {
    /// Map a declared SQL type to a storage class. Unknown types are text.
    #[must_use]
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.starts_with("INTEGER") || upper.starts_with("INT") {
            Self::Integer
        } else if upper.starts_with("NUMERIC")
            || upper.starts_with("FLOAT")
            || upper.starts_with("DECIMAL")
        {
            Self::Real
        } else {
            Self::Text
        }
    }

    /// Coerce one raw cell. Blank cells are null.
    #[must_use]
    pub fn coerce(self, raw: &str) -> Scalar {
        let value = raw.trim();
        if value.is_empty() {
            return Scalar::Null;
        }
        match self {
            Self::Text => Scalar::Text(value.to_string()),
            Self::Integer => {
                if let Ok(i) = value.parse::<i64>() {
                    return Scalar::Int(i);
                }
                match value.parse::<f64>() {
                    Ok(f) if f.is_finite() && f.abs() < 9.0e18 => {
                        #[allow(clippy::cast_possible_truncation)]
                        let whole = f.trunc() as i64;
                        Scalar::Int(whole)
                    }
                    _ => Scalar::Text(value.to_string()),
                }
            }
            Self::Real => match value.parse::<f64>() {
                Ok(f) if !value.contains('.') && f.fract() == 0.0 => value
                    .parse::<i64>()
                    .map_or(Scalar::Float(f), Scalar::Int),
                Ok(f) => Scalar::Float(f),
                Err(_) => Scalar::Text(value.to_string()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default, rename = "primaryKey")]
    primary_key: Vec<PrimaryKeyColumn>,
    #[serde(default)]
    columns: Vec<SchemaColumn>,
}

#[derive(Debug, Deserialize)]
struct PrimaryKeyColumn {
    #[serde(rename = "columnName")]
    column_name: String,
}

#[derive(Debug, Deserialize)]
struct SchemaColumn {
    name: String,
    #[serde(default, rename = "type")]
    declared: String,
}

/// Loads `<TABLE>.tsv` files into a [`Dataset`].
#[derive(Debug, Clone)]
pub struct TsvLoader {
    data_dir: PathBuf,
    schema_dir: Option<PathBuf>,
}

impl TsvLoader {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            schema_dir: None,
        }
    }

    #[must_use]
    pub fn with_schemas(mut self, schema_dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(schema_dir.into());
        self
    }

    /// Load every `.tsv` file in the data directory, in file-name order.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` if the directory or a file cannot be read,
    /// and `SourceError::Schema` if a schema document is malformed.
    pub fn load(&self) -> Result<Dataset, SourceError> {
        let entries = fs::read_dir(&self.data_dir).map_err(|source| SourceError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SourceError::Io {
                path: self.data_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "tsv") {
                files.push(path);
            }
        }
        files.sort();

        let mut dataset = Dataset::new();
        for path in files {
            let Some(table) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            self.load_table(&mut dataset, table, &path)?;
        }
        tracing::debug!(
            dir = %self.data_dir.display(),
            tables = dataset.len(),
            rows = dataset.row_count(),
            "loaded TSV export"
        );
        Ok(dataset)
    }

    fn load_table(&self, dataset: &mut Dataset, table: &str, path: &Path) -> Result<(), SourceError> {
        let bytes = fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let malformed = |source| SourceError::Tsv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut records = reader.records();

        let header: Vec<String> = match records.next().transpose().map_err(malformed)? {
            Some(record) if !is_blank(&record) => {
                record.iter().map(|c| c.trim().to_string()).collect()
            }
            _ => {
                tracing::warn!(table, path = %path.display(), "empty TSV file, skipping");
                return Ok(());
            }
        };

        let schema = self.read_schema(table)?;
        let (columns, types, primary_key) = match schema {
            Some(doc) => {
                let columns: Vec<String> = doc.columns.iter().map(|c| c.name.clone()).collect();
                let types: BTreeMap<String, ColumnType> = doc
                    .columns
                    .iter()
                    .map(|c| (c.name.clone(), ColumnType::from_declared(&c.declared)))
                    .collect();
                let primary_key: Vec<String> =
                    doc.primary_key.into_iter().map(|pk| pk.column_name).collect();
                (columns, types, primary_key)
            }
            None => (header.clone(), BTreeMap::new(), Vec::new()),
        };

        let positions: BTreeMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut rows: Vec<Option<Vec<Scalar>>> = Vec::new();
        let mut by_primary_key: BTreeMap<Vec<Option<String>>, usize> = BTreeMap::new();
        for record in records {
            let record = record.map_err(malformed)?;
            if is_blank(&record) {
                continue;
            }
            let row: Vec<Scalar> = columns
                .iter()
                .map(|column| {
                    let raw = positions
                        .get(column.as_str())
                        .and_then(|&i| record.get(i))
                        .unwrap_or("");
                    types.get(column).copied().unwrap_or_default().coerce(raw)
                })
                .collect();

            // A repeated primary key replaces the earlier row.
            if !primary_key.is_empty() {
                let key: Vec<Option<String>> = primary_key
                    .iter()
                    .map(|pk| {
                        columns
                            .iter()
                            .position(|c| c == pk)
                            .and_then(|i| row[i].key())
                    })
                    .collect();
                if let Some(previous) = by_primary_key.insert(key, rows.len()) {
                    rows[previous] = None;
                }
            }
            rows.push(Some(row));
        }

        let rows: Vec<Vec<Scalar>> = rows.into_iter().flatten().collect();
        tracing::trace!(table, rows = rows.len(), "loaded table");
        dataset.insert(table, columns, rows)
    }

    fn read_schema(&self, table: &str) -> Result<Option<SchemaDocument>, SourceError> {
        let Some(dir) = &self.schema_dir else {
            return Ok(None);
        };
        let path = dir.join(format!("{table}.json"));
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let doc: SchemaDocument =
            serde_json::from_str(&text).map_err(|source| SourceError::Schema { path, source })?;
        if doc.columns.is_empty() {
            return Ok(None);
        }
        Ok(Some(doc))
    }
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ColumnType::Integer, "945468368", Scalar::Int(945_468_368))]
    #[case(ColumnType::Integer, "12.9", Scalar::Int(12))]
    #[case(ColumnType::Integer, "n/a", Scalar::Text("n/a".into()))]
    #[case(ColumnType::Real, "159", Scalar::Int(159))]
    #[case(ColumnType::Real, "159.0", Scalar::Float(159.0))]
    #[case(ColumnType::Real, "22.5", Scalar::Float(22.5))]
    #[case(ColumnType::Real, "<0.5", Scalar::Text("<0.5".into()))]
    #[case(ColumnType::Text, " 0012 ", Scalar::Text("0012".into()))]
    #[case(ColumnType::Text, "   ", Scalar::Null)]
    #[case(ColumnType::Integer, "", Scalar::Null)]
    fn coerces_cells(#[case] ty: ColumnType, #[case] raw: &str, #[case] expected: Scalar) {
        assert_eq!(ty.coerce(raw), expected);
    }

    #[rstest]
    #[case("NUMERIC(18,0)", ColumnType::Real)]
    #[case("FLOAT", ColumnType::Real)]
    #[case("INTEGER", ColumnType::Integer)]
    #[case("VARCHAR(254)", ColumnType::Text)]
    #[case("DATETIME (Local)", ColumnType::Text)]
    #[case("", ColumnType::Text)]
    fn maps_declared_types(#[case] declared: &str, #[case] expected: ColumnType) {
        assert_eq!(ColumnType::from_declared(declared), expected);
    }
}
