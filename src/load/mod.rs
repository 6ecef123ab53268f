// src/load/mod.rs
use anyhow::{bail, Context, Result};
use arrow::{array::ArrayRef, datatypes::DataType};
use csv::ReaderBuilder;
use rayon::prelude::*;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, info, warn};

use crate::schema::{normalize_headers, SchemaMode};
use crate::table::Table;

pub mod infer;

#[derive(Debug)]
pub struct RawTable {
    /// Canonical column names, from the header row.
    pub headers: Vec<String>,
    /// Each data row, one cell per header; empty or undecodable cells are `None`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Column-major copy of the cells of column `idx`.
    fn column_cells(&self, idx: usize) -> Vec<Option<String>> {
        self.rows.iter().map(|row| row[idx].clone()).collect()
    }

    /// Type the raw cells according to `mode`.
    pub fn into_table(self, mode: SchemaMode) -> Result<Table> {
        // one independent conversion per column
        let columns: Vec<(String, ArrayRef)> = (0..self.headers.len())
            .into_par_iter()
            .map(|idx| {
                let cells = self.column_cells(idx);
                let dtype = match mode {
                    SchemaMode::Inferred => infer::infer_column_type(&cells),
                    SchemaMode::AllText => DataType::Utf8,
                };
                (self.headers[idx].clone(), infer::build_column(&cells, &dtype))
            })
            .collect();
        Table::from_columns(columns)
    }
}

/// Read CSV bytes with a header row into raw string cells.
///
/// Rows shorter than the header are padded with nulls, longer rows are
/// truncated, and cells that are not valid UTF-8 become null. Only a
/// missing header or an I/O failure is an error.
pub fn read_raw<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // keep ragged rows instead of rejecting them
        .from_reader(reader);

    let header_record = rdr.headers().context("reading CSV header row")?.clone();
    if header_record.is_empty() || header_record.iter().all(|h| h.trim().is_empty()) {
        bail!("CSV input has no header row");
    }
    let raw_headers: Vec<String> = header_record.iter().map(str::to_string).collect();
    let headers = normalize_headers(&raw_headers)?;
    let width = headers.len();

    let mut rows = Vec::new();
    let mut ragged = 0usize;
    let mut undecodable = 0usize;
    for (idx, result) in rdr.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV read error at record {}", idx))?;
        if record.len() != width {
            ragged += 1;
        }
        let row: Vec<Option<String>> = (0..width)
            .map(|i| {
                let bytes = record.get(i)?;
                if bytes.is_empty() {
                    return None;
                }
                match std::str::from_utf8(bytes) {
                    Ok(s) => Some(s.to_string()),
                    Err(_) => {
                        undecodable += 1;
                        None
                    }
                }
            })
            .collect();
        rows.push(row);
    }

    if ragged > 0 {
        warn!(ragged, width, "rows with a field count different from the header");
    }
    if undecodable > 0 {
        warn!(undecodable, "cells that are not valid UTF-8 were loaded as null");
    }
    debug!(rows = rows.len(), columns = width, "read raw CSV");

    Ok(RawTable { headers, rows })
}

/// Load a sales CSV file into a typed `Table`.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_sales_csv<P: AsRef<Path>>(path: P, mode: SchemaMode) -> Result<Table> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open sales CSV: {:?}", path.as_ref()))?;
    let raw = read_raw(file)
        .with_context(|| format!("Failed to load sales CSV: {:?}", path.as_ref()))?;
    let table = raw.into_table(mode)?;
    info!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        ?mode,
        "loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray};
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const HEADER: &str = "Retailer,Retailer ID,Invoice Date,Region,State,City,Product,Price per Unit,Units Sold,Total Sales,Operating Profit,Operating Margin,Sales Method";

    fn csv(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s.push('\n');
        s
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    }

    fn dtype(t: &Table, name: &str) -> DataType {
        t.schema().field_with_name(name).unwrap().data_type().clone()
    }

    #[test]
    fn test_read_raw_pads_and_nulls() {
        let data = csv(&[
            "Foot Locker,1185732,1/1/2020,Northeast,New York,New York,Men's Street Footwear,50,\"1,200\",\"600,000\",\"300,000\",50%,In-store",
            "Walmart,1128299,1/2/2020,South",
            ",,,,,,,,,,,,",
        ]);
        let raw = read_raw(Cursor::new(data)).unwrap();
        assert_eq!(raw.headers.len(), 13);
        assert_eq!(raw.rows.len(), 3);
        assert_eq!(raw.rows[0][8].as_deref(), Some("1,200"));
        assert_eq!(raw.rows[1][3].as_deref(), Some("South"));
        assert!(raw.rows[1][4..].iter().all(Option::is_none));
        assert!(raw.rows[2].iter().all(Option::is_none));
    }

    #[test]
    fn test_invalid_utf8_cell_is_null() {
        let mut data = format!("{}\n", HEADER).into_bytes();
        data.extend_from_slice(b"Amazon,1,1/1/2021,West,CA,LA,");
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b",10,5,50,20,40%,Online\n");
        let raw = read_raw(Cursor::new(data)).unwrap();
        assert_eq!(raw.rows[0][6], None);
        assert_eq!(raw.rows[0][0].as_deref(), Some("Amazon"));
    }

    #[test]
    fn test_missing_required_header_is_fatal() {
        let data = "Retailer,Region\nA,West\n";
        let err = read_raw(Cursor::new(data)).unwrap_err();
        assert!(err.to_string().contains("missing required columns"));
        assert!(read_raw(Cursor::new("")).is_err());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_sales_csv("/definitely/not/here.csv", SchemaMode::Inferred).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open sales CSV"));
    }

    #[test]
    fn test_schema_modes() -> Result<()> {
        init_tracing();
        let data = csv(&[
            "Foot Locker,1185732,1/1/2020,Northeast,New York,New York,Men's Street Footwear,50,\"1,200\",\"600,000\",\"300,000\",50%,In-store",
            "Walmart,1128299,2021-02-01,South,Texas,Houston,Women's Apparel,40.5,850,34425,\"12,048\",35%,Online",
        ]);
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(data.as_bytes())?;

        let inferred = load_sales_csv(tmp.path(), SchemaMode::Inferred)?;
        assert_eq!(inferred.num_rows(), 2);
        assert_eq!(dtype(&inferred, "Retailer ID"), DataType::Int32);
        assert_eq!(dtype(&inferred, "Price per Unit"), DataType::Float64);
        // separators keep these as text until cleaning
        assert_eq!(dtype(&inferred, "Units Sold"), DataType::Utf8);
        assert_eq!(dtype(&inferred, "Operating Margin"), DataType::Utf8);

        let text = load_sales_csv(tmp.path(), SchemaMode::AllText)?;
        for field in text.schema().fields() {
            assert_eq!(field.data_type(), &DataType::Utf8, "{}", field.name());
        }
        let units = text.column("Units Sold")?;
        let units = units.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(units.value(0), "1,200");
        assert!(!units.is_null(1));
        Ok(())
    }
}
