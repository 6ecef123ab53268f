// src/schema/mod.rs
use anyhow::{bail, Result};
use arrow::datatypes::{DataType, Schema};
use std::fmt::Write;

/// How the loader types the columns of a freshly read CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaMode {
    /// Type each column from its content (integer → float → text).
    #[default]
    Inferred,
    /// Keep every column as text.
    AllText,
}

/// Every field the sales pipeline knows about, raw and derived.
///
/// Queries address columns through this enum instead of by position, so a
/// renamed header fails once at load time rather than deep inside a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SalesColumn {
    Retailer,
    RetailerId,
    InvoiceDate,
    Region,
    State,
    City,
    Product,
    PricePerUnit,
    UnitsSold,
    TotalSales,
    OperatingProfit,
    OperatingMargin,
    SalesMethod,
    YearOfInvoice,
    MonthOfInvoice,
    CalculatedSales,
    ProfitCheck,
}

impl SalesColumn {
    /// Columns read from the input file, in the dataset's header order.
    pub const RAW: [SalesColumn; 13] = [
        SalesColumn::Retailer,
        SalesColumn::RetailerId,
        SalesColumn::InvoiceDate,
        SalesColumn::Region,
        SalesColumn::State,
        SalesColumn::City,
        SalesColumn::Product,
        SalesColumn::PricePerUnit,
        SalesColumn::UnitsSold,
        SalesColumn::TotalSales,
        SalesColumn::OperatingProfit,
        SalesColumn::OperatingMargin,
        SalesColumn::SalesMethod,
    ];

    /// Columns the pipeline computes after cleaning, in append order.
    pub const DERIVED: [SalesColumn; 4] = [
        SalesColumn::YearOfInvoice,
        SalesColumn::MonthOfInvoice,
        SalesColumn::CalculatedSales,
        SalesColumn::ProfitCheck,
    ];

    /// The column name as it appears in the CSV header / result tables.
    pub fn name(self) -> &'static str {
        match self {
            SalesColumn::Retailer => "Retailer",
            SalesColumn::RetailerId => "Retailer ID",
            SalesColumn::InvoiceDate => "Invoice Date",
            SalesColumn::Region => "Region",
            SalesColumn::State => "State",
            SalesColumn::City => "City",
            SalesColumn::Product => "Product",
            SalesColumn::PricePerUnit => "Price per Unit",
            SalesColumn::UnitsSold => "Units Sold",
            SalesColumn::TotalSales => "Total Sales",
            SalesColumn::OperatingProfit => "Operating Profit",
            SalesColumn::OperatingMargin => "Operating Margin",
            SalesColumn::SalesMethod => "Sales Method",
            SalesColumn::YearOfInvoice => "Year of Invoice",
            SalesColumn::MonthOfInvoice => "Month of Invoice",
            SalesColumn::CalculatedSales => "calculated_sales",
            SalesColumn::ProfitCheck => "profit_check",
        }
    }

    /// Whether a load must fail when the header lacks this column.
    pub fn is_required(self) -> bool {
        !matches!(self, SalesColumn::RetailerId | SalesColumn::City)
            && !SalesColumn::DERIVED.contains(&self)
    }

    /// Arrow type the column carries once cleaning and derivation ran.
    /// `None` for columns that keep whatever type the loader gave them.
    pub fn final_type(self) -> Option<DataType> {
        match self {
            SalesColumn::UnitsSold | SalesColumn::OperatingProfit => Some(DataType::Int64),
            SalesColumn::TotalSales
            | SalesColumn::OperatingMargin
            | SalesColumn::CalculatedSales
            | SalesColumn::ProfitCheck => Some(DataType::Float64),
            SalesColumn::InvoiceDate => Some(DataType::Date32),
            SalesColumn::YearOfInvoice | SalesColumn::MonthOfInvoice => Some(DataType::Int32),
            SalesColumn::PricePerUnit | SalesColumn::RetailerId => None,
            _ => Some(DataType::Utf8),
        }
    }

    /// Inclusive bounds a cleaned value must fall in. Values outside are
    /// nulled by the cleaning step.
    pub fn valid_range(self) -> Option<(f64, f64)> {
        match self {
            SalesColumn::UnitsSold | SalesColumn::TotalSales | SalesColumn::OperatingProfit => {
                Some((0.0, f64::INFINITY))
            }
            SalesColumn::OperatingMargin => Some((0.0, 1.0)),
            _ => None,
        }
    }

    /// Look a raw header up; surrounding whitespace is ignored.
    pub fn from_header(header: &str) -> Option<SalesColumn> {
        let header = header.trim();
        SalesColumn::RAW
            .iter()
            .chain(SalesColumn::DERIVED.iter())
            .copied()
            .find(|c| c.name() == header)
    }
}

impl std::fmt::Display for SalesColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Map each raw header to its canonical name and make sure every required
/// sales column is present.
///
/// Unknown headers are kept verbatim (trimmed) so they flow through the
/// pipeline untouched.
pub fn normalize_headers(headers: &[String]) -> Result<Vec<String>> {
    let names: Vec<String> = headers
        .iter()
        .map(|h| match SalesColumn::from_header(h) {
            Some(col) => col.name().to_string(),
            None => h.trim().to_string(),
        })
        .collect();

    let missing: Vec<&str> = SalesColumn::RAW
        .iter()
        .filter(|c| c.is_required())
        .filter(|c| !names.iter().any(|n| n == c.name()))
        .map(|c| c.name())
        .collect();
    if !missing.is_empty() {
        bail!("header is missing required columns: {}", missing.join(", "));
    }

    Ok(names)
}

/// Engine-style name for an Arrow type, as printed by `describe_schema`.
pub fn type_label(dt: &DataType) -> &'static str {
    match dt {
        DataType::Utf8 | DataType::LargeUtf8 => "string",
        DataType::Int32 => "integer",
        DataType::Int64 => "long",
        DataType::Float64 => "double",
        DataType::Float32 => "float",
        DataType::Date32 => "date",
        DataType::Boolean => "boolean",
        DataType::Timestamp(_, _) => "timestamp",
        _ => "binary",
    }
}

/// Render a schema as a `root` tree, one `|-- name: type` line per field.
pub fn describe_schema(schema: &Schema) -> String {
    let mut out = String::from("root\n");
    for field in schema.fields() {
        let _ = writeln!(
            out,
            " |-- {}: {} (nullable = {})",
            field.name(),
            type_label(field.data_type()),
            field.is_nullable()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::Field;

    fn dataset_headers() -> Vec<String> {
        SalesColumn::RAW.iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn test_from_header_trims_and_matches() {
        assert_eq!(
            SalesColumn::from_header("  Units Sold "),
            Some(SalesColumn::UnitsSold)
        );
        assert_eq!(SalesColumn::from_header("units sold"), None);
        assert_eq!(
            SalesColumn::from_header("calculated_sales"),
            Some(SalesColumn::CalculatedSales)
        );
    }

    #[test]
    fn test_normalize_headers_accepts_dataset_header() {
        let names = normalize_headers(&dataset_headers()).unwrap();
        assert_eq!(names.len(), 13);
        assert_eq!(names[2], "Invoice Date");
    }

    #[test]
    fn test_normalize_headers_keeps_unknown_and_optional() {
        let mut headers: Vec<String> = SalesColumn::RAW
            .iter()
            .filter(|c| c.is_required())
            .map(|c| format!(" {} ", c.name()))
            .collect();
        headers.push("Notes".into());
        let names = normalize_headers(&headers).unwrap();
        assert_eq!(names.last().map(String::as_str), Some("Notes"));
        assert_eq!(names[0], "Retailer");
    }

    #[test]
    fn test_normalize_headers_reports_missing() {
        let headers: Vec<String> = dataset_headers()
            .into_iter()
            .filter(|h| h != "Total Sales" && h != "Region")
            .collect();
        let err = normalize_headers(&headers).unwrap_err().to_string();
        assert!(err.contains("Region"), "{err}");
        assert!(err.contains("Total Sales"), "{err}");
    }

    #[test]
    fn test_describe_schema() {
        let schema = Schema::new(vec![
            Field::new("Retailer", DataType::Utf8, true),
            Field::new("Units Sold", DataType::Int64, true),
            Field::new("Invoice Date", DataType::Date32, true),
        ]);
        assert_eq!(
            describe_schema(&schema),
            "root\n |-- Retailer: string (nullable = true)\n |-- Units Sold: long (nullable = true)\n |-- Invoice Date: date (nullable = true)\n"
        );
    }
}
