// src/process/mod.rs
use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, BooleanArray},
    compute::kernels::nullif::nullif,
};
use tracing::debug;

use crate::schema::SalesColumn;
use crate::table::Table;

pub mod convert;
pub mod date_parser;
pub mod derive;
pub mod utils;

/// How one raw column is turned into its typed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningRule {
    /// Remove thousands separators, parse as integer.
    SeparatedInt,
    /// Remove thousands separators, parse as double.
    SeparatedDouble,
    /// Remove `%`, parse as double, divide by 100.
    Percent,
    /// Parse into a calendar date.
    Date,
}

/// Rules applied by `clean_sales`, top to bottom.
pub const SALES_CLEANING: [(SalesColumn, CleaningRule); 5] = [
    (SalesColumn::UnitsSold, CleaningRule::SeparatedInt),
    (SalesColumn::TotalSales, CleaningRule::SeparatedDouble),
    (SalesColumn::OperatingProfit, CleaningRule::SeparatedInt),
    (SalesColumn::OperatingMargin, CleaningRule::Percent),
    (SalesColumn::InvoiceDate, CleaningRule::Date),
];

const THOUSANDS_SEPARATOR: [char; 1] = [','];
const PERCENT_SIGN: [char; 1] = ['%'];

impl CleaningRule {
    /// Apply the rule to a whole column; unparseable cells become null.
    pub fn apply(self, arr: &ArrayRef) -> Result<ArrayRef> {
        match self {
            CleaningRule::SeparatedInt => convert::text_to_int64(arr, |s| {
                utils::parse_int_lenient(&utils::strip_chars(s, &THOUSANDS_SEPARATOR))
            }),
            CleaningRule::SeparatedDouble => convert::text_to_float64(arr, |s| {
                utils::parse_double(&utils::strip_chars(s, &THOUSANDS_SEPARATOR))
            }),
            CleaningRule::Percent => convert::text_to_float64(arr, |s| {
                utils::parse_double(&utils::strip_chars(s, &PERCENT_SIGN)).map(|v| v / 100.0)
            }),
            CleaningRule::Date => convert::text_to_date32(arr, date_parser::parse_invoice_date),
        }
    }
}

/// Null every value of a numeric column outside `[lo, hi]`.
pub fn null_out_of_range(arr: &ArrayRef, lo: f64, hi: f64) -> Result<ArrayRef> {
    let outside: BooleanArray = convert::numeric_values(arr)?
        .into_iter()
        .map(|v| Some(v.is_some_and(|x| x < lo || x > hi)))
        .collect();
    nullif(arr.as_ref(), &outside).context("nulling out-of-range values")
}

/// Replace `column` with its cleaned form.
pub fn clean_column(table: &Table, column: SalesColumn, rule: CleaningRule) -> Result<Table> {
    let raw = table.column(column.name())?;
    let mut cleaned = rule
        .apply(raw)
        .with_context(|| format!("cleaning {}", column))?;
    if let Some((lo, hi)) = column.valid_range() {
        cleaned = null_out_of_range(&cleaned, lo, hi)
            .with_context(|| format!("range-checking {}", column))?;
    }
    debug!(
        column = column.name(),
        ?rule,
        nulls_before = raw.null_count(),
        nulls_after = cleaned.null_count(),
        "cleaned column"
    );
    table.with_column(column.name(), cleaned)
}

/// Run every rule in `SALES_CLEANING` over a freshly loaded table.
pub fn clean_sales(table: &Table) -> Result<Table> {
    SALES_CLEANING
        .iter()
        .try_fold(table.clone(), |t, &(column, rule)| clean_column(&t, column, rule))
}
