use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Array, Float64Array, Int32Array},
    compute::{
        cast,
        kernels::numeric::{mul, sub},
    },
    datatypes::DataType,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::convert::{numeric_values, text_to_float64};
use super::date_parser::{month_of, year_of};
use super::utils::parse_double;
use crate::schema::SalesColumn;
use crate::table::Table;

/// Year and month of `Invoice Date` as two Int32 columns.
pub fn add_invoice_parts(table: &Table) -> Result<Table> {
    let arr = table.column(SalesColumn::InvoiceDate.name())?;
    if arr.data_type() != &DataType::Date32 {
        bail!(
            "{} must be cleaned into dates before deriving its parts (found {})",
            SalesColumn::InvoiceDate,
            arr.data_type()
        );
    }
    let dates = arr
        .as_any()
        .downcast_ref::<Date32Array>()
        .context("expected a Date32 array")?;

    let years: Int32Array = dates.iter().map(|d| d.and_then(year_of)).collect();
    let months: Int32Array = dates.iter().map(|d| d.and_then(month_of)).collect();

    table
        .with_column(SalesColumn::YearOfInvoice.name(), Arc::new(years) as ArrayRef)?
        .with_column(SalesColumn::MonthOfInvoice.name(), Arc::new(months) as ArrayRef)
}

/// A column as Float64. Text is parsed like the cleaning step parses it;
/// anything unparseable becomes null.
fn as_float64(table: &Table, column: SalesColumn) -> Result<ArrayRef> {
    let arr = table.column(column.name())?;
    match arr.data_type() {
        DataType::Float64 => Ok(arr.clone()),
        DataType::Utf8 => text_to_float64(arr, parse_double),
        DataType::Int32 | DataType::Int64 | DataType::Float32 => {
            cast(arr.as_ref(), &DataType::Float64)
                .with_context(|| format!("casting {} to double", column))
        }
        other => bail!("{} is not numeric (found {})", column, other),
    }
}

/// `calculated_sales = Price per Unit × Units Sold`.
pub fn add_calculated_sales(table: &Table) -> Result<Table> {
    let price = as_float64(table, SalesColumn::PricePerUnit)?;
    let units = as_float64(table, SalesColumn::UnitsSold)?;
    let values = mul(&price, &units).context("computing calculated_sales")?;
    table.with_column(SalesColumn::CalculatedSales.name(), values)
}

/// `profit_check = Total Sales − Operating Profit`.
pub fn add_profit_check(table: &Table) -> Result<Table> {
    let sales = as_float64(table, SalesColumn::TotalSales)?;
    let profit = as_float64(table, SalesColumn::OperatingProfit)?;
    let values = sub(&sales, &profit).context("computing profit_check")?;
    table.with_column(SalesColumn::ProfitCheck.name(), values)
}

/// Append every derived column, in `SalesColumn::DERIVED` order.
pub fn derive_all(table: &Table) -> Result<Table> {
    let t = add_invoice_parts(table)?;
    let t = add_calculated_sales(&t)?;
    let t = add_profit_check(&t)?;
    debug!(columns = t.num_columns(), "derived columns added");
    Ok(t)
}

/// Rows where `calculated_sales` and `Total Sales` disagree by more than
/// `tolerance`, as `(calculated_sales, Total Sales, difference)`.
///
/// Rows with either side null are not reported.
pub fn sales_discrepancies(table: &Table, tolerance: f64) -> Result<Table> {
    let calc = numeric_values(table.column(SalesColumn::CalculatedSales.name())?)?;
    let total = numeric_values(table.column(SalesColumn::TotalSales.name())?)?;

    let mut rows = (Vec::new(), Vec::new(), Vec::new());
    for (c, t) in calc.into_iter().zip(total) {
        if let (Some(c), Some(t)) = (c, t) {
            let diff = c - t;
            if diff.abs() > tolerance {
                rows.0.push(c);
                rows.1.push(t);
                rows.2.push(diff);
            }
        }
    }
    info!(
        mismatches = rows.0.len(),
        tolerance, "compared calculated_sales with Total Sales"
    );

    Table::from_columns(vec![
        (
            SalesColumn::CalculatedSales.name().to_string(),
            Arc::new(Float64Array::from(rows.0)) as ArrayRef,
        ),
        (
            SalesColumn::TotalSales.name().to_string(),
            Arc::new(Float64Array::from(rows.1)) as ArrayRef,
        ),
        (
            "difference".to_string(),
            Arc::new(Float64Array::from(rows.2)) as ArrayRef,
        ),
    ])
}
