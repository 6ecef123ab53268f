use anyhow::{bail, Context, Result};
use arrow::{
    array::{
        Array, ArrayRef, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
        StringArray,
    },
    compute::cast,
    datatypes::DataType,
};
use chrono::NaiveDate;
use std::sync::Arc;

use super::date_parser::date_to_days;
use super::utils::parse_double;

/// Render any column as text, the same implicit conversion a string
/// function applies to a numeric or date column.
pub fn as_text(arr: &ArrayRef) -> Result<StringArray> {
    if let Some(sarr) = arr.as_any().downcast_ref::<StringArray>() {
        return Ok(sarr.clone());
    }
    let utf8 = cast(arr.as_ref(), &DataType::Utf8)
        .with_context(|| format!("casting {} column to text", arr.data_type()))?;
    let sarr = utf8
        .as_any()
        .downcast_ref::<StringArray>()
        .context("text cast did not produce a Utf8 array")?;
    Ok(sarr.clone())
}

/// Map every text value through `parse`; `None` (or a null input) becomes null.
pub fn text_to_int64<F>(arr: &ArrayRef, parse: F) -> Result<ArrayRef>
where
    F: Fn(&str) -> Option<i64>,
{
    let text = as_text(arr)?;
    let out: Int64Array = text.iter().map(|v| v.and_then(&parse)).collect();
    Ok(Arc::new(out) as ArrayRef)
}

/// Float64 counterpart of `text_to_int64`.
pub fn text_to_float64<F>(arr: &ArrayRef, parse: F) -> Result<ArrayRef>
where
    F: Fn(&str) -> Option<f64>,
{
    let text = as_text(arr)?;
    let out: Float64Array = text.iter().map(|v| v.and_then(&parse)).collect();
    Ok(Arc::new(out) as ArrayRef)
}

/// Date32 counterpart of `text_to_int64`.
pub fn text_to_date32<F>(arr: &ArrayRef, parse: F) -> Result<ArrayRef>
where
    F: Fn(&str) -> Option<NaiveDate>,
{
    let text = as_text(arr)?;
    let out: Date32Array = text
        .iter()
        .map(|v| v.and_then(&parse).map(date_to_days))
        .collect();
    Ok(Arc::new(out) as ArrayRef)
}

/// Read a column as optional doubles.
///
/// Integer and float columns widen; text is parsed (failure → null). Other
/// types are an error rather than a silent column of nulls.
pub fn numeric_values(arr: &ArrayRef) -> Result<Vec<Option<f64>>> {
    let any = arr.as_any();
    let values: Vec<Option<f64>> = match arr.data_type() {
        DataType::Int32 => downcast::<Int32Array>(any)?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Int64 => downcast::<Int64Array>(any)?
            .iter()
            .map(|v| v.map(|x| x as f64))
            .collect(),
        DataType::Float32 => downcast::<Float32Array>(any)?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Float64 => downcast::<Float64Array>(any)?.iter().collect(),
        DataType::Utf8 => downcast::<StringArray>(any)?
            .iter()
            .map(|v| v.and_then(parse_double))
            .collect(),
        other => bail!("column of type {} is not numeric", other),
    };
    Ok(values)
}

/// Read an integer column as optional i64; `None` when the column is not integral.
pub fn integer_values(arr: &ArrayRef) -> Option<Vec<Option<i64>>> {
    let any = arr.as_any();
    match arr.data_type() {
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| a.iter().map(|v| v.map(i64::from)).collect()),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| a.iter().collect()),
        _ => None,
    }
}

fn downcast<T: 'static>(any: &dyn std::any::Any) -> Result<&T> {
    any.downcast_ref::<T>()
        .with_context(|| format!("unexpected array type, wanted {}", std::any::type_name::<T>()))
}
