use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray},
    datatypes::DataType,
};
use std::sync::Arc;

use crate::process::utils::{parse_double, parse_int};

/// Pick the narrowest type every non-null value of a column fits.
///
/// Order tried: Int32, Int64, Float64, then Utf8. An all-null column is Utf8.
pub fn infer_column_type(values: &[Option<String>]) -> DataType {
    let mut present = values.iter().flatten().peekable();
    if present.peek().is_none() {
        return DataType::Utf8;
    }

    let mut fits_i32 = true;
    let mut fits_i64 = true;
    let mut fits_f64 = true;
    for v in present {
        if fits_i64 {
            match parse_int(v) {
                Some(n) => fits_i32 &= i32::try_from(n).is_ok(),
                None => {
                    fits_i64 = false;
                    fits_i32 = false;
                }
            }
        }
        if !fits_i64 && parse_double(v).is_none() {
            fits_f64 = false;
            break;
        }
    }

    if fits_i32 {
        DataType::Int32
    } else if fits_i64 {
        DataType::Int64
    } else if fits_f64 {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Materialise a column of raw cells as `dtype`; a cell that does not parse
/// is null.
pub fn build_column(values: &[Option<String>], dtype: &DataType) -> ArrayRef {
    match dtype {
        DataType::Int32 => {
            let arr: Int32Array = values
                .iter()
                .map(|v| {
                    v.as_deref()
                        .and_then(parse_int)
                        .and_then(|n| i32::try_from(n).ok())
                })
                .collect();
            Arc::new(arr) as ArrayRef
        }
        DataType::Int64 => {
            let arr: Int64Array = values
                .iter()
                .map(|v| v.as_deref().and_then(parse_int))
                .collect();
            Arc::new(arr) as ArrayRef
        }
        DataType::Float64 => {
            let arr: Float64Array = values
                .iter()
                .map(|v| v.as_deref().and_then(parse_double))
                .collect();
            Arc::new(arr) as ArrayRef
        }
        _ => {
            let arr: StringArray = values.iter().map(|v| v.as_deref()).collect();
            Arc::new(arr) as ArrayRef
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_infer_column_type() {
        assert_eq!(
            infer_column_type(&cells(&[Some("1"), None, Some(" 42 ")])),
            DataType::Int32
        );
        assert_eq!(
            infer_column_type(&cells(&[Some("1"), Some("3000000000")])),
            DataType::Int64
        );
        assert_eq!(
            infer_column_type(&cells(&[Some("1"), Some("2.5")])),
            DataType::Float64
        );
        assert_eq!(
            infer_column_type(&cells(&[Some("2.5"), Some("1,200")])),
            DataType::Utf8
        );
        assert_eq!(infer_column_type(&cells(&[None, None])), DataType::Utf8);
        assert_eq!(infer_column_type(&[]), DataType::Utf8);
    }

    #[test]
    fn test_build_column_nulls_bad_cells() {
        let arr = build_column(&cells(&[Some("7"), Some("x"), None]), &DataType::Int64);
        let arr = arr.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(arr.iter().collect::<Vec<_>>(), vec![Some(7), None, None]);

        let text = build_column(&cells(&[Some(" a "), None]), &DataType::Utf8);
        let text = text.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(text.value(0), " a ");
        assert!(text.is_null(1));
    }
}
