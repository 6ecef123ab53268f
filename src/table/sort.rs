use anyhow::{Context, Result};
use arrow::{
    array::UInt32Array,
    compute::{take, SortOptions},
    record_batch::RecordBatch,
    row::{RowConverter, SortField},
};

use super::Table;

/// One ordering key. Nulls always sort after every non-null value, in
/// both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Stable multi-key sort: rows that tie on every key keep their input order.
///
/// Keys are encoded with Arrow's row format; nulls sort last in both
/// directions.
pub fn sort_indices(table: &Table, keys: &[SortKey]) -> Result<Vec<u32>> {
    let mut fields = Vec::with_capacity(keys.len());
    let mut columns = Vec::with_capacity(keys.len());
    for key in keys {
        let arr = table.column(&key.column)?;
        fields.push(SortField::new_with_options(
            arr.data_type().clone(),
            SortOptions {
                descending: key.descending,
                nulls_first: false,
            },
        ));
        columns.push(arr.clone());
    }

    let converter = RowConverter::new(fields)
        .with_context(|| format!("cannot order by {:?}", keys))?;
    let rows = converter
        .convert_columns(&columns)
        .context("encoding sort keys")?;

    let mut indices: Vec<usize> = (0..table.num_rows()).collect();
    indices.sort_by(|&a, &b| rows.row(a).cmp(&rows.row(b)));

    indices
        .into_iter()
        .map(|i| u32::try_from(i).context("row index exceeds u32"))
        .collect()
}

/// Reorder every column of `table` by `keys`.
pub fn sort_table(table: &Table, keys: &[SortKey]) -> Result<Table> {
    if keys.is_empty() {
        return Ok(table.clone());
    }
    let indices = UInt32Array::from(sort_indices(table, keys)?);
    let columns = table
        .batch()
        .columns()
        .iter()
        .map(|col| take(col.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("reordering columns")?;
    let batch = RecordBatch::try_new(table.schema(), columns).context("rebuilding sorted table")?;
    Ok(Table::new(batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, Int32Array, StringArray};
    use std::sync::Arc;

    fn sample() -> Table {
        Table::from_columns(vec![
            (
                "id".into(),
                Arc::new(StringArray::from(vec!["a", "b", "c", "d", "e"])) as ArrayRef,
            ),
            (
                "Year of Invoice".into(),
                Arc::new(Int32Array::from(vec![
                    Some(2021),
                    Some(2020),
                    None,
                    Some(2020),
                    Some(2021),
                ])) as ArrayRef,
            ),
            (
                "Total Sales".into(),
                Arc::new(Float64Array::from(vec![
                    Some(10.0),
                    None,
                    Some(99.0),
                    Some(30.0),
                    Some(10.0),
                ])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    fn ids(t: &Table) -> Vec<String> {
        let arr = t.column("id").unwrap();
        let s = arr.as_any().downcast_ref::<StringArray>().unwrap();
        s.iter().map(|v| v.unwrap().to_string()).collect()
    }

    #[test]
    fn test_descending_puts_nulls_last() {
        let out = sample().order_by(&[SortKey::desc("Total Sales")]).unwrap();
        // a and e tie at 10.0 and keep input order
        assert_eq!(ids(&out), vec!["c", "d", "a", "e", "b"]);
    }

    #[test]
    fn test_ascending_puts_nulls_last() {
        let out = sample().order_by(&[SortKey::asc("Total Sales")]).unwrap();
        assert_eq!(ids(&out), vec!["a", "e", "d", "c", "b"]);
    }

    #[test]
    fn test_multi_key_year_asc_sales_desc() {
        let out = sample()
            .order_by(&[SortKey::asc("Year of Invoice"), SortKey::desc("Total Sales")])
            .unwrap();
        assert_eq!(ids(&out), vec!["d", "b", "a", "e", "c"]);
    }

    #[test]
    fn test_top_n_on_short_table_returns_all() {
        let t = sample();
        let top = t.top_n(&[SortKey::desc("Total Sales")], 10).unwrap();
        assert_eq!(top.num_rows(), 5);
        let top2 = t.top_n(&[SortKey::desc("Total Sales")], 2).unwrap();
        assert_eq!(ids(&top2), vec!["c", "d"]);
    }

    #[test]
    fn test_text_keys_and_empty_keys() {
        let t = sample();
        let out = t.order_by(&[SortKey::desc("id")]).unwrap();
        assert_eq!(ids(&out), vec!["e", "d", "c", "b", "a"]);
        let same = t.order_by(&[]).unwrap();
        assert_eq!(ids(&same), ids(&t));
    }

    #[test]
    fn test_date_keys_sort_chronologically() {
        let t = Table::from_columns(vec![
            (
                "id".into(),
                Arc::new(StringArray::from(vec!["late", "none", "early"])) as ArrayRef,
            ),
            (
                "Invoice Date".into(),
                Arc::new(Date32Array::from(vec![Some(18_700), None, Some(18_262)])) as ArrayRef,
            ),
        ])
        .unwrap();
        let asc = t.order_by(&[SortKey::asc("Invoice Date")]).unwrap();
        assert_eq!(ids(&asc), vec!["early", "late", "none"]);
        let desc = t.order_by(&[SortKey::desc("Invoice Date")]).unwrap();
        assert_eq!(ids(&desc), vec!["late", "early", "none"]);
    }

    #[test]
    fn test_unknown_key_column_is_an_error() {
        assert!(sample().order_by(&[SortKey::asc("Nope")]).is_err());
    }
}
