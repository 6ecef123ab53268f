use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray},
    datatypes::DataType,
};
use std::{collections::HashMap, sync::Arc};

use super::Table;
use crate::process::convert::{integer_values, numeric_values};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Sum,
    Avg,
    /// `count(*)`: every row, nulls included.
    Count,
}

/// One output column of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub func: AggFunc,
    pub column: Option<String>,
    pub alias: String,
}

impl Aggregate {
    pub fn sum(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Sum,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }

    pub fn avg(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Avg,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }

    pub fn count_all(alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Count,
            column: None,
            alias: alias.into(),
        }
    }
}

/// A grouping key value; a null key is `None` and forms its own group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyValue {
    Text(String),
    Int(i64),
}

/// Rows of a table partitioned by one key column, groups in order of first
/// appearance.
pub struct GroupedTable<'a> {
    table: &'a Table,
    key: String,
    key_type: DataType,
    keys: Vec<Option<KeyValue>>,
    /// row indices per group
    groups: Vec<Vec<usize>>,
}

impl<'a> GroupedTable<'a> {
    pub fn new(table: &'a Table, key: &str) -> Result<Self> {
        let arr = table.column(key)?;
        let row_keys: Vec<Option<KeyValue>> = match arr.data_type() {
            DataType::Utf8 => arr
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected a Utf8 array")?
                .iter()
                .map(|v| v.map(|s| KeyValue::Text(s.to_string())))
                .collect(),
            DataType::Int32 | DataType::Int64 => integer_values(arr)
                .context("expected an integer array")?
                .into_iter()
                .map(|v| v.map(KeyValue::Int))
                .collect(),
            other => bail!("cannot group by a {} column", other),
        };

        let mut slot: HashMap<Option<KeyValue>, usize> = HashMap::new();
        let mut keys = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (row, k) in row_keys.into_iter().enumerate() {
            let idx = *slot.entry(k.clone()).or_insert_with(|| {
                keys.push(k);
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[idx].push(row);
        }

        Ok(Self {
            table,
            key: key.to_string(),
            key_type: arr.data_type().clone(),
            keys,
            groups,
        })
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// One row per group: the key column followed by each aggregate alias.
    pub fn agg(&self, aggregates: &[Aggregate]) -> Result<Table> {
        let mut columns: Vec<(String, ArrayRef)> = Vec::with_capacity(aggregates.len() + 1);
        columns.push((self.key.clone(), self.key_column()));
        for a in aggregates {
            let values = self
                .reduce(a)
                .with_context(|| format!("computing {:?}", a.alias))?;
            columns.push((a.alias.clone(), values));
        }
        Table::from_columns(columns)
    }

    fn key_column(&self) -> ArrayRef {
        match self.key_type {
            DataType::Utf8 => {
                let arr: StringArray = self
                    .keys
                    .iter()
                    .map(|k| match k {
                        Some(KeyValue::Text(s)) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                Arc::new(arr) as ArrayRef
            }
            DataType::Int32 => {
                let arr: Int32Array = self
                    .keys
                    .iter()
                    .map(|k| match k {
                        Some(KeyValue::Int(v)) => i32::try_from(*v).ok(),
                        _ => None,
                    })
                    .collect();
                Arc::new(arr) as ArrayRef
            }
            _ => {
                let arr: Int64Array = self
                    .keys
                    .iter()
                    .map(|k| match k {
                        Some(KeyValue::Int(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();
                Arc::new(arr) as ArrayRef
            }
        }
    }

    fn reduce(&self, agg: &Aggregate) -> Result<ArrayRef> {
        if agg.func == AggFunc::Count {
            let counts: Vec<i64> = self.groups.iter().map(|g| g.len() as i64).collect();
            return Ok(Arc::new(Int64Array::from(counts)) as ArrayRef);
        }
        let name = agg
            .column
            .as_deref()
            .with_context(|| format!("{:?} needs an input column", agg.func))?;
        let arr = self.table.column(name)?;

        match (agg.func, integer_values(arr)) {
            (AggFunc::Sum, Some(ints)) => {
                let sums = self
                    .groups
                    .iter()
                    .map(|rows| sum_ints(rows.iter().map(|&r| ints[r])))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(Int64Array::from(sums)) as ArrayRef)
            }
            (func, _) => {
                let values = numeric_values(arr)?;
                let out: Float64Array = self
                    .groups
                    .iter()
                    .map(|rows| {
                        let present: Vec<f64> = rows.iter().filter_map(|&r| values[r]).collect();
                        if present.is_empty() {
                            return None;
                        }
                        let total: f64 = present.iter().sum();
                        match func {
                            AggFunc::Avg => Some(total / present.len() as f64),
                            _ => Some(total),
                        }
                    })
                    .collect();
                Ok(Arc::new(out) as ArrayRef)
            }
        }
    }
}

/// Sum ignoring nulls; all-null input is null, overflow is an error.
fn sum_ints(values: impl Iterator<Item = Option<i64>>) -> Result<Option<i64>> {
    let mut total: Option<i64> = None;
    for v in values.flatten() {
        let acc = total.unwrap_or(0);
        total = Some(acc.checked_add(v).context("integer sum overflowed")?);
    }
    Ok(total)
}
