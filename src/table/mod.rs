// src/table/mod.rs
use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef},
    datatypes::{Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::{ops::Range, sync::Arc};

pub mod aggregate;
pub mod filter;
pub mod sort;

pub use aggregate::{AggFunc, Aggregate, GroupedTable};
pub use filter::{Literal, Predicate};
pub use sort::SortKey;

/// An immutable, ordered set of rows sharing one schema.
///
/// Every operation hands back a new `Table`; the underlying Arrow buffers
/// are shared, never mutated.
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Build a table from named columns; every field is nullable.
    pub fn from_columns(columns: Vec<(String, ArrayRef)>) -> Result<Self> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, arr)| Field::new(name, arr.data_type().clone(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, arr)| arr).collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .context("building table from columns")?;
        Ok(Self { batch })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.batch
            .schema()
            .index_of(name)
            .with_context(|| format!("no column named {:?}", name))
    }

    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        let idx = self.index_of(name)?;
        Ok(self.batch.column(idx))
    }

    /// Name of the column at `index`; negative indices count from the end
    /// (`-1` is the last column).
    pub fn column_name_at(&self, index: isize) -> Result<String> {
        let n = self.num_columns() as isize;
        let resolved = if index < 0 { n + index } else { index };
        if resolved < 0 || resolved >= n {
            bail!("column index {} out of range for {} columns", index, n);
        }
        Ok(self.batch.schema().field(resolved as usize).name().clone())
    }

    /// Keep only the named columns, in the order given.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.index_of(n))
            .collect::<Result<Vec<_>>>()?;
        let batch = self
            .batch
            .project(&indices)
            .context("projecting columns")?;
        Ok(Table::new(batch))
    }

    /// Keep the columns at positions `range` (clamped to the column count).
    pub fn select_range(&self, range: Range<usize>) -> Result<Table> {
        let end = range.end.min(self.num_columns());
        let start = range.start.min(end);
        let indices: Vec<usize> = (start..end).collect();
        let batch = self
            .batch
            .project(&indices)
            .context("projecting column range")?;
        Ok(Table::new(batch))
    }

    /// Replace the column called `name`, keeping its position, or append it
    /// when no such column exists.
    pub fn with_column(&self, name: &str, values: ArrayRef) -> Result<Table> {
        if values.len() != self.num_rows() {
            bail!(
                "column {:?} has {} values, table has {} rows",
                name,
                values.len(),
                self.num_rows()
            );
        }
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut columns: Vec<ArrayRef> = self.batch.columns().to_vec();
        let field = Field::new(name, values.data_type().clone(), true);

        match schema.index_of(name) {
            Ok(idx) => {
                fields[idx] = field;
                columns[idx] = values;
            }
            Err(_) => {
                fields.push(field);
                columns.push(values);
            }
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .with_context(|| format!("adding column {:?}", name))?;
        Ok(Table::new(batch))
    }

    /// First `n` rows; asking for more rows than exist returns them all.
    pub fn limit(&self, n: usize) -> Table {
        let len = n.min(self.num_rows());
        Table::new(self.batch.slice(0, len))
    }

    pub fn filter(&self, predicate: &Predicate) -> Result<Table> {
        filter::filter_table(self, predicate)
    }

    pub fn order_by(&self, keys: &[SortKey]) -> Result<Table> {
        sort::sort_table(self, keys)
    }

    /// `order_by` followed by `limit`.
    pub fn top_n(&self, keys: &[SortKey], n: usize) -> Result<Table> {
        Ok(self.order_by(keys)?.limit(n))
    }

    pub fn group_by(&self, key: &str) -> Result<GroupedTable<'_>> {
        GroupedTable::new(self, key)
    }
}
