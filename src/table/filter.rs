use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, BooleanArray, StringArray},
    compute::filter_record_batch,
    datatypes::DataType,
};
use regex::Regex;

use super::Table;
use crate::process::convert::numeric_values;

/// A comparison value on the right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Literal {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(v) => Some(*v as f64),
            Literal::Float(v) => Some(*v),
            Literal::Str(_) => None,
        }
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Str(v.to_string())
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

/// Row predicate. A null cell never satisfies any comparison.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq { column: String, value: Literal },
    Gt { column: String, value: Literal },
    /// SQL `LIKE`: `%` any run, `_` one char, case sensitive.
    Like { column: String, pattern: String },
    And(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Predicate::Gt {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// Evaluate into a mask with one entry per row (`false` where null).
    pub fn evaluate(&self, table: &Table) -> Result<Vec<bool>> {
        match self {
            Predicate::Eq { column, value } => {
                let arr = table.column(column)?;
                match (value, arr.data_type()) {
                    (Literal::Str(want), DataType::Utf8) => {
                        let sarr = arr
                            .as_any()
                            .downcast_ref::<StringArray>()
                            .context("expected a Utf8 array")?;
                        Ok(sarr.iter().map(|v| v == Some(want.as_str())).collect())
                    }
                    (Literal::Str(_), other) => {
                        bail!("cannot compare {} column {:?} with text", other, column)
                    }
                    (lit, _) => {
                        let want = lit.as_f64().unwrap_or(f64::NAN);
                        Ok(numeric_values(arr)?
                            .into_iter()
                            .map(|v| v == Some(want))
                            .collect())
                    }
                }
            }
            Predicate::Gt { column, value } => {
                let Some(threshold) = value.as_f64() else {
                    bail!("threshold on {:?} must be numeric", column);
                };
                let arr = table.column(column)?;
                Ok(numeric_values(arr)?
                    .into_iter()
                    .map(|v| matches!(v, Some(x) if x > threshold))
                    .collect())
            }
            Predicate::Like { column, pattern } => {
                let arr = table.column(column)?;
                let sarr = arr
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .with_context(|| format!("LIKE needs a text column, {:?} is not", column))?;
                let re = like_to_regex(pattern)?;
                Ok(sarr
                    .iter()
                    .map(|v| v.is_some_and(|s| re.is_match(s)))
                    .collect())
            }
            Predicate::And(a, b) => {
                let left = a.evaluate(table)?;
                let right = b.evaluate(table)?;
                Ok(left.into_iter().zip(right).map(|(l, r)| l && r).collect())
            }
        }
    }
}

/// Translate a `LIKE` pattern into an anchored regex.
pub fn like_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::from("(?s)^");
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '%' | '_' => {
                re.push_str(&regex::escape(&literal));
                literal.clear();
                re.push_str(if c == '%' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    re.push_str(&regex::escape(&literal));
    re.push('$');
    Regex::new(&re).with_context(|| format!("compiling LIKE pattern {:?}", pattern))
}

/// Keep the rows matching `predicate`, in their original order.
pub fn filter_table(table: &Table, predicate: &Predicate) -> Result<Table> {
    let mask = BooleanArray::from(predicate.evaluate(table)?);
    let batch = filter_record_batch(table.batch(), &mask).context("applying row filter")?;
    tracing::debug!(
        rows_in = table.num_rows(),
        rows_out = batch.num_rows(),
        "filtered"
    );
    Ok(Table::new(batch))
}
