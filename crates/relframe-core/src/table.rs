//! In-memory columnar tables and the provider trait the filter engine reads through.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl Value {
    /// Returns true for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Ordering between two non-null values of comparable kinds.
    ///
    /// Integers and floats compare numerically with each other, strings
    /// lexicographically. Booleans have no ordering here; they only support
    /// equality, which callers check separately.
    pub fn partial_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality with numeric coercion. `None` when either side is null.
    pub fn loose_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Boolean(a), Value::Boolean(b)) => Some(a == b),
            _ => Some(self.partial_order(other) == Some(Ordering::Equal)),
        }
    }

    /// Hashable key used to match relation columns during joins.
    ///
    /// Nulls never join. Integral floats share the integer encoding so that
    /// `1` and `1.0` land in the same bucket.
    pub fn join_key(&self) -> Option<JoinKey> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(JoinKey::Int(*i)),
            Value::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(JoinKey::Int(*f as i64))
                } else {
                    Some(JoinKey::Float(f.to_bits()))
                }
            }
            Value::String(s) => Some(JoinKey::Str(s.clone())),
            Value::Boolean(b) => Some(JoinKey::Bool(*b)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Hash key derived from a [`Value`] for equi-joins
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Int(i64),
    Float(u64),
    Str(String),
    Bool(bool),
}

/// Stable identity of a row: its position in the table it was first built as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

/// Read access the filter engine needs from a table implementation.
///
/// The engine only reads through this trait; it never mutates a table.
pub trait TableProvider: Sized {
    /// Column names in table order
    fn column_names(&self) -> Vec<&str>;

    /// Number of rows
    fn row_count(&self) -> usize;

    /// Stable identity of every row, in row order
    fn row_ids(&self) -> &[RowId];

    /// Value at a row position for a column, `None` if the column is unknown
    /// or the position is out of range
    fn value(&self, row: usize, column: &str) -> Option<&Value>;

    /// Keep the rows whose mask entry is true, preserving order and row ids
    fn select(&self, mask: &[bool]) -> Result<Self>;

    /// Keep only the named columns, in the given order.
    ///
    /// The engine never calls this: filter results already carry the home
    /// columns. It is here for callers narrowing a result.
    fn project(&self, columns: &[&str]) -> Result<Self>;

    /// Whether the table has a column with this name
    fn has_column(&self, name: &str) -> bool {
        self.column_names().iter().any(|c| *c == name)
    }
}

/// Column-major in-memory table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    data: Vec<Vec<Value>>,
    row_ids: Vec<RowId>,
}

impl Table {
    /// Build a table from row-major values.
    ///
    /// Column names must be unique and every row must have one value per column.
    pub fn new<S, R>(columns: &[S], rows: Vec<R>) -> Result<Self>
    where
        S: AsRef<str>,
        R: Into<Vec<Value>>,
    {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        check_unique(&columns)?;

        let mut data = vec![Vec::with_capacity(rows.len()); columns.len()];
        for (i, row) in rows.into_iter().enumerate() {
            let row: Vec<Value> = row.into();
            if row.len() != columns.len() {
                return Err(Error::InvalidTable(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
            for (col, value) in data.iter_mut().zip(row) {
                col.push(value);
            }
        }

        let row_count = data.first().map_or(0, Vec::len);
        Ok(Self {
            columns,
            data,
            row_ids: (0..row_count as u64).map(RowId).collect(),
        })
    }

    /// Build a table from `(name, values)` column pairs of equal length.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Value>)>) -> Result<Self> {
        let (names, data): (Vec<String>, Vec<Vec<Value>>) =
            columns.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        check_unique(&names)?;

        let row_count = data.first().map_or(0, Vec::len);
        if let Some(pos) = data.iter().position(|c| c.len() != row_count) {
            return Err(Error::InvalidTable(format!(
                "column '{}' has {} values, expected {}",
                names[pos],
                data[pos].len(),
                row_count
            )));
        }

        Ok(Self {
            columns: names,
            data,
            row_ids: (0..row_count as u64).map(RowId).collect(),
        })
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All values of a column
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.column_index(name).map(|i| self.data[i].as_slice())
    }

    /// Values of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_ids.len() {
            return None;
        }
        Some(self.data.iter().map(|col| &col[index]).collect())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.row_ids.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn check_unique(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for c in columns {
        if !seen.insert(c.as_str()) {
            return Err(Error::InvalidTable(format!("duplicate column '{}'", c)));
        }
    }
    Ok(())
}

impl TableProvider for Table {
    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    fn row_count(&self) -> usize {
        self.row_ids.len()
    }

    fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.column_index(column)
            .and_then(|i| self.data[i].get(row))
    }

    fn select(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.row_count() {
            return Err(Error::InvalidTable(format!(
                "mask has {} entries for {} rows",
                mask.len(),
                self.row_count()
            )));
        }

        let keep = |values: &Vec<Value>| -> Vec<Value> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, m)| **m)
                .map(|(v, _)| v.clone())
                .collect()
        };

        Ok(Self {
            columns: self.columns.clone(),
            data: self.data.iter().map(keep).collect(),
            row_ids: self
                .row_ids
                .iter()
                .zip(mask)
                .filter(|(_, m)| **m)
                .map(|(id, _)| *id)
                .collect(),
        })
    }

    fn project(&self, columns: &[&str]) -> Result<Self> {
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = self
                .column_index(name)
                .ok_or_else(|| Error::InvalidTable(format!("no column '{}' to project", name)))?;
            names.push(name.to_string());
            data.push(self.data[idx].clone());
        }
        check_unique(&names)?;

        Ok(Self {
            columns: names,
            data,
            row_ids: self.row_ids.clone(),
        })
    }

    fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }
}
