//! WideTable — key-indexed rows over an insertion-ordered set of columns.
//!
//! Storage is column-major: `columns[i].cells[r]` is the value of column `i`
//! in row `r`, and `keys[r]` is that row's key. Column order is the order in
//! which names were first seen, so positional operations ("find the first
//! boundary label, drop everything after it") are expressed as methods here
//! instead of index arithmetic at every call site.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Row key. `Time` keys order chronologically. `Source` keys order
/// naturally, digit runs by value, so `dump_2` precedes `dump_10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKey {
    Time(NaiveDateTime),
    /// File identity, used for per-file snapshots
    Source(String),
}

impl Ord for RowKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RowKey::Time(a), RowKey::Time(b)) => a.cmp(b),
            (RowKey::Source(a), RowKey::Source(b)) => natural_cmp(a, b),
            (RowKey::Time(_), RowKey::Source(_)) => Ordering::Less,
            (RowKey::Source(_), RowKey::Time(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for RowKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Time(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            RowKey::Source(source) => f.write_str(source),
        }
    }
}

/// Compare with ASCII digit runs taken as numbers. Equal-valued runs such
/// as `01` and `1` fall back to plain string order, keeping this consistent
/// with `Eq`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut x, mut y) = (a.as_bytes(), b.as_bytes());
    loop {
        match (x.first(), y.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(c), Some(d)) if c.is_ascii_digit() && d.is_ascii_digit() => {
                let (run_x, rest_x) = split_digits(x);
                let (run_y, rest_y) = split_digits(y);
                let (run_x, run_y) = (trim_zeros(run_x), trim_zeros(run_y));
                let ord = run_x.len().cmp(&run_y.len()).then_with(|| run_x.cmp(run_y));
                if ord != Ordering::Equal {
                    return ord;
                }
                x = rest_x;
                y = rest_y;
            }
            (Some(c), Some(d)) => {
                if c != d {
                    return c.cmp(d);
                }
                x = &x[1..];
                y = &y[1..];
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let n = s.iter().take_while(|b| b.is_ascii_digit()).count();
    s.split_at(n)
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let n = digits.iter().take_while(|&&b| b == b'0').count();
    &digits[n..]
}

/// Cell value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }
}

// Floats compare by bit pattern so that rows can be hashed for dedup.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(Value::Int).unwrap_or(Value::Float(v as f64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    cells: Vec<Option<Value>>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric cells in row order, missing and non-numeric cells dropped.
    pub fn numeric(&self) -> Vec<f64> {
        self.cells
            .iter()
            .filter_map(|c| c.as_ref().and_then(Value::as_f64))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    keys: Vec<RowKey>,
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
}

impl WideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name)
            .and_then(|c| c.cells.get(row))
            .and_then(Option::as_ref)
    }

    /// Append a row. New column names are added at the end, earlier rows get
    /// a missing cell for them. A name repeated within `fields` keeps the
    /// last value.
    pub fn push_row<I>(&mut self, key: RowKey, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let row = self.keys.len();
        self.keys.push(key);
        for column in &mut self.columns {
            column.cells.push(None);
        }
        for (name, value) in fields {
            let idx = match self.positions.get(&name) {
                Some(idx) => *idx,
                None => {
                    let mut cells = Vec::with_capacity(row + 1);
                    cells.resize(row + 1, None);
                    self.columns.push(Column {
                        name: name.clone(),
                        cells,
                    });
                    self.positions.insert(name, self.columns.len() - 1);
                    self.columns.len() - 1
                }
            };
            self.columns[idx].cells[row] = Some(value);
        }
    }

    /// Stable sort of rows by key.
    pub fn sort_by_key(&mut self) {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by(|a, b| self.keys[*a].cmp(&self.keys[*b]));
        self.apply_row_order(&order);
    }

    /// Remove rows equal (key and every cell) to an earlier row.
    pub fn dedup_rows(&mut self) {
        let mut seen = HashSet::with_capacity(self.keys.len());
        let mut keep = Vec::with_capacity(self.keys.len());
        for row in 0..self.keys.len() {
            let cells: Vec<Option<Value>> = self
                .columns
                .iter()
                .map(|c| c.cells[row].clone())
                .collect();
            if seen.insert((self.keys[row].clone(), cells)) {
                keep.push(row);
            }
        }
        if keep.len() != self.keys.len() {
            self.apply_row_order(&keep);
        }
    }

    /// Copy of the table without the named columns. Absent names are ignored.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> WideTable {
        let drop: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        self.retain_columns(|_, column| !drop.contains(column.name.as_str()))
    }

    /// Copy of the table cut at a boundary column.
    ///
    /// `boundaries` are tried in order; the first one present in the table
    /// gives the cut index, and that column plus every column after it is
    /// dropped. Returns an unchanged copy when no boundary is present.
    pub fn truncate_from_first<S: AsRef<str>>(&self, boundaries: &[S]) -> WideTable {
        match boundaries.iter().find_map(|b| self.position(b.as_ref())) {
            Some(cut) => self.retain_columns(|idx, _| idx < cut),
            None => self.clone(),
        }
    }

    fn retain_columns(&self, mut keep: impl FnMut(usize, &Column) -> bool) -> WideTable {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(idx, c)| keep(*idx, *c))
            .map(|(_, c)| c.clone())
            .collect();
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        WideTable {
            keys: self.keys.clone(),
            columns,
            positions,
        }
    }

    fn apply_row_order(&mut self, order: &[usize]) {
        self.keys = order.iter().map(|i| self.keys[*i].clone()).collect();
        for column in &mut self.columns {
            column.cells = order.iter().map(|i| column.cells[*i].clone()).collect();
        }
    }
}

#[derive(Serialize)]
struct SerializedRow<'a> {
    key: &'a RowKey,
    values: Vec<Option<&'a Value>>,
}

impl Serialize for WideTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns: Vec<&str> = self.column_names().collect();
        let rows: Vec<SerializedRow<'_>> = (0..self.keys.len())
            .map(|r| SerializedRow {
                key: &self.keys[r],
                values: self.columns.iter().map(|c| c.cells[r].as_ref()).collect(),
            })
            .collect();
        let mut state = serializer.serialize_struct("WideTable", 2)?;
        state.serialize_field("columns", &columns)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
