use crate::model::{RowKey, Value, WideTable};

/// Builds a [`WideTable`] from keyed field lists with current-row merging.
///
/// Consecutive pushes with the same key merge into one row (a later value
/// for a column overwrites the earlier one). A different key flushes the
/// current row. [`PivotBuilder::finish`] flushes the last row and removes
/// exact duplicate rows.
#[derive(Debug, Default)]
pub struct PivotBuilder {
    table: WideTable,
    current: Option<(RowKey, Vec<(String, Value)>)>,
}

impl PivotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<I>(&mut self, key: RowKey, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some((current_key, row)) = &mut self.current {
            if *current_key == key {
                row.extend(fields);
                return;
            }
        }
        self.flush();
        self.current = Some((key, fields.into_iter().collect()));
    }

    fn flush(&mut self) {
        if let Some((key, row)) = self.current.take() {
            self.table.push_row(key, row);
        }
    }

    pub fn finish(mut self) -> WideTable {
        self.flush();
        self.table.dedup_rows();
        self.table
    }
}
