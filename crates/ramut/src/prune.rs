//! Schema pruner for the memory table.
//!
//! Top OOM-priority categories swing too much under normal load to say
//! anything about leaks, and the cached tail is reclaimed at will. The pruner
//! removes the former by name and cuts the table at the first light-tail
//! boundary.

use crate::model::WideTable;

pub const HEAVY_CATEGORIES: [&str; 7] = [
    "Native",
    "System",
    "Persistent",
    "PersistentService",
    "Foreground",
    "Visible",
    "Perceptible",
];

pub const LIGHT_BOUNDARIES: [&str; 5] = [
    "PerceptibleMedium",
    "AServices",
    "BServices",
    "Cached",
    "Previous",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPruner {
    heavy: Vec<String>,
    light_boundaries: Vec<String>,
}

impl Default for SchemaPruner {
    fn default() -> Self {
        Self::new(
            HEAVY_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            LIGHT_BOUNDARIES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl SchemaPruner {
    pub fn new(heavy: Vec<String>, light_boundaries: Vec<String>) -> Self {
        Self {
            heavy,
            light_boundaries,
        }
    }

    /// Drop every heavy category that is present.
    pub fn drop_heavy(&self, table: &WideTable) -> WideTable {
        table.drop_columns(&self.heavy)
    }

    /// Drop the first light boundary (in list order) that is present, and
    /// every column after it.
    pub fn truncate_light_tail(&self, table: &WideTable) -> WideTable {
        table.truncate_from_first(&self.light_boundaries)
    }

    /// Both steps. Idempotent; a table with none of the labels comes back
    /// unchanged.
    pub fn prune(&self, table: &WideTable) -> WideTable {
        self.truncate_light_tail(&self.drop_heavy(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RowKey, Value};

    fn table(columns: &[&str]) -> WideTable {
        let mut table = WideTable::new();
        table.push_row(
            RowKey::Source("dump".into()),
            columns
                .iter()
                .enumerate()
                .map(|(i, c)| (c.to_string(), Value::Int(i as i64))),
        );
        table
    }

    fn names(table: &WideTable) -> Vec<&str> {
        table.column_names().collect()
    }

    #[test]
    fn test_prune_typical_dump() {
        let dump = table(&[
            "Native",
            "System",
            "Persistent",
            "Foreground",
            "Visible",
            "Perceptible",
            "PerceptibleLow",
            "Backup",
            "AServices",
            "Previous",
            "BServices",
            "Cached",
        ]);
        let pruned = SchemaPruner::default().prune(&dump);
        assert_eq!(names(&pruned), vec!["PerceptibleLow", "Backup"]);
        assert_eq!(pruned.get(0, "Backup"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_boundary_list_order_beats_column_order() {
        let dump = table(&["a", "Cached", "b", "PerceptibleMedium", "c"]);
        let pruned = SchemaPruner::default().prune(&dump);
        assert_eq!(names(&pruned), vec!["a", "Cached", "b"]);
    }

    #[test]
    fn test_absent_labels_are_a_no_op() {
        let dump = table(&["surfaceflinger", "system_server"]);
        assert_eq!(SchemaPruner::default().prune(&dump), dump);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let dump = table(&["Native", "x", "Cached", "y", "Previous"]);
        let pruner = SchemaPruner::default();
        let once = pruner.prune(&dump);
        assert_eq!(pruner.prune(&once), once);
        assert_eq!(names(&once), vec!["x"]);
    }

    #[test]
    fn test_custom_lists() {
        let dump = table(&["keep", "drop", "cut", "tail"]);
        let pruner = SchemaPruner::new(vec!["drop".into()], vec!["cut".into()]);
        assert_eq!(names(&pruner.prune(&dump)), vec!["keep"]);
    }
}
