//! Deep merge of raw TOML tables.

use toml::{Table, Value};

/// Merge `overlay` into `base`, overlay winning.
///
/// Tables present on both sides merge recursively. Any other value, arrays
/// included, replaces the base value wholesale.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(overlay_table) => {
                if let Some(Value::Table(base_table)) = base.get_mut(&key) {
                    deep_merge(base_table, overlay_table);
                    continue;
                }
                base.insert(key, Value::Table(overlay_table));
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
