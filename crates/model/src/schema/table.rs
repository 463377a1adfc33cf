use serde::{Deserialize, Serialize};

/// A column as reported by the source's schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Zero-based position in `SELECT *` order.
    pub ordinal: usize,
    pub name: String,
    /// Raw source type, e.g. `int(10) unsigned` or `varchar(255)`.
    pub column_type: String,
    pub is_nullable: bool,
    pub is_key: bool,
}

/// Everything the exporter needs to know about the source table.
///
/// Built once per run from the schema queries and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub has_auto_increment: bool,
}

impl TableDescriptor {
    pub fn new(name: &str, columns: Vec<ColumnDescriptor>, has_auto_increment: bool) -> Self {
        TableDescriptor {
            name: name.to_string(),
            columns,
            has_auto_increment,
        }
    }

    /// The column used for keyset pagination, if the table declares one.
    pub fn key_column(&self) -> Option<&ColumnDescriptor> {
        if !self.has_auto_increment {
            return None;
        }
        self.columns.iter().find(|c| c.is_key)
    }
}
