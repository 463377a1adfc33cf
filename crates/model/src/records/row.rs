use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    /// Positional access, used when the column order is known from the
    /// table descriptor.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.field_values.get(index).map(|f| &f.value)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.field_values.iter().map(|f| f.name.clone()).collect()
    }
}
