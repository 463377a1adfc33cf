use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the pagination cursor.
///
/// A run uses exactly one variant from start to finish.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Offset/limit paging over the source's natural row order.
    Default { offset: usize },

    /// Keyset paging over a strictly increasing auto-increment key.
    Pk { pk_col: String, id: u64 },
}

impl Cursor {
    pub fn start_offset() -> Self {
        Cursor::Default { offset: 0 }
    }

    pub fn start_pk(pk_col: &str) -> Self {
        Cursor::Pk {
            pk_col: pk_col.to_string(),
            id: 0,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Default { offset } => write!(f, "offset {offset}"),
            Cursor::Pk { pk_col, id } => write!(f, "{pk_col} > {id}"),
        }
    }
}
