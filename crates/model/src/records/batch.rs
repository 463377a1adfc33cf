use crate::{pagination::cursor::Cursor, records::row::RowData};

/// One page of rows read from the source table.
///
/// A batch is handed to the writer by value and dropped afterwards; nothing
/// keeps a reference to it once it has been persisted.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Zero-based position of the batch within the run.
    pub index: usize,
    pub columns: Vec<String>,
    pub rows: Vec<RowData>,
    /// Cursor used to fetch this batch.
    pub cursor: Cursor,
    /// Cursor the next fetch resumes from.
    pub next: Cursor,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
