use model::pagination::cursor::Cursor;
use planner::query::offsets::{DefaultOffset, OffsetStrategy};
use std::sync::Arc;

/// One page request: which table, where to start and how many rows.
#[derive(Debug, Clone)]
pub struct FetchRowsRequest {
    pub table: String,
    pub limit: usize,
    pub cursor: Cursor,
    pub strategy: Arc<dyn OffsetStrategy>,
}

pub struct FetchRowsRequestBuilder {
    table: String,
    limit: usize,
    cursor: Option<Cursor>,
    strategy: Arc<dyn OffsetStrategy>,
}

impl FetchRowsRequestBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        FetchRowsRequestBuilder {
            table: table.into(),
            limit: 0,
            cursor: None,
            strategy: Arc::new(DefaultOffset),
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn OffsetStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Without an explicit cursor the request starts at the strategy's first page.
    pub fn build(self) -> FetchRowsRequest {
        let cursor = self
            .cursor
            .unwrap_or_else(|| self.strategy.initial_cursor());
        FetchRowsRequest {
            table: self.table,
            limit: self.limit,
            cursor,
            strategy: self.strategy,
        }
    }
}
