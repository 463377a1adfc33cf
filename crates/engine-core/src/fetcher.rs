use connectors::sql::base::{
    adapter::SqlAdapter, error::DbError, requests::FetchRowsRequestBuilder,
};
use futures::{Stream, stream};
use model::{pagination::cursor::Cursor, records::batch::Batch, schema::table::TableDescriptor};
use planner::query::offsets::{OffsetStrategy, strategy_for};
use std::{sync::Arc, time::Instant};
use tracing::info;

use crate::metrics::rows_per_second;

/// Pulls a table page by page.
///
/// The sequence is finite and cannot be restarted: once a page comes back
/// empty, or a fetch fails, every further call yields `Ok(None)`.
pub struct BatchFetcher<'a> {
    adapter: &'a mut dyn SqlAdapter,
    table: String,
    batch_size: usize,
    strategy: Arc<dyn OffsetStrategy>,
    cursor: Cursor,
    next_index: usize,
    done: bool,
}

impl<'a> BatchFetcher<'a> {
    /// Picks keyset or offset paging from the descriptor; the choice holds for the whole run.
    pub fn new(
        adapter: &'a mut dyn SqlAdapter,
        table: &TableDescriptor,
        batch_size: usize,
    ) -> Self {
        let strategy = strategy_for(table);
        let cursor = strategy.initial_cursor();
        BatchFetcher {
            adapter,
            table: table.name.clone(),
            batch_size,
            strategy,
            cursor,
            next_index: 0,
            done: false,
        }
    }

    pub fn strategy(&self) -> &dyn OffsetStrategy {
        self.strategy.as_ref()
    }

    /// Where the next fetch would start.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub async fn next_batch(&mut self) -> Result<Option<Batch>, DbError> {
        if self.done {
            return Ok(None);
        }

        match self.fetch_page().await {
            Ok(Some(batch)) => Ok(Some(batch)),
            Ok(None) => {
                self.done = true;
                info!(
                    "No more rows in `{}` after {} batches",
                    self.table, self.next_index
                );
                Ok(None)
            }
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<Option<Batch>, DbError> {
        let started = Instant::now();
        let request = FetchRowsRequestBuilder::new(self.table.clone())
            .limit(self.batch_size)
            .cursor(self.cursor.clone())
            .strategy(self.strategy.clone())
            .build();

        let rows = self.adapter.fetch_rows(&request).await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let next = self
            .strategy
            .next_cursor(&self.cursor, &rows, self.batch_size)?;
        let elapsed = started.elapsed();

        info!(
            table = %self.table,
            batch = self.next_index,
            rows = rows.len(),
            cursor = %self.cursor,
            next = %next,
            elapsed_ms = elapsed.as_millis() as u64,
            rows_per_sec = rows_per_second(rows.len(), elapsed).round(),
            "Fetched batch"
        );

        let batch = Batch {
            index: self.next_index,
            columns: rows[0].column_names(),
            rows,
            cursor: std::mem::replace(&mut self.cursor, next.clone()),
            next,
        };
        self.next_index += 1;

        Ok(Some(batch))
    }

    /// Stream view over the same sequence.
    pub fn into_stream(self) -> impl Stream<Item = Result<Batch, DbError>> + 'a {
        stream::try_unfold(self, |mut fetcher| async move {
            let batch = fetcher.next_batch().await?;
            Ok::<_, DbError>(batch.map(|batch| (batch, fetcher)))
        })
    }
}
