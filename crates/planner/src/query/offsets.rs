use crate::query::{
    ast::{
        common::OrderDir,
        expr::{BinaryOp, BinaryOperator, Expr},
    },
    builder::select::{FromState, SelectBuilder},
    ident, value,
};
use model::{
    core::value::Value, pagination::cursor::Cursor, records::row::RowData,
    schema::table::TableDescriptor,
};
use std::{fmt, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CursorError {
    /// The pagination key of a fetched row is not a non-negative integer.
    #[error("Invalid value for key column `{column}`: {value}")]
    InvalidKey { column: String, value: String },
}

/// Decides how consecutive pages of a table are selected.
///
/// A strategy owns the cursor arithmetic: it renders the clauses for the
/// page starting at a cursor and derives the cursor of the following page
/// from the rows that were actually returned.
pub trait OffsetStrategy: Send + Sync + fmt::Debug {
    /// Cursor for the first page.
    fn initial_cursor(&self) -> Cursor;

    /// Applies the pagination logic (WHERE, ORDER BY, LIMIT, OFFSET) to a SelectBuilder.
    fn apply_to_builder(
        &self,
        builder: SelectBuilder<FromState>,
        cursor: &Cursor,
        limit: usize,
    ) -> SelectBuilder<FromState>;

    /// Generates the next cursor from the page fetched at `current`.
    fn next_cursor(
        &self,
        current: &Cursor,
        rows: &[RowData],
        limit: usize,
    ) -> Result<Cursor, CursorError>;

    fn name(&self) -> &'static str;
}

/// Keyset pagination over an auto-increment column: `WHERE pk > ? ORDER BY pk`.
#[derive(Debug, Clone)]
pub struct PkOffset {
    pub pk: String,
}

/// Plain `LIMIT ? OFFSET ?` pagination.
///
/// No ordering is requested, so page boundaries are only as stable as the
/// source's natural row order.
#[derive(Debug, Clone, Default)]
pub struct DefaultOffset;

impl OffsetStrategy for PkOffset {
    fn initial_cursor(&self) -> Cursor {
        Cursor::start_pk(&self.pk)
    }

    fn apply_to_builder(
        &self,
        mut builder: SelectBuilder<FromState>,
        cursor: &Cursor,
        limit: usize,
    ) -> SelectBuilder<FromState> {
        if let Cursor::Pk { id, .. } = cursor {
            // WHERE pk > ?
            builder = builder.and_where(Expr::BinaryOp(Box::new(BinaryOp {
                left: ident(&self.pk),
                op: BinaryOperator::Gt,
                right: value(Value::Uint(*id)),
            })));
        }

        // ORDER BY pk ASC LIMIT ?
        builder
            .order_by(ident(&self.pk), Some(OrderDir::Asc))
            .limit(value(Value::Uint(limit as u64)))
    }

    fn next_cursor(
        &self,
        current: &Cursor,
        rows: &[RowData],
        _limit: usize,
    ) -> Result<Cursor, CursorError> {
        let mut max_id: Option<u64> = None;
        for row in rows {
            let key = row.get_value(&self.pk);
            let id = key.as_u64().ok_or_else(|| CursorError::InvalidKey {
                column: self.pk.clone(),
                value: key.to_string(),
            })?;
            max_id = Some(max_id.map_or(id, |m| m.max(id)));
        }

        Ok(match max_id {
            Some(id) => Cursor::Pk {
                pk_col: self.pk.clone(),
                id,
            },
            None => current.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "pk"
    }
}

impl OffsetStrategy for DefaultOffset {
    fn initial_cursor(&self) -> Cursor {
        Cursor::start_offset()
    }

    fn apply_to_builder(
        &self,
        builder: SelectBuilder<FromState>,
        cursor: &Cursor,
        limit: usize,
    ) -> SelectBuilder<FromState> {
        let offset = match cursor {
            Cursor::Default { offset } => *offset,
            Cursor::Pk { .. } => 0,
        };

        builder
            .limit(value(Value::Uint(limit as u64)))
            .offset(value(Value::Uint(offset as u64)))
    }

    fn next_cursor(
        &self,
        current: &Cursor,
        _rows: &[RowData],
        limit: usize,
    ) -> Result<Cursor, CursorError> {
        let offset = match current {
            Cursor::Default { offset } => *offset,
            Cursor::Pk { .. } => 0,
        };
        Ok(Cursor::Default {
            offset: offset + limit,
        })
    }

    fn name(&self) -> &'static str {
        "offset"
    }
}

/// Picks the strategy for a table: keyset paging when it has an
/// auto-increment key, offset paging otherwise.
pub fn strategy_for(table: &TableDescriptor) -> Arc<dyn OffsetStrategy> {
    match table.key_column() {
        Some(key) => Arc::new(PkOffset {
            pk: key.name.clone(),
        }),
        None => Arc::new(DefaultOffset),
    }
}
