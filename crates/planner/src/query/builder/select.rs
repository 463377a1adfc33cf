//! Provides a type-safe, fluent builder for constructing `Select` ASTs.

// --- Typestate Marker Structs ---
// These zero-sized structs represent the state of the builder.
// They ensure that methods are called in the correct SQL order at compile time.

use crate::query::{
    ast::{
        common::{OrderDir, TableRef},
        expr::{BinaryOp, BinaryOperator, Expr},
        select::{FromClause, OrderByExpr, Select},
    },
    offsets::OffsetStrategy,
};
use model::pagination::cursor::Cursor;

/// The initial state of the builder before any clauses have been added.
#[derive(Debug, Default, Clone)]
pub struct InitialState;

/// The state after the `SELECT` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct SelectState;

/// The state after the `FROM` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct FromState;

// --- The Main Builder ---

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    ast: Select,
    _state: State,
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

/// Implementation for the initial state of the builder.
impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            _state: InitialState,
        }
    }

    /// Adds a `SELECT` clause with a list of columns.
    /// This is the entry point for building a select query.
    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = columns;
        SelectBuilder {
            ast: self.ast,
            _state: SelectState,
        }
    }
}

/// Implementation for the state after `SELECT` has been called.
/// The only valid next step is to specify a `FROM` table.
impl SelectBuilder<SelectState> {
    /// Adds a `FROM` clause specifying the primary table.
    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(String::from),
        });
        SelectBuilder {
            ast: self.ast,
            _state: FromState,
        }
    }
}

/// Implementation for the state after `FROM` has been called.
/// From here, we can add optional clauses like `WHERE`, `ORDER BY`, etc.
impl SelectBuilder<FromState> {
    /// Adds a condition to the `WHERE` clause, combining it with `AND` when
    /// one is already present.
    pub fn and_where(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(match self.ast.where_clause.take() {
            Some(existing) => Expr::BinaryOp(Box::new(BinaryOp {
                left: existing,
                op: BinaryOperator::And,
                right: condition,
            })),
            None => condition,
        });
        self
    }

    /// Adds an `ORDER BY` clause to the query.
    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    /// Adds a `LIMIT` clause to the query.
    pub fn limit(mut self, limit: Expr) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    /// Adds an `OFFSET` clause to the query.
    pub fn offset(mut self, offset: Expr) -> Self {
        self.ast.offset = Some(offset);
        self
    }

    /// Hands the builder to a pagination strategy, which adds the clauses
    /// that select the page starting at `cursor`.
    pub fn paginate(self, strategy: &dyn OffsetStrategy, cursor: &Cursor, limit: usize) -> Self {
        strategy.apply_to_builder(self, cursor, limit)
    }

    /// Finalizes and returns the constructed `Select` AST.
    pub fn build(self) -> Select {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::{OrderDir, TableRef},
            expr::{BinaryOp, BinaryOperator, Expr},
        },
        builder::select::SelectBuilder,
        ident, value,
    };
    use model::core::value::Value;

    fn table(name: &str) -> TableRef {
        TableRef {
            schema: None,
            name: name.to_string(),
        }
    }

    fn gt(col: &str, v: i64) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp {
            left: ident(col),
            op: BinaryOperator::Gt,
            right: value(Value::Int(v)),
        }))
    }

    #[test]
    fn test_build_simple_select() {
        let ast = SelectBuilder::new()
            .select(vec![Expr::Wildcard])
            .from(table("orders"), None)
            .build();

        assert_eq!(ast.columns, vec![Expr::Wildcard]);
        assert_eq!(ast.from.unwrap().table.name, "orders");
        assert!(ast.where_clause.is_none());
    }

    #[test]
    fn test_and_where_combines_conditions() {
        let ast = SelectBuilder::new()
            .select(vec![Expr::Wildcard])
            .from(table("orders"), None)
            .and_where(gt("id", 10))
            .and_where(gt("total", 5))
            .build();

        match ast.where_clause {
            Some(Expr::BinaryOp(op)) => {
                assert_eq!(op.op, BinaryOperator::And);
                assert_eq!(op.left, gt("id", 10));
                assert_eq!(op.right, gt("total", 5));
            }
            other => panic!("unexpected where clause: {other:?}"),
        }
    }

    #[test]
    fn test_build_with_ordering_limit_and_offset() {
        let ast = SelectBuilder::new()
            .select(vec![ident("id")])
            .from(table("products"), None)
            .order_by(ident("id"), Some(OrderDir::Asc))
            .limit(value(Value::Uint(50)))
            .offset(value(Value::Uint(100)))
            .build();

        assert_eq!(ast.order_by.len(), 1);
        assert_eq!(ast.order_by[0].direction, Some(OrderDir::Asc));
        assert_eq!(ast.limit, Some(value(Value::Uint(50))));
        assert_eq!(ast.offset, Some(value(Value::Uint(100))));
    }
}
