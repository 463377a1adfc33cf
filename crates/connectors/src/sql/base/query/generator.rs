use crate::sql::base::requests::FetchRowsRequest;
use model::core::value::Value;
use planner::query::{
    ast::expr::Expr,
    builder::select::SelectBuilder,
    dialect::Dialect,
    renderer::{Render, Renderer},
};
use planner::table_ref;

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Generates a SQL SELECT statement and its parameters.
    pub fn select(&self, request: &FetchRowsRequest) -> (String, Vec<Value>) {
        let select_ast = SelectBuilder::new()
            .select(vec![Expr::Wildcard])
            .from(table_ref!(&request.table), None)
            .paginate(request.strategy.as_ref(), &request.cursor, request.limit)
            .build();

        self.render_ast(select_ast)
    }

    pub fn show_create_table(&self, table: &str) -> String {
        format!("SHOW CREATE TABLE {}", self.dialect.quote_identifier(table))
    }

    pub fn show_columns(&self, table: &str) -> String {
        format!("SHOW COLUMNS FROM {}", self.dialect.quote_identifier(table))
    }

    fn render_ast(&self, ast: impl Render) -> (String, Vec<Value>) {
        let mut renderer = Renderer::new(self.dialect);
        ast.render(&mut renderer);
        renderer.finish()
    }
}
