//! SQL parsing: query string in, engine statement out.
//!
//! The heavy lifting is done by `sqlparser` with the generic dialect; this
//! module lowers the generic AST into the four statement shapes the engine
//! executes and rejects everything else with a syntax error.

use crate::error::{MinipgError, MinipgResult};
use crate::sql::ast::{
    CmpKind, ColumnUpdate, CreateTableStmt, InsertStmt, SelectStmt, Statement, UpdateStmt,
    WhereClause,
};
use crate::storage::schema::{Column, ColumnKind};
use sqlparser::ast as sql;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

pub struct SqlParser {
    dialect: GenericDialect,
}

impl SqlParser {
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }

    /// Parse one statement. Trailing statements after the first are ignored.
    pub fn parse(&self, query: &str) -> MinipgResult<Statement> {
        let parsed = Parser::parse_sql(&self.dialect, query).map_err(|e| {
            MinipgError::QuerySyntaxInvalid {
                message: e.to_string(),
                query: query.to_string(),
            }
        })?;
        let Some(first) = parsed.into_iter().next() else {
            return Err(syntax_error("empty query", query));
        };
        match first {
            sql::Statement::CreateTable(create) => lower_create(create, query),
            sql::Statement::Insert(insert) => lower_insert(insert, query),
            sql::Statement::Query(select) => lower_select(*select, query),
            sql::Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => lower_update(table, assignments, selection, query),
            other => Err(syntax_error(
                &format!("unsupported statement: {other}"),
                query,
            )),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn syntax_error(message: &str, query: &str) -> MinipgError {
    MinipgError::QuerySyntaxInvalid {
        message: message.to_string(),
        query: query.to_string(),
    }
}

fn lower_create(create: sql::CreateTable, query: &str) -> MinipgResult<Statement> {
    let mut columns = Vec::with_capacity(create.columns.len());
    for column in &create.columns {
        let kind = match &column.data_type {
            sql::DataType::Text => ColumnKind::Text,
            sql::DataType::Int(_) | sql::DataType::Integer(_) => ColumnKind::Int,
            other => {
                return Err(syntax_error(
                    &format!("unsupported column type: {other}"),
                    query,
                ));
            }
        };
        columns.push(Column::new(&column.name.value, kind));
    }
    if columns.is_empty() {
        return Err(syntax_error("a table needs at least one column", query));
    }
    Ok(Statement::CreateTable(CreateTableStmt {
        name: create.name.to_string(),
        columns,
    }))
}

fn lower_insert(insert: sql::Insert, query: &str) -> MinipgResult<Statement> {
    let column_names: Vec<String> = insert.columns.iter().map(|c| c.value.clone()).collect();

    let Some(source) = &insert.source else {
        return Err(syntax_error("INSERT requires a VALUES clause", query));
    };
    let sql::SetExpr::Values(values) = source.body.as_ref() else {
        return Err(syntax_error(
            "only INSERT INTO ... VALUES (...) is supported",
            query,
        ));
    };
    let mut rows = Vec::with_capacity(values.rows.len());
    for value_row in &values.rows {
        let mut row = Vec::with_capacity(value_row.len());
        for expr in value_row {
            row.push(literal_text(expr).ok_or_else(|| {
                syntax_error(&format!("unsupported value expression: {expr}"), query)
            })?);
        }
        rows.push(row);
    }

    Ok(Statement::Insert(InsertStmt {
        table_name: insert.table_name.to_string(),
        contains_all_columns: column_names.is_empty(),
        column_names,
        rows,
    }))
}

fn lower_select(select: sql::Query, query: &str) -> MinipgResult<Statement> {
    if select.order_by.is_some() || select.limit.is_some() {
        return Err(syntax_error("ORDER BY and LIMIT are not supported", query));
    }
    let sql::SetExpr::Select(body) = select.body.as_ref() else {
        return Err(syntax_error("only plain SELECT is supported", query));
    };

    let [from] = body.from.as_slice() else {
        return Err(syntax_error("SELECT needs exactly one table", query));
    };
    if !from.joins.is_empty() {
        return Err(syntax_error("joins are not supported", query));
    }
    let table_name = relation_name(from, query)?;

    let mut column_names = Vec::new();
    let mut contains_all_columns = false;
    for item in &body.projection {
        match item {
            sql::SelectItem::Wildcard(_) => contains_all_columns = true,
            sql::SelectItem::UnnamedExpr(sql::Expr::Identifier(ident)) => {
                column_names.push(ident.value.clone());
            }
            other => {
                return Err(syntax_error(
                    &format!("unsupported projection: {other}"),
                    query,
                ));
            }
        }
    }

    Ok(Statement::Select(SelectStmt {
        table_name,
        column_names,
        contains_all_columns,
        where_clause: lower_where(body.selection.as_ref())?,
    }))
}

fn lower_update(
    table: sql::TableWithJoins,
    assignments: Vec<sql::Assignment>,
    selection: Option<sql::Expr>,
    query: &str,
) -> MinipgResult<Statement> {
    let table_name = relation_name(&table, query)?;
    let mut values = Vec::with_capacity(assignments.len());
    for assignment in &assignments {
        let value = literal_text(&assignment.value).ok_or_else(|| {
            syntax_error(
                &format!("unsupported value expression: {}", assignment.value),
                query,
            )
        })?;
        values.push(ColumnUpdate {
            name: assignment.target.to_string(),
            value,
        });
    }
    Ok(Statement::Update(UpdateStmt {
        table_name,
        values,
        where_clause: lower_where(selection.as_ref())?,
    }))
}

/// A missing WHERE is the empty clause; a present one must be exactly one
/// `column cmp literal` predicate.
fn lower_where(selection: Option<&sql::Expr>) -> MinipgResult<WhereClause> {
    let Some(expr) = selection else {
        return Ok(WhereClause::default());
    };
    match expr {
        sql::Expr::Nested(inner) => lower_where(Some(inner)),
        sql::Expr::BinaryOp { left, op, right } => {
            let sql::Expr::Identifier(column) = left.as_ref() else {
                return Err(MinipgError::QuerySyntaxWhereIncomplete);
            };
            let cmp = match op {
                sql::BinaryOperator::Eq => CmpKind::Eq,
                sql::BinaryOperator::NotEq => CmpKind::NotEq,
                sql::BinaryOperator::Gt => CmpKind::Gt,
                sql::BinaryOperator::GtEq => CmpKind::Gte,
                sql::BinaryOperator::Lt => CmpKind::Lt,
                sql::BinaryOperator::LtEq => CmpKind::Lte,
                _ => return Err(MinipgError::QuerySyntaxWhereIncomplete),
            };
            let value =
                literal_text(right).ok_or(MinipgError::QuerySyntaxWhereIncomplete)?;
            if value.is_empty() || column.value.is_empty() {
                return Err(MinipgError::QuerySyntaxWhereIncomplete);
            }
            Ok(WhereClause::new(&column.value, cmp, &value))
        }
        _ => Err(MinipgError::QuerySyntaxWhereIncomplete),
    }
}

fn relation_name(table: &sql::TableWithJoins, query: &str) -> MinipgResult<String> {
    match &table.relation {
        sql::TableFactor::Table { name, .. } => Ok(name.to_string()),
        other => Err(syntax_error(
            &format!("unsupported table reference: {other}"),
            query,
        )),
    }
}

/// The statement text of a literal: numbers verbatim, strings unquoted,
/// bare identifiers as written. Anything else is unsupported.
fn literal_text(expr: &sql::Expr) -> Option<String> {
    match expr {
        sql::Expr::Value(sql::Value::Number(n, _)) => Some(n.clone()),
        sql::Expr::Value(sql::Value::SingleQuotedString(s)) => Some(s.clone()),
        sql::Expr::Value(sql::Value::DoubleQuotedString(s)) => Some(s.clone()),
        sql::Expr::Identifier(ident) => Some(ident.value.clone()),
        sql::Expr::UnaryOp {
            op: sql::UnaryOperator::Minus,
            expr,
        } => match expr.as_ref() {
            sql::Expr::Value(sql::Value::Number(n, _)) => Some(format!("-{n}")),
            _ => None,
        },
        _ => None,
    }
}
