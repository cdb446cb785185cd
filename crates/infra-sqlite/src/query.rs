// Request primitive: bind, execute and capture a statement's results

use crate::map_sqlx_error;
use crate::params::{expand_named_placeholders, ExpandedStatement};
use futures::TryStreamExt;
use mtxn_core::domain::{Binding, QueryResult, Row, SqlValue};
use mtxn_core::error::{AppError, Result};
use sqlx::error::BoxDynError;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqliteRow, SqliteValueRef};
use sqlx::{Column, Decode, Either, Executor, Row as _, TypeInfo, ValueRef};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Run `sql` on `conn`, binding `@name` placeholders from `bindings`
///
/// With `None` the statement is sent verbatim. Rows from every statement in
/// `sql` are collected in order and `rows_affected` is their total.
///
/// # Errors
/// - `AppError::Validation` for unknown placeholders, duplicate names or
///   values that do not fit their declared type
/// - `AppError::Driver` for anything the database rejects
pub async fn execute_query(
    conn: &mut SqliteConnection,
    sql: &str,
    bindings: Option<&[Binding]>,
) -> Result<QueryResult> {
    let statement = match bindings {
        Some(bindings) => expand_named_placeholders(sql, bindings)?,
        None => ExpandedStatement::verbatim(sql),
    };

    let mut query = sqlx::query(&statement.sql);
    for binding in &statement.args {
        let value = binding
            .coerced_value()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        query = bind_value(query, value);
    }

    let mut rows = Vec::new();
    let mut rows_affected = 0;

    let mut stream = conn.fetch_many(query);
    while let Some(step) = stream.try_next().await.map_err(map_sqlx_error)? {
        match step {
            Either::Left(done) => rows_affected += done.rows_affected(),
            Either::Right(row) => rows.push(decode_row(&row)?),
        }
    }

    Ok(QueryResult::new(rows, rows_affected))
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: SqlValue) -> SqliteQuery<'q> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.len());
    for column in row.columns() {
        let raw = row.try_get_raw(column.ordinal()).map_err(map_sqlx_error)?;
        let value = decode_value(raw).map_err(AppError::driver)?;
        columns.push((column.name().to_string(), value));
    }
    Ok(Row::new(columns))
}

// Decode by the value's storage class, not the column's declared type
fn decode_value<'r>(raw: SqliteValueRef<'r>) -> std::result::Result<SqlValue, BoxDynError> {
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }

    let storage_class = raw.type_info().name().to_string();
    let value = match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Integer(<i64 as Decode<'r, Sqlite>>::decode(raw)?),
        "REAL" => SqlValue::Real(<f64 as Decode<'r, Sqlite>>::decode(raw)?),
        "BLOB" => SqlValue::Blob(<Vec<u8> as Decode<'r, Sqlite>>::decode(raw)?),
        _ => SqlValue::Text(<String as Decode<'r, Sqlite>>::decode(raw)?),
    };
    Ok(value)
}
