use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub async fn init_db(database_url: &str) -> SqlitePool {
    let options = SqliteConnectOptions::from_str(database_url)
        .expect("Invalid DATABASE_URL")
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// ===============================
/// SQL bindable value enum
/// ===============================
///
/// Dynamic list filters collect their bind arguments as `SqlValue`s so the
/// WHERE clause and the bindings stay in the same order.
#[derive(Debug, Clone)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

pub fn bind_values_as<'q, O>(
    mut q: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    values: &'q [SqlValue],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in values {
        q = match value {
            SqlValue::String(v) => q.bind(v.as_str()),
            SqlValue::I64(v) => q.bind(*v),
            SqlValue::F64(v) => q.bind(*v),
            SqlValue::Date(v) => q.bind(*v),
            SqlValue::DateTime(v) => q.bind(*v),
        };
    }
    q
}

pub fn bind_values_scalar<'q, O>(
    mut q: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    values: &'q [SqlValue],
) -> QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in values {
        q = match value {
            SqlValue::String(v) => q.bind(v.as_str()),
            SqlValue::I64(v) => q.bind(*v),
            SqlValue::F64(v) => q.bind(*v),
            SqlValue::Date(v) => q.bind(*v),
            SqlValue::DateTime(v) => q.bind(*v),
        };
    }
    q
}
