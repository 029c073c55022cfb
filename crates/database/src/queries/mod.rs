use std::fmt::Write as _;

use ingestion::database::DatabaseError;
use sqlx::{postgres::PgArguments, query::Query, Executor, Postgres};

pub mod trip_update;

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        _ => DatabaseError::Other(Box::new(why)),
    }
}

/// Bulk upsert: builds one multi-row `INSERT ... ON CONFLICT DO UPDATE`
/// statement per call rather than issuing one round trip per row.
pub async fn insert_all<'c, E, T, B>(
    executor: E,
    table: &str,
    columns: &[&str],
    values: &[T],
    bind: B,
    conflict_set: &[&str],
) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
    for<'a> B: Fn(Query<'a, Postgres, PgArguments>, &T) -> Query<'a, Postgres, PgArguments>,
{
    if values.is_empty() {
        return Ok(0);
    }

    let mut query_str = format!("INSERT INTO {} ({}) VALUES ", table, columns.join(", "));
    let mut placeholder_index = 1;
    for i in 0..values.len() {
        if i > 0 {
            query_str.push_str(", ");
        }
        query_str.push('(');
        for j in 0..columns.len() {
            if j > 0 {
                query_str.push_str(", ");
            }
            write!(&mut query_str, "${}", placeholder_index).unwrap();
            placeholder_index += 1;
        }
        query_str.push(')');
    }
    if !conflict_set.is_empty() {
        write!(
            &mut query_str,
            " ON CONFLICT ({}) DO UPDATE SET {}",
            conflict_set.join(", "),
            columns
                .iter()
                .filter(|column| !conflict_set.contains(column))
                .map(|column| format!("{} = EXCLUDED.{}", column, column))
                .collect::<Vec<_>>()
                .join(", ")
        )
        .unwrap();
    }
    query_str.push(';');

    let mut query = sqlx::query::<Postgres>(&query_str);
    for value in values {
        query = bind(query, value);
    }
    query.execute(executor).await.map(|result| result.rows_affected())
}
