use ingestion::database::Result;
use sqlx::{Executor, PgConnection, Postgres};

use model::trip_update::{DatedVjKey, RealTimeUpdate, TripUpdate};

use crate::data_model::trip_update::TripUpdateRow;
use crate::queries::convert_error;

pub async fn find_by_dated_vjs<'c, E>(
    executor: E,
    keys: &[DatedVjKey],
) -> Result<Vec<TripUpdate>>
where
    E: Executor<'c, Database = Postgres>,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let trip_ids: Vec<String> = keys.iter().map(|k| k.trip_id.raw()).collect();
    let timestamps: Vec<chrono::NaiveDateTime> =
        keys.iter().map(|k| k.utc_start_timestamp).collect();

    sqlx::query_as(
        "
        SELECT trip_id, utc_start_timestamp, status, effect, message, contributor, stop_time_updates
        FROM trip_updates
        WHERE (trip_id, utc_start_timestamp) IN (
            SELECT * FROM UNNEST($1::text[], $2::timestamp[])
        );
        ",
    )
    .bind(&trip_ids)
    .bind(&timestamps)
    .fetch_all(executor)
    .await
    .map_err(convert_error)
    .map(|rows: Vec<TripUpdateRow>| rows.into_iter().map(TripUpdateRow::into_model).collect())
}

/// Takes a raw connection (rather than a generic `Executor`) because it
/// issues several statements that must share one transaction: a `Postgres`
/// connection can be reborrowed per statement, an owned `Executor` value
/// cannot be used twice.
pub async fn put(
    conn: &mut PgConnection,
    rtu: &RealTimeUpdate,
    trip_updates: &[TripUpdate],
) -> Result<()> {
    let rows: Vec<TripUpdateRow> = trip_updates.iter().map(TripUpdateRow::from_model).collect();
    super::insert_all(
        &mut *conn,
        "trip_updates",
        &[
            "trip_id",
            "utc_start_timestamp",
            "status",
            "effect",
            "message",
            "contributor",
            "stop_time_updates",
        ],
        &rows,
        |query, row| {
            query
                .bind(row.trip_id.clone())
                .bind(row.utc_start_timestamp)
                .bind(row.status.clone())
                .bind(row.effect.clone())
                .bind(row.message.clone())
                .bind(row.contributor.clone())
                .bind(row.stop_time_updates.clone())
        },
        &["trip_id", "utc_start_timestamp"],
    )
    .await
    .map_err(convert_error)?;

    let rtu_id: i64 = sqlx::query_scalar(
        "
        INSERT INTO real_time_updates (raw, connector, contributor, received_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id;
        ",
    )
    .bind(&rtu.raw)
    .bind(&rtu.connector)
    .bind(rtu.contributor.raw())
    .bind(rtu.received_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(convert_error)?;

    let rtu_ids = vec![rtu_id; rtu.linked_trip_updates.len()];
    let trip_ids: Vec<String> = rtu
        .linked_trip_updates
        .iter()
        .map(|key| key.trip_id.raw())
        .collect();
    let timestamps: Vec<chrono::NaiveDateTime> = rtu
        .linked_trip_updates
        .iter()
        .map(|key| key.utc_start_timestamp)
        .collect();

    sqlx::query(
        "
        INSERT INTO rtu_trip_update_links (rtu_id, trip_id, utc_start_timestamp)
        SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::timestamp[]);
        ",
    )
    .bind(&rtu_ids)
    .bind(&trip_ids)
    .bind(&timestamps)
    .execute(&mut *conn)
    .await
    .map_err(convert_error)?;

    Ok(())
}
