use chrono::Utc;
use shared::model::Deployment;
use sqlx::{Executor, Sqlite};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    DuplicateIdentity,
}

/// Conditional insert: rejects an existing (name, region, year) identity in a
/// single write rather than a read-check-then-write sequence.
pub async fn insert_deployment<'e, E>(
    executor: E,
    deployment: &Deployment,
) -> Result<InsertOutcome, QueryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r"
        INSERT INTO deployments (id, name, region, year, start_time, end_time, geometry, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (name, region, year) DO NOTHING
        ",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(&deployment.name)
    .bind(&deployment.region)
    .bind(deployment.year)
    .bind(deployment.start_time)
    .bind(deployment.end_time)
    .bind(&deployment.geometry)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        Ok(InsertOutcome::DuplicateIdentity)
    } else {
        Ok(InsertOutcome::Inserted)
    }
}

/// Overwrite upsert: atomically replaces every non-key column of an existing
/// row for this identity, or inserts a fresh row if none exists. No field
/// merge ever happens.
pub async fn replace_deployment<'e, E>(
    executor: E,
    deployment: &Deployment,
) -> Result<(), QueryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        INSERT INTO deployments (id, name, region, year, start_time, end_time, geometry, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (name, region, year) DO UPDATE SET
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            geometry = excluded.geometry,
            created_at = excluded.created_at
        ",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(&deployment.name)
    .bind(&deployment.region)
    .bind(deployment.year)
    .bind(deployment.start_time)
    .bind(deployment.end_time)
    .bind(&deployment.geometry)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(())
}
