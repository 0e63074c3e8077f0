use shared::model::Deployment;
use sqlx::{Executor, Sqlite};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Every stored deployment exactly once. The explicit ordering makes the
/// render document order deterministic.
pub async fn fetch_all_deployments<'e, E>(executor: E) -> Result<Vec<Deployment>, QueryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Deployment>(
        r"
        SELECT name, region, year, start_time, end_time, geometry
        FROM deployments
        ORDER BY year, region, name
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(QueryError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use uuid::Uuid;

    async fn test_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        shared::apply_schema(&pool).await.unwrap();
        pool
    }

    async fn seed(pool: &Pool<Sqlite>, name: &str, region: &str, year: i32) {
        let time = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        sqlx::query(
            r"
            INSERT INTO deployments (id, name, region, year, start_time, end_time, geometry, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(name)
        .bind(region)
        .bind(year)
        .bind(time)
        .bind(time)
        .bind("LINESTRING(-70.1 41.1, -70.2 41.2)")
        .bind(time)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn fetches_every_row_ordered_by_year_region_name() {
        let pool = test_pool().await;
        seed(&pool, "tuna", "gulf", 2024).await;
        seed(&pool, "bass", "gulf", 2023).await;
        seed(&pool, "cod", "atlantic", 2024).await;
        seed(&pool, "bass", "atlantic", 2024).await;

        let rows = fetch_all_deployments(&pool).await.unwrap();
        let keys: Vec<(i32, &str, &str)> = rows
            .iter()
            .map(|d| (d.year, d.region.as_str(), d.name.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2023, "gulf", "bass"),
                (2024, "atlantic", "bass"),
                (2024, "atlantic", "cod"),
                (2024, "gulf", "tuna"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_returns_no_rows() {
        let pool = test_pool().await;
        assert!(fetch_all_deployments(&pool).await.unwrap().is_empty());
    }
}
