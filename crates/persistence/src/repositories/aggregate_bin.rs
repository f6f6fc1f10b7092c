//! Aggregate bin repository implementation.

use sqlx::PgPool;

use crate::entities::AggregateBinEntity;
use domain::models::aggregate_bin::AggregateBin;

/// Repository for occupancy aggregate bins. Bins are written only by the
/// aggregation job; the upsert keeps window replays idempotent.
#[derive(Clone)]
pub struct AggregateBinRepository {
    pool: PgPool,
}

impl AggregateBinRepository {
    /// Creates a new aggregate bin repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Writes or overwrites the bins for one closed window. Re-running the
    /// same window produces the same rows.
    pub async fn upsert_bins(&self, bins: &[AggregateBin]) -> Result<u64, sqlx::Error> {
        let mut written: u64 = 0;
        for bin in bins {
            let result = sqlx::query(
                r#"
                INSERT INTO aggregate_bins
                    (site_id, category, bin_start, bin_width,
                     free_count, total_count, occupancy_ratio, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
                ON CONFLICT (site_id, category, bin_start) DO UPDATE
                SET bin_width = EXCLUDED.bin_width,
                    free_count = EXCLUDED.free_count,
                    total_count = EXCLUDED.total_count,
                    occupancy_ratio = EXCLUDED.occupancy_ratio,
                    updated_at = NOW()
                "#,
            )
            .bind(&bin.site_id)
            .bind(&bin.category)
            .bind(bin.bin_start)
            .bind(bin.bin_width)
            .bind(bin.free_count)
            .bind(bin.total_count)
            .bind(bin.occupancy_ratio())
            .execute(&self.pool)
            .await?;
            written += result.rows_affected();
        }
        Ok(written)
    }

    /// Bins for a site/category with `bin_start` in `[from, to)`, ascending.
    pub async fn find_range(
        &self,
        site_id: &str,
        category: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<AggregateBinEntity>, sqlx::Error> {
        sqlx::query_as::<_, AggregateBinEntity>(
            r#"
            SELECT * FROM aggregate_bins
            WHERE site_id = $1 AND category = $2
              AND bin_start >= $3 AND bin_start < $4
            ORDER BY bin_start ASC
            "#,
        )
        .bind(site_id)
        .bind(category)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
    }

    /// All retained bins for a site/category since `since_ms`; the forecast
    /// service filters these down to the matching time-of-week bucket.
    pub async fn find_since(
        &self,
        site_id: &str,
        category: &str,
        since_ms: i64,
    ) -> Result<Vec<AggregateBinEntity>, sqlx::Error> {
        sqlx::query_as::<_, AggregateBinEntity>(
            r#"
            SELECT * FROM aggregate_bins
            WHERE site_id = $1 AND category = $2 AND bin_start >= $3
            ORDER BY bin_start ASC
            "#,
        )
        .bind(site_id)
        .bind(category)
        .bind(since_ms)
        .fetch_all(&self.pool)
        .await
    }

    /// End of the newest aggregated window, if any bin has ever been
    /// written. Lets a restarted process resume aggregation where the
    /// previous one stopped instead of skipping the windows in between.
    pub async fn latest_window_end(&self) -> Result<Option<i64>, sqlx::Error> {
        let row: (Option<i64>,) = sqlx::query_as(
            r#"
            SELECT MAX(bin_start + bin_width) FROM aggregate_bins
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Deletes bins whose `bin_start` is before the retention cutoff.
    pub async fn delete_before(&self, cutoff: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM aggregate_bins
            WHERE bin_start < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
