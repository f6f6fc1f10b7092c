//! Transition event log repository implementation.
//!
//! The log is append-only (appends happen inside the fenced transition
//! write in `device_state.rs`); this repository covers the read side and
//! bounded-retention cleanup.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TransitionEventEntity;

/// Query parameters for device history with cursor pagination.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub device_id: Uuid,
    pub cursor_timestamp: Option<i64>,
    pub cursor_id: Option<Uuid>,
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    pub limit: i32,
}

/// Last known to-status of a device before a bin start, used to seed the
/// aggregation timeline.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PreBinStatus {
    pub device_id: Uuid,
    pub to_status: String,
}

/// Repository for the transition event log.
#[derive(Clone)]
pub struct TransitionEventRepository {
    pool: PgPool,
}

impl TransitionEventRepository {
    /// Creates a new transition event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets transition history for a device, newest first, keyset-paginated
    /// on `(timestamp, id)`.
    ///
    /// Returns `(events, has_more)`.
    pub async fn history_by_device(
        &self,
        query: HistoryQuery,
    ) -> Result<(Vec<TransitionEventEntity>, bool), sqlx::Error> {
        // Fetch one extra row to detect whether more pages exist
        let fetch_limit = i64::from(query.limit) + 1;

        let mut events = sqlx::query_as::<_, TransitionEventEntity>(
            r#"
            SELECT * FROM transition_events
            WHERE device_id = $1
              AND ($2::BIGINT IS NULL OR timestamp >= $2)
              AND ($3::BIGINT IS NULL OR timestamp < $3)
              AND (
                $4::BIGINT IS NULL
                OR timestamp < $4
                OR (timestamp = $4 AND id < $5)
              )
            ORDER BY timestamp DESC, id DESC
            LIMIT $6
            "#,
        )
        .bind(query.device_id)
        .bind(query.from_timestamp)
        .bind(query.to_timestamp)
        .bind(query.cursor_timestamp)
        .bind(query.cursor_id.unwrap_or(Uuid::nil()))
        .bind(fetch_limit)
        .fetch_all(&self.pool)
        .await?;

        let has_more = events.len() as i64 > i64::from(query.limit);
        if has_more {
            events.truncate(query.limit as usize);
        }
        Ok((events, has_more))
    }

    /// Events inside `[bin_start, window_end)`, ascending per device.
    /// Events at or after `window_end` are never eligible for the closing
    /// bin, even if ingestion continues during the aggregation run.
    pub async fn events_in_window(
        &self,
        bin_start: i64,
        window_end: i64,
    ) -> Result<Vec<TransitionEventEntity>, sqlx::Error> {
        sqlx::query_as::<_, TransitionEventEntity>(
            r#"
            SELECT * FROM transition_events
            WHERE timestamp >= $1 AND timestamp < $2
            ORDER BY device_id, timestamp ASC, id ASC
            "#,
        )
        .bind(bin_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await
    }

    /// For each device with any event before `bin_start`, the to-status of
    /// its latest such event. Seeds each device's timeline at the bin
    /// boundary.
    pub async fn latest_status_before(
        &self,
        bin_start: i64,
    ) -> Result<Vec<PreBinStatus>, sqlx::Error> {
        sqlx::query_as::<_, PreBinStatus>(
            r#"
            SELECT DISTINCT ON (device_id) device_id, to_status
            FROM transition_events
            WHERE timestamp < $1
            ORDER BY device_id, timestamp DESC, id DESC
            "#,
        )
        .bind(bin_start)
        .fetch_all(&self.pool)
        .await
    }

    /// Deletes events with `timestamp < cutoff` in batches. The caller is
    /// responsible for choosing a cutoff no later than the last aggregated
    /// window end, so aggregation has always consumed what is removed.
    pub async fn delete_before(&self, cutoff: i64, batch_size: i64) -> Result<u64, sqlx::Error> {
        let mut total_deleted: u64 = 0;

        loop {
            let result = sqlx::query(
                r#"
                WITH to_delete AS (
                    SELECT id FROM transition_events
                    WHERE timestamp < $1
                    LIMIT $2
                )
                DELETE FROM transition_events
                WHERE id IN (SELECT id FROM to_delete)
                "#,
            )
            .bind(cutoff)
            .bind(batch_size)
            .execute(&self.pool)
            .await?;

            let deleted = result.rows_affected();
            total_deleted += deleted;

            if deleted < batch_size as u64 {
                break;
            }

            // Small yield to prevent blocking other operations
            tokio::task::yield_now().await;
        }

        Ok(total_deleted)
    }
}
