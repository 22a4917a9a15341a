use async_trait::async_trait;
use chrono::NaiveDateTime;
use derive_more::{Display, Error};
use sqlx::MySqlPool;

use crate::model::attendance::{Punch, PunchRow, PunchState};

#[derive(Debug, Display, Error)]
#[display(fmt = "punch store failure: {}", message)]
pub struct StoreError {
    pub message: String,
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError {
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A punch with the same (user, state, time) already existed; nothing written.
    Duplicate,
}

/// Local persistence for punches.
#[async_trait]
pub trait PunchStore: Send + Sync {
    /// Punches with `from <= punch_time <= to`, ascending by `punch_time`.
    async fn range(&self, from: NaiveDateTime, to: NaiveDateTime)
    -> Result<Vec<Punch>, StoreError>;

    async fn find(
        &self,
        user_id: &str,
        state: &PunchState,
        punch_time: NaiveDateTime,
    ) -> Result<Option<Punch>, StoreError>;

    /// Stores `punch` unless its dedup key is already present. Existing rows
    /// are never overwritten.
    async fn insert_if_absent(&self, punch: &Punch) -> Result<InsertOutcome, StoreError>;
}

pub struct MySqlPunchStore {
    pool: MySqlPool,
}

impl MySqlPunchStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PunchStore for MySqlPunchStore {
    async fn range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Punch>, StoreError> {
        let rows = sqlx::query_as::<_, PunchRow>(
            r#"
            SELECT user_id, state, punch_time, verify_mode, source
            FROM attendance_logs
            WHERE punch_time BETWEEN ? AND ?
            ORDER BY punch_time ASC, id ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Punch::from).collect())
    }

    async fn find(
        &self,
        user_id: &str,
        state: &PunchState,
        punch_time: NaiveDateTime,
    ) -> Result<Option<Punch>, StoreError> {
        let row = sqlx::query_as::<_, PunchRow>(
            r#"
            SELECT user_id, state, punch_time, verify_mode, source
            FROM attendance_logs
            WHERE user_id = ? AND state = ? AND punch_time = ?
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(state.as_str())
        .bind(punch_time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Punch::from))
    }

    async fn insert_if_absent(&self, punch: &Punch) -> Result<InsertOutcome, StoreError> {
        // uq_attendance_punch (user_id, state, punch_time) arbitrates concurrent merges
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_logs (user_id, state, punch_time, verify_mode, source)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&punch.user_id)
        .bind(punch.state.as_str())
        .bind(punch.punch_time)
        .bind(punch.verify_mode.as_deref())
        .bind(punch.source.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }
}
