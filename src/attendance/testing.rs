//! In-memory stand-ins for the store and the biometric api.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::attendance::store::{InsertOutcome, PunchStore, StoreError};
use crate::attendance::upstream::{PunchSource, UpstreamError};
use crate::model::attendance::{Punch, PunchState, SOURCE_EXTERNAL_API};

pub fn punch(user_id: &str, state: PunchState, time: &str) -> Punch {
    Punch {
        user_id: user_id.to_string(),
        state,
        punch_time: NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%.f").unwrap(),
        verify_mode: None,
        source: Some(SOURCE_EXTERNAL_API.to_string()),
    }
}

/// Keys compare exactly, as `uq_attendance_punch` does under its binary
/// collation; `mysql_tests` in `store.rs` checks the real table agrees.
#[derive(Default)]
pub struct InMemoryPunchStore {
    rows: Mutex<Vec<Punch>>,
    fail_reads: bool,
    fail_inserts_for: Option<String>,
}

impl InMemoryPunchStore {
    pub fn with(rows: Vec<Punch>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_inserts_for(mut self, user_id: &str) -> Self {
        self.fail_inserts_for = Some(user_id.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl PunchStore for InMemoryPunchStore {
    async fn range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Punch>, StoreError> {
        if self.fail_reads {
            return Err(StoreError {
                message: "connection refused".to_string(),
            });
        }

        let mut hits: Vec<Punch> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.punch_time >= from && p.punch_time <= to)
            .cloned()
            .collect();
        hits.sort_by_key(|p| p.punch_time);
        Ok(hits)
    }

    async fn find(
        &self,
        user_id: &str,
        state: &PunchState,
        punch_time: NaiveDateTime,
    ) -> Result<Option<Punch>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.dedup_key() == (user_id, state.as_str(), punch_time))
            .cloned())
    }

    async fn insert_if_absent(&self, punch: &Punch) -> Result<InsertOutcome, StoreError> {
        if self.fail_inserts_for.as_deref() == Some(punch.user_id.as_str()) {
            return Err(StoreError {
                message: "data too long for column".to_string(),
            });
        }

        if self
            .find(&punch.user_id, &punch.state, punch.punch_time)
            .await?
            .is_some()
        {
            return Ok(InsertOutcome::Duplicate);
        }

        self.rows.lock().unwrap().push(punch.clone());
        Ok(InsertOutcome::Inserted)
    }
}

/// Answers each `fetch` with the next scripted result; an exhausted script
/// behaves like an unreachable upstream.
#[derive(Default)]
pub struct ScriptedSource {
    answers: Mutex<VecDeque<Result<Vec<Punch>, UpstreamError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn answering(answers: Vec<Result<Vec<Punch>, UpstreamError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PunchSource for ScriptedSource {
    async fn fetch(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<Punch>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(UpstreamError::Transport {
                    message: "no scripted answer".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn point_lookup_matches_full_dedup_key() {
        let store = InMemoryPunchStore::with(vec![punch("7", PunchState::CheckIn, "2025-01-10T09:01:00")]);
        let at = NaiveDateTime::parse_from_str("2025-01-10T09:01:00", "%Y-%m-%dT%H:%M:%S").unwrap();

        assert!(store.find("7", &PunchState::CheckIn, at).await.unwrap().is_some());
        assert!(store.find("7", &PunchState::CheckOut, at).await.unwrap().is_none());
        assert!(store.find("8", &PunchState::CheckIn, at).await.unwrap().is_none());
    }
}
