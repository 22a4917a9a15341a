use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use strum::Display;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::attendance::store::{InsertOutcome, PunchStore};
use crate::attendance::upstream::PunchSource;
use crate::error::AppError;
use crate::model::attendance::Punch;
use crate::utils::date_format::{end_of_day, start_of_day};

/// Where a batch of punches handed back to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Provenance {
    /// Local store, no upstream call made.
    Database,
    /// Forced refresh that reached the biometric api.
    ExternalApiFresh,
    /// Local store was empty; the biometric api filled the gap.
    ExternalApi,
    /// Nothing local and the biometric api failed.
    None,
}

#[derive(Debug)]
pub struct AttendanceLogs {
    pub records: Vec<Punch>,
    pub provenance: Provenance,
    pub count: usize,
}

impl AttendanceLogs {
    fn new(records: Vec<Punch>, provenance: Provenance) -> Self {
        let count = records.len();
        Self {
            records,
            provenance,
            count,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Serves punches cache-first from the local store, refreshing from the
/// biometric api on demand or when the store has nothing for the range.
pub struct Reconciler {
    store: Arc<dyn PunchStore>,
    source: Arc<dyn PunchSource>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PunchStore>, source: Arc<dyn PunchSource>) -> Self {
        Self { store, source }
    }

    /// Punches for the calendar days `start..=end`.
    ///
    /// Only a failing local read is reported as an error; every upstream
    /// failure degrades to local data or an empty result.
    #[instrument(skip(self))]
    pub async fn fetch_attendance_logs(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        force_refresh: bool,
    ) -> Result<AttendanceLogs, AppError> {
        let local = self
            .store
            .range(start_of_day(start), end_of_day(end))
            .await
            .map_err(|e| {
                error!(error = %e, "Reading local punches failed");
                AppError::internal(e.to_string())
            })?;

        if force_refresh {
            if let Some(fetched) = self.pull_upstream(start, end).await {
                return Ok(AttendanceLogs::new(fetched, Provenance::ExternalApiFresh));
            }
            warn!(local = local.len(), "Forced refresh failed");
        }

        if !local.is_empty() {
            return Ok(AttendanceLogs::new(local, Provenance::Database));
        }

        if let Some(fetched) = self.pull_upstream(start, end).await {
            return Ok(AttendanceLogs::new(fetched, Provenance::ExternalApi));
        }

        Ok(AttendanceLogs::new(Vec::new(), Provenance::None))
    }

    /// Writes every punch not already stored. Individual write failures are
    /// logged and skipped.
    pub async fn merge(&self, punches: &[Punch]) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for punch in punches {
            match self.store.insert_if_absent(punch).await {
                Ok(InsertOutcome::Inserted) => summary.inserted += 1,
                Ok(InsertOutcome::Duplicate) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        error = %e,
                        key = ?punch.dedup_key(),
                        "Storing upstream punch failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            failed = summary.failed,
            "Merged upstream punches"
        );
        summary
    }

    async fn pull_upstream(&self, start: NaiveDate, end: NaiveDate) -> Option<Vec<Punch>> {
        match self.source.fetch(start, end).await {
            Ok(fetched) => {
                self.merge(&fetched).await;
                Some(fetched)
            }
            Err(e) => {
                warn!(error = %e, "Biometric api unavailable");
                None
            }
        }
    }
}
