use crate::attendance::reconciler::{Provenance, Reconciler};
use crate::attendance::summary::{DailyAttendance, summarize_days};
use crate::error::AppError;
use crate::model::attendance::Punch;
use crate::utils::date_format::parse_dmy;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AttendanceLogQuery {
    /// First calendar day, `DD/MM/YYYY`
    #[schema(example = "01/10/2025")]
    pub start_date: String,
    /// Last calendar day (inclusive), `DD/MM/YYYY`
    #[schema(example = "31/10/2025")]
    pub end_date: String,
    /// Consult the biometric api even when local punches exist
    #[schema(example = false)]
    #[serde(default)]
    pub force_refresh: bool,
}

impl AttendanceLogQuery {
    fn date_range(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let start = parse_dmy(&self.start_date).ok_or_else(|| {
            AppError::bad_request(format!(
                "start_date must be DD/MM/YYYY, got {:?}",
                self.start_date
            ))
        })?;
        let end = parse_dmy(&self.end_date).ok_or_else(|| {
            AppError::bad_request(format!(
                "end_date must be DD/MM/YYYY, got {:?}",
                self.end_date
            ))
        })?;

        if start > end {
            return Err(AppError::bad_request("start_date cannot be after end_date"));
        }
        Ok((start, end))
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceLogResponse {
    pub data: Vec<Punch>,
    #[schema(example = "database")]
    pub source: Provenance,
    #[schema(example = 1)]
    pub count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceSummaryResponse {
    pub data: Vec<DailyAttendance>,
    #[schema(example = "database")]
    pub source: Provenance,
    #[schema(example = 1)]
    pub count: usize,
}

/// Attendance punches for a date range
#[utoipa::path(
    post,
    path = "/api/attendance/logs",
    request_body(
        content = AttendanceLogQuery,
        description = "Date range in DD/MM/YYYY and optional forced refresh",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Punches with their provenance", body = AttendanceLogResponse),
        (status = 400, description = "Malformed dates", body = Object, example = json!({
            "error": "Bad Request",
            "details": "start_date must be DD/MM/YYYY, got \"2025-10-01\""
        })),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "error": "Internal Server Error",
            "details": "punch store failure: pool timed out"
        }))
    ),
    tag = "Attendance"
)]
pub async fn fetch_logs(
    reconciler: web::Data<Reconciler>,
    payload: web::Json<AttendanceLogQuery>,
) -> Result<HttpResponse, AppError> {
    let (start, end) = payload.date_range()?;

    let logs = reconciler
        .fetch_attendance_logs(start, end, payload.force_refresh)
        .await?;

    tracing::info!(
        start = %start,
        end = %end,
        force_refresh = payload.force_refresh,
        source = %logs.provenance,
        count = logs.count,
        "Served attendance logs"
    );

    Ok(HttpResponse::Ok().json(AttendanceLogResponse {
        data: logs.records,
        source: logs.provenance,
        count: logs.count,
    }))
}

/// Per-user, per-day first check-in and last check-out
#[utoipa::path(
    post,
    path = "/api/attendance/summary",
    request_body = AttendanceLogQuery,
    responses(
        (status = 200, description = "Daily attendance with the provenance of the underlying punches", body = AttendanceSummaryResponse),
        (status = 400, description = "Malformed dates"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn daily_summary(
    reconciler: web::Data<Reconciler>,
    payload: web::Json<AttendanceLogQuery>,
) -> Result<HttpResponse, AppError> {
    let (start, end) = payload.date_range()?;

    let logs = reconciler
        .fetch_attendance_logs(start, end, payload.force_refresh)
        .await?;
    let days = summarize_days(&logs.records);

    Ok(HttpResponse::Ok().json(AttendanceSummaryResponse {
        count: days.len(),
        data: days,
        source: logs.provenance,
    }))
}

/// CORS preflight
#[utoipa::path(
    options,
    path = "/api/attendance/logs",
    responses((status = 200, description = "Preflight accepted")),
    tag = "Attendance"
)]
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}
