use crate::api::attendance::{
    AttendanceLogQuery, AttendanceLogResponse, AttendanceSummaryResponse,
};
use crate::attendance::reconciler::Provenance;
use crate::attendance::summary::{DailyAttendance, DayStatus};
use crate::model::attendance::Punch;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Sync API",
        version = "1.0.0",
        description = r#"
## Attendance log service for the HR portal

Serves biometric check-in / check-out punches for a date range.

- Punches already stored locally are returned first (`source: database`).
- `force_refresh` consults the biometric device api and merges anything new (`source: external_api_fresh`).
- When nothing is stored for the range and no forced refresh succeeded, the api is consulted (`source: external_api`).
- If the api is unreachable or answers with an error report, the result is empty (`source: none`), never an error.

Dates are sent as `DD/MM/YYYY` with a four-digit year; punch times come back as `YYYY-MM-DD HH:MM:SS` local time.

Records from the device api are reshaped before they are returned, so `external_api*` responses have the same shape as `database` ones:
numeric `user_id`, `state` and `verify_mode` become strings, `punch_time` is reformatted as above, `source` is set to `external_api`,
and entries whose time cannot be read are left out (so `count` can be lower than what the device reported).
"#,
    ),
    paths(
        crate::api::attendance::fetch_logs,
        crate::api::attendance::daily_summary,
        crate::api::attendance::preflight
    ),
    components(
        schemas(
            AttendanceLogQuery,
            AttendanceLogResponse,
            AttendanceSummaryResponse,
            Punch,
            Provenance,
            DailyAttendance,
            DayStatus
        )
    ),
    tags(
        (name = "Attendance", description = "Biometric attendance punches"),
    )
)]
pub struct ApiDoc;
