use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::utils::date_format::serialize_local;

/// Provenance tag written on punches merged in from the biometric API.
pub const SOURCE_EXTERNAL_API: &str = "external_api";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PunchState {
    CheckIn,
    CheckOut,
    /// Anything else the device reports; carried through but not interpreted.
    Other(String),
}

impl PunchState {
    pub fn as_str(&self) -> &str {
        match self {
            PunchState::CheckIn => "CheckIn",
            PunchState::CheckOut => "CheckOut",
            PunchState::Other(raw) => raw,
        }
    }
}

impl From<&str> for PunchState {
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "CheckIn" => PunchState::CheckIn,
            "CheckOut" => PunchState::CheckOut,
            other => PunchState::Other(other.to_string()),
        }
    }
}

impl Serialize for PunchState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One biometric check-in or check-out event.
///
/// (`user_id`, `state`, `punch_time`) identifies a punch; two punches with the
/// same triple are the same event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "user_id": "7",
    "state": "CheckIn",
    "punch_time": "2025-01-10 09:01:00",
    "verify_mode": "FACE",
    "source": "external_api"
}))]
pub struct Punch {
    /// Identifier assigned by the biometric device, not the HR employee id
    #[schema(example = "7")]
    pub user_id: String,

    #[schema(value_type = String, example = "CheckIn")]
    pub state: PunchState,

    #[schema(value_type = String, example = "2025-01-10 09:01:00")]
    #[serde(serialize_with = "serialize_local")]
    pub punch_time: NaiveDateTime,

    #[schema(example = "FACE", nullable = true)]
    pub verify_mode: Option<String>,

    #[schema(example = "external_api", nullable = true)]
    pub source: Option<String>,
}

impl Punch {
    /// (`user_id`, `state`, `punch_time`)
    pub fn dedup_key(&self) -> (&str, &str, NaiveDateTime) {
        (&self.user_id, self.state.as_str(), self.punch_time)
    }
}

/// Row shape of the `attendance_logs` table.
#[derive(Debug, sqlx::FromRow)]
pub struct PunchRow {
    pub user_id: String,
    pub state: String,
    pub punch_time: NaiveDateTime,
    pub verify_mode: Option<String>,
    pub source: Option<String>,
}

impl From<PunchRow> for Punch {
    fn from(row: PunchRow) -> Self {
        Punch {
            user_id: row.user_id,
            state: PunchState::from(row.state.as_str()),
            punch_time: row.punch_time,
            verify_mode: row.verify_mode,
            source: row.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn punch(state: PunchState, time: &str) -> Punch {
        Punch {
            user_id: "7".to_string(),
            state,
            punch_time: NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%.f").unwrap(),
            verify_mode: None,
            source: None,
        }
    }

    #[test]
    fn unknown_states_are_carried_verbatim() {
        assert_eq!(PunchState::from("CheckIn"), PunchState::CheckIn);
        assert_eq!(PunchState::from("BreakOut"), PunchState::Other("BreakOut".to_string()));
        assert_eq!(PunchState::from("BreakOut").as_str(), "BreakOut");
    }

    #[test]
    fn same_event_ignores_verify_mode_and_source() {
        let mut a = punch(PunchState::CheckIn, "2025-01-10T09:01:00");
        let b = punch(PunchState::CheckIn, "2025-01-10T09:01:00");
        a.verify_mode = Some("FACE".to_string());
        a.source = Some(SOURCE_EXTERNAL_API.to_string());
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(
            a.dedup_key(),
            punch(PunchState::CheckOut, "2025-01-10T09:01:00").dedup_key()
        );
    }

    #[test]
    fn serializes_punch_time_as_local_wall_clock() {
        let json = serde_json::to_value(punch(PunchState::CheckOut, "2025-01-10T17:30:00.250")).unwrap();
        assert_eq!(json["punch_time"], "2025-01-10 17:30:00");
        assert_eq!(json["state"], "CheckOut");
        assert_eq!(json["user_id"], "7");
        assert!(json["verify_mode"].is_null());
    }
}
