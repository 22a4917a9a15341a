use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use strum::Display;
use utoipa::ToSchema;

use crate::model::attendance::{Punch, PunchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayStatus {
    Complete,
    MissingCheckIn,
    MissingCheckOut,
    /// Last check-out is earlier than the first check-in.
    OutOfOrder,
}

/// One user's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyAttendance {
    #[schema(example = "7")]
    pub user_id: String,

    #[schema(example = "2025-01-10", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "09:01:00", value_type = String, nullable = true)]
    pub first_check_in: Option<NaiveTime>,

    #[schema(example = "17:30:00", value_type = String, nullable = true)]
    pub last_check_out: Option<NaiveTime>,

    #[schema(example = 2)]
    pub punch_count: usize,

    pub status: DayStatus,
}

#[derive(Default)]
struct DayAccumulator {
    first_check_in: Option<NaiveTime>,
    last_check_out: Option<NaiveTime>,
    punch_count: usize,
}

/// Pairs punches into per-user, per-day attendance.
///
/// Input order does not matter. Punches in states other than check-in and
/// check-out count towards `punch_count` only. Output is sorted by date, then
/// user id.
pub fn summarize_days(punches: &[Punch]) -> Vec<DailyAttendance> {
    let mut days: BTreeMap<(NaiveDate, &str), DayAccumulator> = BTreeMap::new();

    for punch in punches {
        let day = days
            .entry((punch.punch_time.date(), punch.user_id.as_str()))
            .or_default();
        day.punch_count += 1;

        let time = punch.punch_time.time();
        match punch.state {
            PunchState::CheckIn => {
                day.first_check_in = Some(day.first_check_in.map_or(time, |t| t.min(time)));
            }
            PunchState::CheckOut => {
                day.last_check_out = Some(day.last_check_out.map_or(time, |t| t.max(time)));
            }
            PunchState::Other(_) => {}
        }
    }

    days.into_iter()
        .map(|((date, user_id), day)| DailyAttendance {
            user_id: user_id.to_string(),
            date,
            first_check_in: day.first_check_in,
            last_check_out: day.last_check_out,
            punch_count: day.punch_count,
            status: status_of(day.first_check_in, day.last_check_out),
        })
        .collect()
}

fn status_of(check_in: Option<NaiveTime>, check_out: Option<NaiveTime>) -> DayStatus {
    match (check_in, check_out) {
        (None, _) => DayStatus::MissingCheckIn,
        (Some(_), None) => DayStatus::MissingCheckOut,
        (Some(i), Some(o)) if o < i => DayStatus::OutOfOrder,
        (Some(_), Some(_)) => DayStatus::Complete,
    }
}
