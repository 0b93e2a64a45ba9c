use serde_json::json;

use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_attendance_rates(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let rows: Vec<serde_json::Value> = calc::attendance_rates(&session.attendance, &session.roster)
        .iter()
        .map(|r| {
            json!({
                "studentId": r.student_id,
                "name": r.name,
                "ratePercent": r.rate_percent,
                "presentCount": r.present_count,
                "absentCount": r.absent_count,
                "lateCount": r.late_count,
                "excusedCount": r.excused_count,
                "totalCount": r.total_count,
            })
        })
        .collect();
    ok(&req.id, json!({ "rows": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.attendanceRates" => Some(handle_attendance_rates(state, req)),
        _ => None,
    }
}
