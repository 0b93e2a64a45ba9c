use rusqlite::Connection;
use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_date_param, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, AttendanceEntry, AttendanceStatus, Grade, Session};

enum CellEdit {
    Attendance(AttendanceStatus),
    Skills(Option<Grade>),
    Listening(Option<Grade>),
    Speaking(Option<Grade>),
}

fn parse_grade_value(params: &serde_json::Value) -> Result<Option<Grade>, HandlerErr> {
    let Some(v) = params.get("value") else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let Some(s) = v.as_str() else {
        return Err(HandlerErr::new("bad_params", "value must be string or null"));
    };
    if s.is_empty() {
        return Ok(None);
    }
    Grade::parse(s)
        .map(Some)
        .ok_or_else(|| HandlerErr::new("bad_params", "value must be one of A, B, C"))
}

fn parse_cell_edit(params: &serde_json::Value) -> Result<CellEdit, HandlerErr> {
    let field = get_required_str(params, "field")?;
    match field.as_str() {
        "attendance" => {
            let value = get_required_str(params, "value")?;
            let status = AttendanceStatus::parse(&value).ok_or_else(|| {
                HandlerErr::new(
                    "bad_params",
                    "value must be one of present, absent, late, excused",
                )
            })?;
            Ok(CellEdit::Attendance(status))
        }
        "skills" => Ok(CellEdit::Skills(parse_grade_value(params)?)),
        "listening" => Ok(CellEdit::Listening(parse_grade_value(params)?)),
        "speaking" => Ok(CellEdit::Speaking(parse_grade_value(params)?)),
        other => Err(HandlerErr::new(
            "bad_params",
            format!("unknown field: {}", other),
        )),
    }
}

fn entry_row(student_id: &str, name: &str, entry: &AttendanceEntry) -> serde_json::Value {
    json!({
        "studentId": student_id,
        "name": name,
        "attendance": entry.attendance.as_str(),
        "skills": entry.skills.map(Grade::as_str),
        "listening": entry.listening.map(Grade::as_str),
        "speaking": entry.speaking.map(Grade::as_str),
    })
}

/// One row per roster student, stored entry or default. Opening a date never
/// writes to the store; the date stays absent until an edit lands.
fn attendance_date_open(
    session: &Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_param(params)?;
    let day = session.attendance.get(&date);
    let rows: Vec<serde_json::Value> = session
        .roster
        .students
        .iter()
        .map(|s| {
            let entry = day
                .and_then(|d| d.get(&s.id))
                .cloned()
                .unwrap_or_default();
            entry_row(&s.id, &s.name, &entry)
        })
        .collect();
    Ok(json!({ "date": date, "rows": rows }))
}

fn attendance_set_cell(
    conn: &Connection,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_date_param(params)?;
    let student_id = get_required_str(params, "studentId")?;
    let edit = parse_cell_edit(params)?;

    if !session.roster.contains(&student_id) {
        return Err(HandlerErr::new("not_found", "student not found"));
    }

    // First edit on a date materializes default entries for the whole roster
    // before the change is applied.
    let day = session
        .attendance
        .entry(date)
        .or_insert_with(|| store::blank_day(&session.roster));
    let entry = day.entry(student_id).or_default();
    match edit {
        CellEdit::Attendance(status) => entry.attendance = status,
        CellEdit::Skills(grade) => entry.skills = grade,
        CellEdit::Listening(grade) => entry.listening = grade,
        CellEdit::Speaking(grade) => entry.speaking = grade,
    }

    store::save_attendance(conn, &session.attendance).map_err(|e| HandlerErr {
        code: "db_update_failed",
        message: e.to_string(),
        details: Some(json!({ "key": store::ATTENDANCE_KEY })),
    })?;
    Ok(json!({ "ok": true }))
}

fn handle_attendance_date_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match attendance_date_open(session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_set_cell(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(conn), Some(session)) = (state.db.as_ref(), state.session.as_mut()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match attendance_set_cell(conn, session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.dateOpen" => Some(handle_attendance_date_open(state, req)),
        "attendance.setCell" => Some(handle_attendance_set_cell(state, req)),
        _ => None,
    }
}
