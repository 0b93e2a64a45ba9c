use rusqlite::Connection;
use serde_json::json;

use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, get_required_u64, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Session, TestScoreEntry, TEST_SLOTS};

fn scores_json(entry: &TestScoreEntry) -> Vec<serde_json::Value> {
    entry
        .0
        .iter()
        .map(|slot| match slot {
            Some(n) => json!(n),
            None => serde_json::Value::Null,
        })
        .collect()
}

fn tests_table_open(session: &Session) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = session
        .roster
        .students
        .iter()
        .map(|s| {
            let entry = session.tests.get(&s.id).cloned().unwrap_or_default();
            json!({
                "studentId": s.id,
                "name": s.name,
                "scores": scores_json(&entry),
                "average": calc::format_average(calc::average(&entry)),
            })
        })
        .collect();
    json!({ "rows": rows })
}

fn tests_set_score(
    conn: &Connection,
    session: &mut Session,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let slot = get_required_u64(params, "slot")? as usize;
    if slot >= TEST_SLOTS {
        return Err(HandlerErr::new(
            "bad_params",
            format!("slot must be less than {}", TEST_SLOTS),
        ));
    }
    if !session.roster.contains(&student_id) {
        return Err(HandlerErr::new("not_found", "student not found"));
    }

    let clamped = calc::clamp_score(params.get("value").unwrap_or(&serde_json::Value::Null));
    let entry = session.tests.entry(student_id).or_default();
    entry.0[slot] = clamped;
    // The row's average is recomputed from the freshly stored slots, not from
    // the raw input.
    let stored = entry.clone();

    store::save_tests(conn, &session.tests).map_err(|e| HandlerErr {
        code: "db_update_failed",
        message: e.to_string(),
        details: Some(json!({ "key": store::TESTS_KEY })),
    })?;

    Ok(json!({
        "scores": scores_json(&stored),
        "average": calc::format_average(calc::average(&stored)),
    }))
}

fn handle_tests_table_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, tests_table_open(session))
}

fn handle_tests_set_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(conn), Some(session)) = (state.db.as_ref(), state.session.as_mut()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match tests_set_score(conn, session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tests.tableOpen" => Some(handle_tests_table_open(state, req)),
        "tests.setScore" => Some(handle_tests_set_score(state, req)),
        _ => None,
    }
}
