use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;

// Destructive; the frontend owns the confirmation prompt. The roster key is
// left in place so student ids survive a reset.
fn handle_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(conn), Some(session)) = (state.db.as_ref(), state.session.as_mut()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match store::reset_records(conn, session) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admin.reset" => Some(handle_reset(state, req)),
        _ => None,
    }
}
