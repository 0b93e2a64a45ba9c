use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollbookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn rate_rows(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
) -> Vec<serde_json::Value> {
    let result = request_ok(stdin, reader, id, "stats.attendanceRates", json!({}));
    result
        .get("rows")
        .and_then(|v| v.as_array())
        .expect("rows array")
        .clone()
}

fn counter(row: &serde_json::Value, key: &str) -> u64 {
    row.get(key).and_then(|v| v.as_u64()).unwrap_or(u64::MAX)
}

#[test]
fn excused_counts_as_attendance_and_late_counts_nothing_else() {
    let workspace = temp_dir("rollbook-rates");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // No history at all: every counter zero, rate zero rather than undefined.
    for row in rate_rows(&mut stdin, &mut reader, "2") {
        for key in [
            "ratePercent",
            "presentCount",
            "absentCount",
            "lateCount",
            "excusedCount",
            "totalCount",
        ] {
            assert_eq!(counter(&row, key), 0, "fresh workspace must be all-zero");
        }
    }

    let roster = request_ok(&mut stdin, &mut reader, "3", "roster.list", json!({}));
    let students = roster
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students")
        .clone();
    let target = students[0]
        .get("id")
        .and_then(|v| v.as_str())
        .expect("id")
        .to_string();

    // Present, Present, Absent, Excused, Late across five dates.
    let history = [
        ("2026-04-01", "present"),
        ("2026-04-02", "present"),
        ("2026-04-03", "absent"),
        ("2026-04-06", "excused"),
        ("2026-04-07", "late"),
    ];
    for (i, (date, status)) in history.iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("h{}", i),
            "attendance.setCell",
            json!({ "date": date, "studentId": target, "field": "attendance", "value": status }),
        );
    }

    let rows = rate_rows(&mut stdin, &mut reader, "4");
    let row = rows
        .iter()
        .find(|r| r.get("studentId").and_then(|v| v.as_str()) == Some(target.as_str()))
        .expect("target row");

    // Excused merges into present and total after the scan; late stands alone.
    assert_eq!(counter(row, "presentCount"), 3);
    assert_eq!(counter(row, "absentCount"), 1);
    assert_eq!(counter(row, "excusedCount"), 1);
    assert_eq!(counter(row, "lateCount"), 1);
    assert_eq!(counter(row, "totalCount"), 4);
    assert_eq!(counter(row, "ratePercent"), 75);

    // Every other student got blank-filled present entries for those dates.
    let other = rows
        .iter()
        .find(|r| r.get("studentId").and_then(|v| v.as_str()) != Some(target.as_str()))
        .expect("other row");
    assert_eq!(counter(other, "presentCount"), 5);
    assert_eq!(counter(other, "totalCount"), 5);
    assert_eq!(counter(other, "lateCount"), 0);
    assert_eq!(counter(other, "ratePercent"), 100);

    // Rates come back in roster order.
    let rate_ids: Vec<&str> = rows
        .iter()
        .map(|r| r.get("studentId").and_then(|v| v.as_str()).expect("id"))
        .collect();
    let roster_ids: Vec<&str> = students
        .iter()
        .map(|s| s.get("id").and_then(|v| v.as_str()).expect("id"))
        .collect();
    assert_eq!(rate_ids, roster_ids);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
