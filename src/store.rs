use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::db;

pub const ATTENDANCE_KEY: &str = "attendanceRecords";
pub const TESTS_KEY: &str = "testRecords";
pub const ROSTER_KEY: &str = "roster";

pub const TEST_SLOTS: usize = 5;

/// Closed attendance domain. `Excused` is the "counts as attendance for the
/// rate, tallied separately" category; `Late` is an informational tally only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            "excused" => Some(AttendanceStatus::Excused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            _ => None,
        }
    }
}

/// One student's attendance and skill grades for one date. The default
/// (present, blank grades) is what a freshly opened date shows and what a
/// first edit blank-fills with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(default)]
    pub attendance: AttendanceStatus,
    #[serde(default)]
    pub skills: Option<Grade>,
    #[serde(default)]
    pub listening: Option<Grade>,
    #[serde(default)]
    pub speaking: Option<Grade>,
}

/// date string -> student id -> entry. BTreeMap keeps serialization stable so
/// save -> load is idempotent.
pub type AttendanceRecords = BTreeMap<String, BTreeMap<String, AttendanceEntry>>;

/// Exactly TEST_SLOTS slots; None is an empty cell. Persisted short lists are
/// padded and long lists truncated on deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestScoreEntry(pub Vec<Option<u32>>);

impl Default for TestScoreEntry {
    fn default() -> Self {
        TestScoreEntry(vec![None; TEST_SLOTS])
    }
}

impl<'de> Deserialize<'de> for TestScoreEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let mut slots = Vec::<Option<u32>>::deserialize(deserializer)?;
        slots.truncate(TEST_SLOTS);
        slots.resize(TEST_SLOTS, None);
        Ok(TestScoreEntry(slots))
    }
}

pub type TestRecords = BTreeMap<String, TestScoreEntry>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub students: Vec<Student>,
}

impl Roster {
    pub fn contains(&self, student_id: &str) -> bool {
        self.students.iter().any(|s| s.id == student_id)
    }
}

// Built-in sample roster. It deliberately contains one duplicated display
// name; the two stay distinct records because storage is keyed by synthetic
// id, not by name.
const DEFAULT_ROSTER: [&str; 20] = [
    "あんぱんまん",
    "いしだかずき",
    "おきたそうごう",
    "かつらこたろう",
    "かぐら",
    "こんどういさお",
    "さかたぎんとき",
    "さかもとりょうま",
    "しむらしんぱち",
    "たかすぎしんすけ",
    "ちちゅうたろう",
    "なりたりょう",
    "にいじまゆう",
    "ねこひろし",
    "のだなつみ",
    "はたおうじ",
    "はんだごて",
    "まつだいらかたくりこ",
    "まつだいらかたくりこ",
    "やぎゅうきゅうべい",
];

/// Code-point sort matches gojuon order for an all-hiragana roster.
pub fn seed_roster() -> Roster {
    let mut names: Vec<&str> = DEFAULT_ROSTER.to_vec();
    names.sort_unstable();
    Roster {
        students: names
            .into_iter()
            .map(|name| Student {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
            })
            .collect(),
    }
}

/// In-memory state for one open workspace: the roster plus both record maps,
/// loaded once and mutated in place with write-through persistence.
pub struct Session {
    pub roster: Roster,
    pub attendance: AttendanceRecords,
    pub tests: TestRecords,
}

pub fn load_session(conn: &Connection) -> anyhow::Result<Session> {
    let roster = match db::kv_get(conn, ROSTER_KEY)?
        .and_then(|text| serde_json::from_str::<Roster>(&text).ok())
    {
        Some(roster) => roster,
        None => {
            let roster = seed_roster();
            db::kv_set(conn, ROSTER_KEY, &serde_json::to_string(&roster)?)?;
            roster
        }
    };

    Ok(Session {
        roster,
        attendance: load_map(conn, ATTENDANCE_KEY)?,
        tests: load_map(conn, TESTS_KEY)?,
    })
}

// Absent key or malformed JSON both mean "no data yet"; startup never fails
// on bad persisted state.
fn load_map<T>(conn: &Connection, key: &str) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    Ok(match db::kv_get(conn, key)? {
        Some(text) => serde_json::from_str(&text).unwrap_or_default(),
        None => T::default(),
    })
}

pub fn save_attendance(conn: &Connection, records: &AttendanceRecords) -> anyhow::Result<()> {
    db::kv_set(conn, ATTENDANCE_KEY, &serde_json::to_string(records)?)
}

pub fn save_tests(conn: &Connection, records: &TestRecords) -> anyhow::Result<()> {
    db::kv_set(conn, TESTS_KEY, &serde_json::to_string(records)?)
}

/// Clears both record maps in memory and in the store. The roster key is kept
/// so student ids stay stable across a reset.
pub fn reset_records(conn: &Connection, session: &mut Session) -> anyhow::Result<()> {
    db::kv_delete(conn, ATTENDANCE_KEY)?;
    db::kv_delete(conn, TESTS_KEY)?;
    session.attendance.clear();
    session.tests.clear();
    Ok(())
}

/// Default entries for every roster student, used when a date's sub-map is
/// created on first edit. The whole roster is materialized at once so the
/// persisted day always covers every student.
pub fn blank_day(roster: &Roster) -> BTreeMap<String, AttendanceEntry> {
    roster
        .students
        .iter()
        .map(|s| (s.id.clone(), AttendanceEntry::default()))
        .collect()
}
