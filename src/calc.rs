use crate::store::{AttendanceRecords, AttendanceStatus, Roster, TestScoreEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRateRow {
    pub student_id: String,
    pub name: String,
    pub rate_percent: u32,
    pub present_count: u32,
    pub absent_count: u32,
    pub late_count: u32,
    pub excused_count: u32,
    pub total_count: u32,
}

/// Per-student attendance tallies over every recorded date, in roster order.
///
/// The accumulation is intentionally asymmetric and must stay that way:
/// excused absences are tallied outside the main pass and then folded into
/// both present and total (they count as attendance for the rate), while
/// late arrivals are counted in a second pass and affect no other counter.
pub fn attendance_rates(records: &AttendanceRecords, roster: &Roster) -> Vec<AttendanceRateRow> {
    roster
        .students
        .iter()
        .map(|student| {
            let mut present: u32 = 0;
            let mut absent: u32 = 0;
            let mut excused: u32 = 0;
            let mut total: u32 = 0;

            for day in records.values() {
                let Some(entry) = day.get(&student.id) else {
                    continue;
                };
                match entry.attendance {
                    AttendanceStatus::Present => {
                        present += 1;
                        total += 1;
                    }
                    AttendanceStatus::Absent => {
                        absent += 1;
                        total += 1;
                    }
                    AttendanceStatus::Excused => {
                        excused += 1;
                    }
                    AttendanceStatus::Late => {}
                }
            }

            // Excused days count as attendance for the rate.
            present += excused;
            total += excused;

            let mut late: u32 = 0;
            for day in records.values() {
                if day.get(&student.id).map(|e| e.attendance) == Some(AttendanceStatus::Late) {
                    late += 1;
                }
            }

            let rate_percent = if total > 0 {
                ((present as f64 / total as f64) * 100.0).round() as u32
            } else {
                0
            };

            AttendanceRateRow {
                student_id: student.id.clone(),
                name: student.name.clone(),
                rate_percent,
                present_count: present,
                absent_count: absent,
                late_count: late,
                excused_count: excused,
                total_count: total,
            }
        })
        .collect()
}

/// Normalizes a raw score cell: null/blank/non-numeric becomes empty,
/// anything numeric is floored and clamped into 0..=100.
pub fn clamp_score(raw: &serde_json::Value) -> Option<u32> {
    let n = match raw {
        serde_json::Value::Number(v) => v.as_f64()?,
        serde_json::Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                return None;
            }
            t.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.floor().clamp(0.0, 100.0) as u32)
}

/// Mean of the non-empty slots, rounded to one decimal; None when every slot
/// is empty (rendered as "-").
pub fn average(slots: &TestScoreEntry) -> Option<f64> {
    let nums: Vec<u32> = slots.0.iter().flatten().copied().collect();
    if nums.is_empty() {
        return None;
    }
    let sum: u32 = nums.iter().sum();
    let mean = f64::from(sum) / nums.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

pub fn format_average(avg: Option<f64>) -> String {
    match avg {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}
