use crate::ipc::error::err;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_required_u64(params: &serde_json::Value, key: &str) -> Result<u64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

/// Record maps are keyed by date string; anything that is not a calendar date
/// in YYYY-MM-DD form is rejected before it can become a key.
pub fn get_date_param(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let date = get_required_str(params, "date")?;
    if chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
        return Err(HandlerErr::new("bad_params", "date must be YYYY-MM-DD"));
    }
    Ok(date)
}
