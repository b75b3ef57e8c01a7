use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a punch. Sequencing is never validated, two clock-ins in a row are fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PunchKind {
    #[serde(rename = "clock-in", alias = "出勤")]
    ClockIn,
    #[serde(rename = "clock-out", alias = "退勤")]
    ClockOut,
}

impl PunchKind {
    pub fn label(&self) -> &'static str {
        match self {
            PunchKind::ClockIn => "Clock-in",
            PunchKind::ClockOut => "Clock-out",
        }
    }
}

impl Display for PunchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One entry of the stored history. `timestamp` is kept in UTC and only converted to the local
/// zone when rendered.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct PunchEvent {
    pub id: Arc<str>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: PunchKind,
    pub timestamp: DateTime<Utc>,
}

impl PunchEvent {
    /// Builds an event whose id follows `previous` (the current head of the ledger). Ids are the
    /// creation instant in epoch milliseconds, bumped past `previous` when two punches share a
    /// millisecond or the clock went backwards.
    pub fn new_after(
        previous: Option<&PunchEvent>,
        kind: PunchKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let millis = timestamp.timestamp_millis();
        let id = match previous.and_then(|v| v.id.parse::<i64>().ok()) {
            Some(previous) if previous >= millis => previous + 1,
            _ => millis,
        };
        Self {
            id: id.to_string().into(),
            kind,
            timestamp,
        }
    }
}

/// Serialized form of the whole ledger, head first.
pub fn serialize_snapshot(events: &[PunchEvent]) -> serde_json::Result<String> {
    serde_json::to_string(events)
}

pub fn parse_snapshot(raw: &str) -> serde_json::Result<Vec<PunchEvent>> {
    serde_json::from_str(raw)
}
