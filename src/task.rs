use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Effort for one specialty on a task, in man-days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffortEntry {
    #[serde(alias = "platform")]
    pub specialty: String,
    /// Non-numeric, missing or non-finite input is coerced to 0.
    #[serde(default, deserialize_with = "lenient_man_days")]
    pub man_days: f64,
}

impl EffortEntry {
    pub fn new(specialty: impl Into<String>, man_days: f64) -> Self {
        Self {
            specialty: specialty.into(),
            man_days,
        }
    }

    /// Man-days usable in arithmetic: never NaN or infinite.
    pub fn man_days(&self) -> f64 {
        if self.man_days.is_finite() {
            self.man_days
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TaskRecord")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Raw start date as entered. Parsed on demand by [`Task::start_date`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// The one authoritative task -> phase relationship.
    #[serde(default)]
    pub phase_ids: BTreeSet<String>,
    #[serde(default)]
    pub efforts: Vec<EffortEntry>,
}

impl Task {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            name: String::new(),
            start_date: None,
            phase_ids: BTreeSet::new(),
            efforts: Vec::new(),
        }
    }

    pub fn with_start(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date.to_string());
        self
    }

    pub fn in_phase(mut self, phase_id: impl Into<String>) -> Self {
        self.phase_ids.insert(phase_id.into());
        self
    }

    pub fn with_effort(mut self, specialty: impl Into<String>, man_days: f64) -> Self {
        self.efforts.push(EffortEntry::new(specialty, man_days));
        self
    }

    /// Parsed start date. Blank, whitespace-only or malformed values are absent.
    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_date_lenient(self.start_date.as_deref()?)
    }

    pub fn belongs_to_phase(&self, phase_id: &str) -> bool {
        self.phase_ids.contains(phase_id)
    }
}

/// Legacy back-reference from a plan/phase combination to a task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyAssignment {
    phase_id: serde_json::Value,
}

/// Wire shape of a task. Older snapshots carry phase membership twice; both
/// lists are folded into the single `phase_ids` set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default, deserialize_with = "id_string")]
    project_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    phase_ids: Vec<serde_json::Value>,
    #[serde(default)]
    assignments: Vec<LegacyAssignment>,
    #[serde(default)]
    efforts: Vec<EffortEntry>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let mut phase_ids: BTreeSet<String> =
            record.phase_ids.iter().filter_map(value_as_id).collect();
        phase_ids.extend(
            record
                .assignments
                .iter()
                .filter_map(|assignment| value_as_id(&assignment.phase_id)),
        );
        Self {
            id: record.id,
            project_id: record.project_id,
            name: record.name,
            start_date: record.start_date,
            phase_ids,
            efforts: record.efforts,
        }
    }
}

/// Ids arrive as strings or numbers; both map to the same string key.
fn value_as_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `YYYY-MM-DD`, optionally followed by a time part. Blank or malformed
/// input is `None`.
pub(crate) fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Accept full timestamps by looking at the date prefix only.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_as_id(&value).unwrap_or_default())
}

pub(crate) fn id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values.iter().filter_map(value_as_id).collect())
}

fn lenient_man_days<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if parsed.is_finite() { parsed } else { 0.0 })
}
