use crate::effort_types::LaneSpec;
use crate::task::{id_list, id_string, parse_date_lenient};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Pinned lane start dates, keyed by phase id then lane key.
pub type Overrides = BTreeMap<String, BTreeMap<String, NaiveDate>>;

/// A scheduling proposal for one project and team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(deserialize_with = "id_string")]
    pub project_id: String,
    #[serde(deserialize_with = "id_string")]
    pub team_id: String,
    #[serde(default, deserialize_with = "id_list")]
    pub phase_ids: Vec<String>,
    /// Contingency percentage added to every effort total.
    #[serde(default)]
    pub buffer_pct: f64,
    /// Explicit lane list; derived from observed specialties when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lanes: Option<Vec<LaneSpec>>,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "lenient_overrides"
    )]
    pub overrides: Overrides,
}

impl Plan {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        team_id: impl Into<String>,
        phase_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            project_id: project_id.into(),
            team_id: team_id.into(),
            phase_ids,
            buffer_pct: 0.0,
            lanes: None,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_buffer_pct(mut self, buffer_pct: f64) -> Self {
        self.buffer_pct = buffer_pct;
        self
    }

    pub fn with_lanes(mut self, lanes: Vec<LaneSpec>) -> Self {
        self.lanes = Some(lanes);
        self
    }

    /// Buffer as a fraction; non-finite input counts as no buffer.
    pub fn buffer_fraction(&self) -> f64 {
        if self.buffer_pct.is_finite() {
            self.buffer_pct / 100.0
        } else {
            0.0
        }
    }

    pub fn includes_phase(&self, phase_id: &str) -> bool {
        self.phase_ids.iter().any(|id| id == phase_id)
    }

    pub fn override_for(&self, phase_id: &str, lane: &str) -> Option<NaiveDate> {
        self.overrides.get(phase_id)?.get(lane).copied()
    }

    /// Copy of this plan with one lane start pinned. `self` is untouched.
    pub fn with_override(&self, phase_id: &str, lane: &str, start: NaiveDate) -> Self {
        let mut plan = self.clone();
        plan.overrides
            .entry(phase_id.to_string())
            .or_default()
            .insert(lane.to_string(), start);
        plan
    }

    /// Copy of this plan with one pinned lane start removed.
    pub fn without_override(&self, phase_id: &str, lane: &str) -> Self {
        let mut plan = self.clone();
        if let Some(lanes) = plan.overrides.get_mut(phase_id) {
            lanes.remove(lane);
            if lanes.is_empty() {
                plan.overrides.remove(phase_id);
            }
        }
        plan
    }
}

/// Overrides with unparseable or empty dates are dropped rather than
/// rejecting the whole plan.
fn lenient_overrides<'de, D>(deserializer: D) -> Result<Overrides, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, BTreeMap<String, Option<String>>>::deserialize(deserializer)?;
    let mut overrides = Overrides::new();
    for (phase_id, lanes) in raw {
        let parsed: BTreeMap<String, NaiveDate> = lanes
            .into_iter()
            .filter_map(|(lane, date)| Some((lane, parse_date_lenient(&date?)?)))
            .collect();
        if !parsed.is_empty() {
            overrides.insert(phase_id, parsed);
        }
    }
    Ok(overrides)
}
