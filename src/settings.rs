use crate::effort_types::EffortTypeRegistry;
use crate::schedule::{DEFAULT_STAGGER_DAYS, QaStartRule, ScheduleOptions};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Planner-wide settings stored in the snapshot's `meta` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerSettings {
    pub start_date: NaiveDate,
    pub efficiency: f64,
    pub stagger_days: i64,
    pub qa_start: QaStartRule,
    pub primary_lane: String,
    pub qa_lane: String,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            start_date: Local::now().date_naive(),
            efficiency: 1.0,
            stagger_days: DEFAULT_STAGGER_DAYS,
            qa_start: QaStartRule::Half,
            primary_lane: "BE".to_string(),
            qa_lane: "QA".to_string(),
        }
    }
}

impl PlannerSettings {
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    /// Engine options for these settings, labelling lanes from `registry`.
    pub fn schedule_options(&self, registry: &EffortTypeRegistry) -> ScheduleOptions {
        ScheduleOptions {
            stagger_days: self.stagger_days,
            qa_start: self.qa_start,
            primary_lane: self.primary_lane.clone(),
            qa_lane: self.qa_lane.clone(),
            effort_types: registry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: PlannerSettings =
            serde_json::from_str(r#"{"startDate":"2025-03-03","qaStart":"afterFE"}"#).unwrap();
        assert_eq!(settings.start_date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        assert_eq!(settings.qa_start, QaStartRule::AfterFrontend);
        assert_eq!(settings.stagger_days, 5);
        assert_eq!(settings.efficiency, 1.0);
        assert_eq!(settings.primary_lane, "BE");
    }
}
