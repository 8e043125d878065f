//! Registry of effort types (specialties).
//!
//! The set is open: any string key can be added at runtime and scheduled
//! without code changes. Built-in entries are locked against removal but are
//! otherwise ordinary data.

use crate::error::PlanningError;
use serde::{Deserialize, Serialize};

pub const FALLBACK_COLOR: &str = "#888888";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffortType {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "fallback_color")]
    pub color: String,
    #[serde(default)]
    pub locked: bool,
}

fn fallback_color() -> String {
    FALLBACK_COLOR.to_string()
}

impl EffortType {
    pub fn new(key: impl Into<String>, title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            color: color.into(),
            locked: false,
        }
    }

    fn builtin(key: &str, color: &str) -> Self {
        Self {
            key: key.to_string(),
            title: key.to_string(),
            color: color.to_string(),
            locked: true,
        }
    }
}

/// Display metadata for one lane of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneSpec {
    pub key: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default = "fallback_color")]
    pub color: String,
}

impl LaneSpec {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffortTypeUpdate<'a> {
    pub title: Option<&'a str>,
    pub color: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffortTypeRegistry {
    entries: Vec<EffortType>,
}

impl Default for EffortTypeRegistry {
    fn default() -> Self {
        Self {
            entries: Self::builtins(),
        }
    }
}

impl EffortTypeRegistry {
    fn builtins() -> Vec<EffortType> {
        vec![
            EffortType::builtin("iOS", "#4e79a7"),
            EffortType::builtin("Android", "#59a14f"),
            EffortType::builtin("Online", "#f28e2c"),
            EffortType::builtin("BE", "#9c755f"),
            EffortType::builtin("QA", "#edc948"),
        ]
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[EffortType] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&EffortType> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn add(&mut self, mut effort_type: EffortType) -> Result<(), PlanningError> {
        if self.get(&effort_type.key).is_some() {
            return Err(PlanningError::DuplicateEffortType(effort_type.key));
        }
        if effort_type.title.trim().is_empty() {
            effort_type.title = effort_type.key.clone();
        }
        self.entries.push(effort_type);
        Ok(())
    }

    pub fn update(&mut self, key: &str, update: EffortTypeUpdate<'_>) -> Result<(), PlanningError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.key == key)
            .ok_or_else(|| PlanningError::UnknownEffortType(key.to_string()))?;
        if let Some(title) = update.title {
            entry.title = title.to_string();
        }
        if let Some(color) = update.color {
            entry.color = color.to_string();
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<EffortType, PlanningError> {
        let idx = self
            .entries
            .iter()
            .position(|entry| entry.key == key)
            .ok_or_else(|| PlanningError::UnknownEffortType(key.to_string()))?;
        if self.entries[idx].locked {
            return Err(PlanningError::BuiltinEffortType(key.to_string()));
        }
        Ok(self.entries.remove(idx))
    }

    /// Re-add any built-in entry missing after loading older data.
    pub fn ensure_builtins(&mut self) {
        for builtin in Self::builtins() {
            if self.get(&builtin.key).is_none() {
                self.entries.push(builtin);
            }
        }
    }

    pub fn lane_spec(&self, key: &str) -> LaneSpec {
        match self.get(key) {
            Some(entry) => LaneSpec::new(&entry.key, &entry.title, &entry.color),
            None => LaneSpec::new(key, key, FALLBACK_COLOR),
        }
    }

    pub fn default_lanes(&self) -> Vec<LaneSpec> {
        self.entries
            .iter()
            .map(|entry| LaneSpec::new(&entry.key, &entry.title, &entry.color))
            .collect()
    }
}
