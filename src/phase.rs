use crate::task::id_string;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, deserialize_with = "id_string")]
    pub project_id: String,
}

impl Phase {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
            project_id: String::new(),
        }
    }

    /// Name for display, falling back to the id.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Sort phases by `order`. The sort is stable, so equal orders keep their
/// input position.
pub fn order_phases<'a>(mut phases: Vec<&'a Phase>) -> Vec<&'a Phase> {
    phases.sort_by_key(|phase| phase.order);
    phases
}
