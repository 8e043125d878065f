//! The planning snapshot and the read-only lookups the engine runs against.

use crate::aggregate::{Aggregation, aggregate};
use crate::effort_types::EffortTypeRegistry;
use crate::error::{PlanningError, PlanningResult};
use crate::phase::Phase;
use crate::plan::Plan;
use crate::schedule::{ScheduleResult, compute_schedule};
use crate::settings::PlannerSettings;
use crate::task::Task;
use crate::team::{Team, TeamMember};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub trait TeamLookup {
    fn team(&self, id: &str) -> Option<&Team>;
}

pub trait PhaseLookup {
    fn phase(&self, id: &str) -> Option<&Phase>;
}

impl TeamLookup for [Team] {
    fn team(&self, id: &str) -> Option<&Team> {
        self.iter().find(|team| team.id == id)
    }
}

impl TeamLookup for Vec<Team> {
    fn team(&self, id: &str) -> Option<&Team> {
        self.as_slice().team(id)
    }
}

impl TeamLookup for HashMap<String, Team> {
    fn team(&self, id: &str) -> Option<&Team> {
        self.get(id)
    }
}

impl PhaseLookup for [Phase] {
    fn phase(&self, id: &str) -> Option<&Phase> {
        self.iter().find(|phase| phase.id == id)
    }
}

impl PhaseLookup for Vec<Phase> {
    fn phase(&self, id: &str) -> Option<&Phase> {
        self.as_slice().phase(id)
    }
}

impl PhaseLookup for HashMap<String, Phase> {
    fn phase(&self, id: &str) -> Option<&Phase> {
        self.get(id)
    }
}

/// Derived view: a task counts toward `phase_id` within `plan_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAssignment {
    pub plan_id: String,
    pub phase_id: String,
}

/// Everything the engine reads, owned in one place and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanningContext {
    pub meta: PlannerSettings,
    pub effort_types: EffortTypeRegistry,
    pub teams: Vec<Team>,
    pub team_members: Vec<TeamMember>,
    pub phases: Vec<Phase>,
    pub tasks: Vec<Task>,
    #[serde(alias = "proposals")]
    pub plans: Vec<Plan>,
}

impl TeamLookup for PlanningContext {
    fn team(&self, id: &str) -> Option<&Team> {
        self.teams.team(id)
    }
}

impl PhaseLookup for PlanningContext {
    fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.phase(id)
    }
}

impl PlanningContext {
    pub fn from_json_str(json: &str) -> PlanningResult<Self> {
        let mut context: PlanningContext = serde_json::from_str(json)?;
        context.effort_types.ensure_builtins();
        for plan in &context.plans {
            if context.teams.team(&plan.team_id).is_none() {
                warn!(plan = %plan.id, team = %plan.team_id, "plan references an unknown team");
            }
        }
        debug!(
            teams = context.teams.len(),
            members = context.team_members.len(),
            phases = context.phases.len(),
            tasks = context.tasks.len(),
            plans = context.plans.len(),
            "loaded planning snapshot"
        );
        Ok(context)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> PlanningResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let context = Self::from_json_str(&json)?;
        info!(path = %path.display(), "planning snapshot loaded");
        Ok(context)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> PlanningResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn plan(&self, id: &str) -> PlanningResult<&Plan> {
        self.plans
            .iter()
            .find(|plan| plan.id == id)
            .ok_or_else(|| PlanningError::PlanNotFound(id.to_string()))
    }

    pub fn team(&self, id: &str) -> PlanningResult<&Team> {
        TeamLookup::team(self, id).ok_or_else(|| PlanningError::TeamNotFound(id.to_string()))
    }

    pub fn phase(&self, id: &str) -> PlanningResult<&Phase> {
        PhaseLookup::phase(self, id).ok_or_else(|| PlanningError::PhaseNotFound(id.to_string()))
    }

    pub fn task(&self, id: &str) -> PlanningResult<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| PlanningError::TaskNotFound(id.to_string()))
    }

    fn task_mut(&mut self, id: &str) -> PlanningResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| PlanningError::TaskNotFound(id.to_string()))
    }

    fn plan_mut(&mut self, id: &str) -> PlanningResult<&mut Plan> {
        self.plans
            .iter_mut()
            .find(|plan| plan.id == id)
            .ok_or_else(|| PlanningError::PlanNotFound(id.to_string()))
    }

    pub fn tasks_for_project<'a>(&'a self, project_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |task| task.project_id == project_id)
    }

    pub fn tasks_by_phase(&self, phase_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.belongs_to_phase(phase_id))
            .collect()
    }

    /// Link a task to a phase. Returns false when it was already linked.
    pub fn assign_task_to_phase(&mut self, task_id: &str, phase_id: &str) -> PlanningResult<bool> {
        self.phase(phase_id)?;
        let task = self.task_mut(task_id)?;
        Ok(task.phase_ids.insert(phase_id.to_string()))
    }

    /// Unlink a task from a phase. Returns false when it was not linked.
    pub fn remove_task_from_phase(&mut self, task_id: &str, phase_id: &str) -> PlanningResult<bool> {
        let task = self.task_mut(task_id)?;
        Ok(task.phase_ids.remove(phase_id))
    }

    /// Which plan/phase pairs a task's effort feeds into, recomputed from the
    /// task's phase set.
    pub fn phase_assignments(&self, task_id: &str) -> PlanningResult<Vec<PhaseAssignment>> {
        let task = self.task(task_id)?;
        Ok(self
            .plans
            .iter()
            .filter(|plan| plan.project_id == task.project_id)
            .flat_map(|plan| {
                plan.phase_ids
                    .iter()
                    .filter(move |phase_id| task.belongs_to_phase(phase_id))
                    .map(move |phase_id| PhaseAssignment {
                        plan_id: plan.id.clone(),
                        phase_id: phase_id.clone(),
                    })
            })
            .collect())
    }

    pub fn aggregate_plan(&self, plan_id: &str, target_date: Option<NaiveDate>) -> PlanningResult<Aggregation> {
        let plan = self.plan(plan_id)?;
        self.team(&plan.team_id)?;
        Ok(aggregate(
            plan,
            &self.tasks,
            self,
            target_date,
            Some(self.team_members.as_slice()),
        ))
    }

    /// Aggregate and lay out a plan using the snapshot's settings.
    pub fn schedule_plan(&self, plan_id: &str) -> PlanningResult<ScheduleResult> {
        let plan = self.plan(plan_id)?;
        let aggregation = self.aggregate_plan(plan_id, Some(self.meta.start_date))?;
        let options = self.meta.schedule_options(&self.effort_types);
        Ok(compute_schedule(
            plan,
            &aggregation,
            self.meta.efficiency,
            self,
            self.meta.start_date,
            &options,
        ))
    }

    /// Pin a lane start on the stored plan.
    pub fn set_override(&mut self, plan_id: &str, phase_id: &str, lane: &str, start: NaiveDate) -> PlanningResult<()> {
        let plan = self.plan(plan_id)?;
        if !plan.includes_phase(phase_id) {
            return Err(PlanningError::PhaseNotFound(phase_id.to_string()));
        }
        let updated = plan.with_override(phase_id, lane, start);
        *self.plan_mut(plan_id)? = updated;
        info!(plan = plan_id, phase = phase_id, lane, %start, "override set");
        Ok(())
    }

    /// Remove a pinned lane start. Returns false when none was set.
    pub fn clear_override(&mut self, plan_id: &str, phase_id: &str, lane: &str) -> PlanningResult<bool> {
        let plan = self.plan(plan_id)?;
        if plan.override_for(phase_id, lane).is_none() {
            return Ok(false);
        }
        let updated = plan.without_override(phase_id, lane);
        *self.plan_mut(plan_id)? = updated;
        info!(plan = plan_id, phase = phase_id, lane, "override cleared");
        Ok(true)
    }
}
