use crate::calendar::add_business_days;
use crate::capacity::{
    Capacity, CapacitySegment, compact_segments, compute_daily_capacity,
    find_capacity_change_points,
};
use crate::context::TeamLookup;
use crate::duration::MAX_DURATION_DAYS;
use crate::plan::Plan;
use crate::task::Task;
use crate::team::{MemberDirectory, Team, TeamMember};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Calendar days added past the estimated completion when sizing the
/// capacity window.
pub const CAPACITY_SAFETY_MARGIN_DAYS: u64 = 30;

/// Buffered effort per specialty for one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTotals {
    pub efforts: BTreeMap<String, f64>,
    /// Earliest task start feeding the phase; floors the phase start.
    pub earliest: Option<NaiveDate>,
}

impl PhaseTotals {
    pub fn man_days(&self, specialty: &str) -> f64 {
        self.efforts.get(specialty).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.efforts.values().sum()
    }

    fn record_start(&mut self, start: NaiveDate) {
        if self.earliest.is_none_or(|current| start < current) {
            self.earliest = Some(start);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    /// Headcount snapshot used when no capacity timeline is available.
    pub team: Capacity,
    /// Buffer fraction already folded into `phase_totals`.
    pub buffer: f64,
    pub phase_totals: BTreeMap<String, PhaseTotals>,
    /// Compacted to one segment per distinct capacity; empty without a
    /// membership timeline.
    pub capacity_segments: Vec<CapacitySegment>,
    pub change_points: Vec<NaiveDate>,
}

impl Aggregation {
    pub fn totals_for(&self, phase_id: &str) -> Option<&PhaseTotals> {
        self.phase_totals.get(phase_id)
    }

    pub fn headcount(&self, specialty: &str) -> u32 {
        self.team.get(specialty).copied().unwrap_or(0)
    }

    pub fn has_capacity_timeline(&self) -> bool {
        !self.capacity_segments.is_empty()
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn headcount_snapshot(team: &Team, target_date: Option<NaiveDate>, members: Option<&[TeamMember]>) -> Capacity {
    match (target_date, members) {
        (Some(date), Some(members)) if !team.member_assignments.is_empty() => {
            team.headcount_on(date, &MemberDirectory::new(members))
        }
        _ => team.sizes.clone(),
    }
}

/// Window `[first assignment start, max(last assignment end, estimated
/// completion)]` over which the capacity table is sampled.
fn capacity_window(team: &Team, snapshot: &Capacity, total_effort: f64) -> Option<(NaiveDate, NaiveDate)> {
    let start = team.earliest_assignment_start()?;
    let headcount: u32 = snapshot.values().sum();
    let estimated_days = if headcount > 0 && total_effort > 0.0 {
        (total_effort / f64::from(headcount))
            .ceil()
            .min(f64::from(MAX_DURATION_DAYS)) as i64
    } else {
        0
    };
    let estimated_end = add_business_days(start, estimated_days);
    let estimated_completion = estimated_end
        .checked_add_days(Days::new(CAPACITY_SAFETY_MARGIN_DAYS))
        .unwrap_or(estimated_end);
    let end = team
        .latest_assignment_end()
        .map_or(estimated_completion, |last| last.max(estimated_completion));
    Some((start, end))
}

/// Sum each task's effort into the plan's phases and apply the buffer.
///
/// Only tasks of the plan's project count, and only for phases the plan
/// includes. Totals are multiplied by `1 + buffer_pct / 100` and rounded to
/// one decimal. When `members` is given the team's membership timeline is
/// also sampled into capacity segments and change points.
pub fn aggregate<T: TeamLookup + ?Sized>(
    plan: &Plan,
    tasks: &[Task],
    teams: &T,
    target_date: Option<NaiveDate>,
    members: Option<&[TeamMember]>,
) -> Aggregation {
    let team = teams.team(&plan.team_id);
    let snapshot = team
        .map(|team| headcount_snapshot(team, target_date, members))
        .unwrap_or_default();
    let buffer = plan.buffer_fraction();

    let mut phase_totals: BTreeMap<String, PhaseTotals> = plan
        .phase_ids
        .iter()
        .map(|id| (id.clone(), PhaseTotals::default()))
        .collect();

    for task in tasks.iter().filter(|task| task.project_id == plan.project_id) {
        let start = task.start_date();
        for phase_id in task.phase_ids.iter().filter(|id| plan.includes_phase(id)) {
            let totals = phase_totals.entry(phase_id.clone()).or_default();
            for effort in &task.efforts {
                *totals.efforts.entry(effort.specialty.clone()).or_insert(0.0) += effort.man_days();
            }
            if let Some(start) = start {
                totals.record_start(start);
            }
        }
    }

    for totals in phase_totals.values_mut() {
        for man_days in totals.efforts.values_mut() {
            *man_days = round_one_decimal(*man_days * (1.0 + buffer));
        }
    }

    let mut capacity_segments = Vec::new();
    let mut change_points = Vec::new();
    if let (Some(team), Some(members)) = (team, members) {
        let total_effort: f64 = phase_totals.values().map(PhaseTotals::total).sum();
        if let Some((start, end)) = capacity_window(team, &snapshot, total_effort) {
            let daily = compute_daily_capacity(team, start, end, members);
            change_points = find_capacity_change_points(&daily);
            capacity_segments = compact_segments(&daily);
            debug!(
                team = %team.id,
                %start,
                %end,
                days = daily.len(),
                segments = capacity_segments.len(),
                change_points = change_points.len(),
                "sampled team capacity"
            );
        }
    }

    debug!(
        plan = %plan.id,
        phases = phase_totals.len(),
        buffer,
        "aggregated plan effort"
    );

    Aggregation {
        team: snapshot,
        buffer,
        phase_totals,
        capacity_segments,
        change_points,
    }
}
