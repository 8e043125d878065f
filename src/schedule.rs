//! Composing per-phase lane windows from aggregated effort.
//!
//! Phases run one after another in `order`. Inside a phase the primary lane
//! starts on the phase start, every other lane is staggered, and QA follows
//! the frontend lanes according to [`QaStartRule`]. Pinned overrides on the
//! plan always win.

use crate::aggregate::{Aggregation, PhaseTotals};
use crate::calendar::add_business_days;
use crate::capacity::{Capacity, CapacitySegment, capacity_at, observed_specialties};
use crate::context::PhaseLookup;
use crate::duration::{CapacityTimeline, duration};
use crate::effort_types::{EffortTypeRegistry, LaneSpec};
use crate::phase::{Phase, order_phases};
use crate::plan::Plan;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

pub const DEFAULT_STAGGER_DAYS: i64 = 5;

/// When the QA lane starts relative to the frontend lanes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QaStartRule {
    /// Halfway through the longest frontend lane, rounded down.
    #[default]
    #[serde(rename = "half")]
    Half,
    /// Once the longest frontend lane is done.
    #[serde(rename = "afterFE")]
    AfterFrontend,
}

impl QaStartRule {
    fn offset(self, frontend_days: u32) -> i64 {
        match self {
            QaStartRule::Half => i64::from(frontend_days / 2),
            QaStartRule::AfterFrontend => i64::from(frontend_days),
        }
    }
}

impl fmt::Display for QaStartRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QaStartRule::Half => f.write_str("half"),
            QaStartRule::AfterFrontend => f.write_str("afterFE"),
        }
    }
}

impl FromStr for QaStartRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "half" => Ok(QaStartRule::Half),
            "afterFE" | "afterFe" | "after_fe" => Ok(QaStartRule::AfterFrontend),
            other => Err(format!("unknown QA start rule '{other}' (expected half or afterFE)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOptions {
    pub stagger_days: i64,
    pub qa_start: QaStartRule,
    /// Lane that opens every phase.
    pub primary_lane: String,
    /// Lane placed by the QA rule and sorted last.
    pub qa_lane: String,
    /// Labels and colours for lanes derived from the data.
    pub effort_types: EffortTypeRegistry,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            stagger_days: DEFAULT_STAGGER_DAYS,
            qa_start: QaStartRule::default(),
            primary_lane: "BE".to_string(),
            qa_lane: "QA".to_string(),
            effort_types: EffortTypeRegistry::default(),
        }
    }
}

impl ScheduleOptions {
    pub fn with_stagger_days(mut self, stagger_days: i64) -> Self {
        self.stagger_days = stagger_days;
        self
    }

    pub fn with_qa_start(mut self, qa_start: QaStartRule) -> Self {
        self.qa_start = qa_start;
        self
    }

    fn lane_role(&self, key: &str) -> LaneRole {
        if key == self.primary_lane {
            LaneRole::Primary
        } else if key == self.qa_lane {
            LaneRole::Qa
        } else {
            LaneRole::Frontend
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LaneRole {
    Primary,
    Frontend,
    Qa,
}

/// One lane's bar inside a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneWindow {
    pub specialty: String,
    pub start: NaiveDate,
    pub duration_days: u32,
}

impl LaneWindow {
    /// Last business day of the lane (inclusive).
    pub fn end(&self) -> NaiveDate {
        add_business_days(self.start, i64::from(self.duration_days) - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseWindow {
    pub phase_id: String,
    pub name: String,
    pub start: NaiveDate,
    /// Inclusive; equals `start` when no lane has work.
    pub end: NaiveDate,
    pub lanes: Vec<LaneWindow>,
}

impl PhaseWindow {
    pub fn lane(&self, specialty: &str) -> Option<&LaneWindow> {
        self.lanes.iter().find(|lane| lane.specialty == specialty)
    }
}

/// A slice of a phase with constant capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSegment {
    pub phase_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub capacity: Capacity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub chart_start: NaiveDate,
    pub chart_end: NaiveDate,
    pub lanes: Vec<LaneSpec>,
    pub phase_windows: Vec<PhaseWindow>,
    /// Phase windows cut at capacity change points. Empty when capacity is
    /// constant.
    pub split_phase_windows: Vec<PhaseSegment>,
    pub change_points: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capacity_segments: Vec<CapacitySegment>,
}

impl ScheduleResult {
    pub fn phase(&self, phase_id: &str) -> Option<&PhaseWindow> {
        self.phase_windows.iter().find(|window| window.phase_id == phase_id)
    }

    pub fn lane_window(&self, phase_id: &str, specialty: &str) -> Option<&LaneWindow> {
        self.phase(phase_id)?.lane(specialty)
    }
}

/// Lays out one plan against its aggregation.
pub struct ScheduleComposer<'a, P: PhaseLookup + ?Sized> {
    plan: &'a Plan,
    aggregation: &'a Aggregation,
    efficiency: f64,
    phases: &'a P,
    options: &'a ScheduleOptions,
}

impl<'a, P: PhaseLookup + ?Sized> ScheduleComposer<'a, P> {
    pub fn new(
        plan: &'a Plan,
        aggregation: &'a Aggregation,
        efficiency: f64,
        phases: &'a P,
        options: &'a ScheduleOptions,
    ) -> Self {
        Self {
            plan,
            aggregation,
            efficiency,
            phases,
            options,
        }
    }

    pub fn compose(&self, start_date: NaiveDate) -> ScheduleResult {
        compose_plan(self, start_date)
    }

    /// Recompute with one lane start pinned. The borrowed plan is untouched.
    pub fn with_override(
        &self,
        phase_id: &str,
        lane: &str,
        pinned: NaiveDate,
        start_date: NaiveDate,
    ) -> ScheduleResult {
        let plan = self.plan.with_override(phase_id, lane, pinned);
        ScheduleComposer::new(&plan, self.aggregation, self.efficiency, self.phases, self.options)
            .compose(start_date)
    }

    fn ordered_phases(&self) -> Vec<&'a Phase> {
        let found = self
            .plan
            .phase_ids
            .iter()
            .filter_map(|id| self.phases.phase(id))
            .collect();
        order_phases(found)
    }
}

/// Free-function form of [`ScheduleComposer::compose`].
pub fn compute_schedule<P: PhaseLookup + ?Sized>(
    plan: &Plan,
    aggregation: &Aggregation,
    efficiency: f64,
    phases: &P,
    start_date: NaiveDate,
    options: &ScheduleOptions,
) -> ScheduleResult {
    ScheduleComposer::new(plan, aggregation, efficiency, phases, options).compose(start_date)
}

/// Explicit plan lanes when present, otherwise every specialty seen in the
/// effort totals, the headcount snapshot or the capacity table.
fn resolve_lanes(plan: &Plan, aggregation: &Aggregation, options: &ScheduleOptions) -> Vec<LaneSpec> {
    if let Some(lanes) = &plan.lanes {
        return lanes.clone();
    }
    let mut keys: BTreeSet<&str> = aggregation
        .phase_totals
        .values()
        .flat_map(|totals| {
            totals
                .efforts
                .iter()
                .filter(|(_, man_days)| **man_days > 0.0)
                .map(|(key, _)| key.as_str())
        })
        .collect();
    keys.extend(
        aggregation
            .team
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(key, _)| key.as_str()),
    );
    keys.extend(observed_specialties(&aggregation.capacity_segments));

    let mut keys: Vec<&str> = keys.into_iter().collect();
    keys.sort_by(|a, b| {
        options
            .lane_role(a)
            .cmp(&options.lane_role(b))
            .then_with(|| a.cmp(b))
    });
    keys.into_iter()
        .map(|key| options.effort_types.lane_spec(key))
        .collect()
}

struct LanePlacer<'a> {
    aggregation: &'a Aggregation,
    totals: Option<&'a PhaseTotals>,
    efficiency: f64,
}

impl LanePlacer<'_> {
    fn days(&self, specialty: &str, start: NaiveDate) -> u32 {
        let man_days = self.totals.map_or(0.0, |totals| totals.man_days(specialty));
        let timeline = self
            .aggregation
            .has_capacity_timeline()
            .then(|| CapacityTimeline::new(specialty, start, &self.aggregation.capacity_segments));
        // The buffer is already folded into the totals.
        duration(
            man_days,
            f64::from(self.aggregation.headcount(specialty)),
            self.efficiency,
            0.0,
            timeline,
        )
    }
}

fn compose_plan<P: PhaseLookup + ?Sized>(
    composer: &ScheduleComposer<'_, P>,
    start_date: NaiveDate,
) -> ScheduleResult {
    let ScheduleComposer {
        plan,
        aggregation,
        efficiency,
        options,
        ..
    } = *composer;
    let lanes = resolve_lanes(plan, aggregation, options);
    let ordered = composer.ordered_phases();

    let mut phase_windows = Vec::with_capacity(ordered.len());
    let mut previous_end: Option<NaiveDate> = None;

    for phase in ordered {
        let totals = aggregation.totals_for(&phase.id);
        let mut phase_start = previous_end.map_or(start_date, |end| add_business_days(end, 1));
        if let Some(floor) = totals.and_then(|totals| totals.earliest) {
            phase_start = phase_start.max(floor);
        }

        let placer = LanePlacer {
            aggregation,
            totals,
            efficiency,
        };
        let staggered = add_business_days(phase_start, options.stagger_days);
        let pinned = |key: &str| plan.override_for(&phase.id, key);

        let mut windows: Vec<LaneWindow> = Vec::new();
        let mut frontend_days = 0u32;
        let mut qa_keys: Vec<&str> = Vec::new();

        for lane in &lanes {
            let role = options.lane_role(&lane.key);
            if role == LaneRole::Qa {
                qa_keys.push(&lane.key);
                continue;
            }
            let computed = match role {
                LaneRole::Primary => phase_start,
                _ => staggered,
            };
            let start = pinned(&lane.key).unwrap_or(computed);
            let days = placer.days(&lane.key, start);
            if role == LaneRole::Frontend {
                frontend_days = frontend_days.max(days);
            }
            trace!(phase = %phase.id, lane = %lane.key, %start, days, "placed lane");
            if days > 0 {
                windows.push(LaneWindow {
                    specialty: lane.key.clone(),
                    start,
                    duration_days: days,
                });
            }
        }

        let qa_anchor = add_business_days(staggered, options.qa_start.offset(frontend_days));
        for key in qa_keys {
            let start = pinned(key).unwrap_or(qa_anchor);
            let days = placer.days(key, start);
            trace!(phase = %phase.id, lane = key, %start, days, "placed QA lane");
            if days > 0 {
                windows.push(LaneWindow {
                    specialty: key.to_string(),
                    start,
                    duration_days: days,
                });
            }
        }

        let phase_end = windows
            .iter()
            .map(LaneWindow::end)
            .max()
            .unwrap_or(phase_start);
        previous_end = Some(phase_end);
        phase_windows.push(PhaseWindow {
            phase_id: phase.id.clone(),
            name: phase.label().to_string(),
            start: phase_start,
            end: phase_end,
            lanes: windows,
        });
    }

    let (chart_start, chart_end) = chart_window(&phase_windows, start_date);
    let change_points = aggregation.change_points.clone();
    let split_phase_windows = if change_points.is_empty() {
        Vec::new()
    } else {
        split_at_change_points(&phase_windows, &change_points, &aggregation.capacity_segments)
    };

    debug!(
        plan = %plan.id,
        phases = phase_windows.len(),
        lanes = lanes.len(),
        %chart_start,
        %chart_end,
        splits = split_phase_windows.len(),
        "composed schedule"
    );

    ScheduleResult {
        chart_start,
        chart_end,
        lanes,
        phase_windows,
        split_phase_windows,
        change_points,
        capacity_segments: aggregation.capacity_segments.clone(),
    }
}

/// Earliest start through latest end over every phase and lane.
fn chart_window(windows: &[PhaseWindow], fallback: NaiveDate) -> (NaiveDate, NaiveDate) {
    let starts = windows
        .iter()
        .flat_map(|w| std::iter::once(w.start).chain(w.lanes.iter().map(|l| l.start)));
    let ends = windows
        .iter()
        .flat_map(|w| std::iter::once(w.end).chain(w.lanes.iter().map(LaneWindow::end)));
    match (starts.min(), ends.max()) {
        (Some(start), Some(end)) => (start, end.max(start)),
        _ => (fallback, fallback),
    }
}

/// Cut every phase window at the change points strictly inside it. Each
/// slice carries the capacity in effect on its first day.
pub fn split_at_change_points(
    windows: &[PhaseWindow],
    change_points: &[NaiveDate],
    segments: &[CapacitySegment],
) -> Vec<PhaseSegment> {
    let mut slices = Vec::new();
    for window in windows {
        let cuts: BTreeSet<NaiveDate> = change_points
            .iter()
            .copied()
            .filter(|point| *point > window.start && *point <= window.end)
            .collect();
        let mut slice_start = window.start;
        for cut in cuts {
            slices.push(PhaseSegment {
                phase_id: window.phase_id.clone(),
                start: slice_start,
                end: add_business_days(cut, -1).max(slice_start),
                capacity: capacity_at(segments, slice_start).clone(),
            });
            slice_start = cut;
        }
        slices.push(PhaseSegment {
            phase_id: window.phase_id.clone(),
            start: slice_start,
            end: window.end,
            capacity: capacity_at(segments, slice_start).clone(),
        });
    }
    slices
}
