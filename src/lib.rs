pub mod aggregate;
pub mod calendar;
pub mod capacity;
pub mod context;
pub mod duration;
pub mod effort_types;
pub mod error;
pub mod layout;
pub mod phase;
pub mod plan;
pub mod schedule;
pub mod settings;
pub mod task;
pub mod team;

pub use aggregate::{Aggregation, PhaseTotals, aggregate};
pub use calendar::{add_business_days, business_days_between, is_business_day};
pub use capacity::{
    Capacity, CapacitySegment, capacity_at, compute_daily_capacity, find_capacity_change_points,
};
pub use context::{PhaseAssignment, PhaseLookup, PlanningContext, TeamLookup};
pub use duration::{
    CapacityTimeline, MAX_DURATION_DAYS, MIN_EFFICIENCY, duration, duration_with_capacity_changes,
};
pub use effort_types::{EffortType, EffortTypeRegistry, EffortTypeUpdate, LaneSpec};
pub use error::{PlanningError, PlanningResult};
pub use layout::{
    GanttLayout, Renderer, ScheduleRow, StackedSpan, TextGantt, TimelineSpan, schedule_rows,
    stack_overlaps,
};
pub use phase::Phase;
pub use plan::{Overrides, Plan};
pub use schedule::{
    LaneWindow, PhaseSegment, PhaseWindow, QaStartRule, ScheduleComposer, ScheduleOptions,
    ScheduleResult, compute_schedule,
};
pub use settings::PlannerSettings;
pub use task::{EffortEntry, Task};
pub use team::{MemberAssignment, MemberDirectory, Team, TeamMember};
