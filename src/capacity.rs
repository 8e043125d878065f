//! Time-varying team capacity.
//!
//! A team's membership timeline is sampled once per business day into
//! [`CapacitySegment`]s. Days where nobody is on the team are left out, so
//! the table is sparse. A change point is the date of any segment whose
//! headcount differs from the segment before it.

use crate::calendar::business_days_in;
use crate::team::{MemberDirectory, Team, TeamMember};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headcount per specialty. Missing keys mean zero.
pub type Capacity = BTreeMap<String, u32>;

static NO_CAPACITY: Capacity = BTreeMap::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySegment {
    pub date: NaiveDate,
    pub capacity: Capacity,
}

impl CapacitySegment {
    pub fn new(date: NaiveDate, capacity: Capacity) -> Self {
        Self { date, capacity }
    }

    pub fn headcount(&self, specialty: &str) -> u32 {
        self.capacity.get(specialty).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.capacity.values().sum()
    }
}

/// Headcount per specialty for every business day in `[start, end]`.
///
/// An assignment is active on a day when `start_date <= day` and the day is
/// before its `end_date` (open-ended assignments never expire). Days without
/// any capacity are omitted.
pub fn compute_daily_capacity(
    team: &Team,
    start: NaiveDate,
    end: NaiveDate,
    members: &[TeamMember],
) -> Vec<CapacitySegment> {
    if team.member_assignments.is_empty() {
        return Vec::new();
    }
    let directory = MemberDirectory::new(members);
    business_days_in(start, end)
        .map(|day| CapacitySegment::new(day, team.headcount_on(day, &directory)))
        .filter(|segment| segment.total() > 0)
        .collect()
}

/// True when any specialty has a different headcount in `a` and `b`.
pub fn capacity_differs(a: &Capacity, b: &Capacity) -> bool {
    let count = |map: &Capacity, key: &str| map.get(key).copied().unwrap_or(0);
    a.keys()
        .chain(b.keys())
        .any(|key| count(a, key) != count(b, key))
}

/// Sorted dates where capacity differs from the previous segment.
pub fn find_capacity_change_points(segments: &[CapacitySegment]) -> Vec<NaiveDate> {
    let mut points: Vec<NaiveDate> = segments
        .windows(2)
        .filter(|pair| capacity_differs(&pair[0].capacity, &pair[1].capacity))
        .map(|pair| pair[1].date)
        .collect();
    points.sort();
    points.dedup();
    points
}

/// Capacity in effect on `date`: the latest segment dated on or before it.
///
/// Dates before the first segment use the first segment; an empty table
/// yields an empty map.
pub fn capacity_at(segments: &[CapacitySegment], date: NaiveDate) -> &Capacity {
    segments
        .iter()
        .filter(|segment| segment.date <= date)
        .max_by_key(|segment| segment.date)
        .or_else(|| segments.first())
        .map(|segment| &segment.capacity)
        .unwrap_or(&NO_CAPACITY)
}

/// Keep only the first segment and those where capacity changes.
pub fn compact_segments(segments: &[CapacitySegment]) -> Vec<CapacitySegment> {
    let mut compacted: Vec<CapacitySegment> = Vec::new();
    for segment in segments {
        let changed = compacted
            .last()
            .is_none_or(|last| capacity_differs(&last.capacity, &segment.capacity));
        if changed {
            compacted.push(segment.clone());
        }
    }
    compacted
}

/// Every specialty with non-zero headcount somewhere in the table.
pub fn observed_specialties(segments: &[CapacitySegment]) -> Vec<&str> {
    let mut keys: Vec<&str> = segments
        .iter()
        .flat_map(|segment| {
            segment
                .capacity
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(key, _)| key.as_str())
        })
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}
