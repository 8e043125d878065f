//! Converting man-days into elapsed business days.

use crate::calendar::business_days_between;
use crate::capacity::CapacitySegment;
use chrono::NaiveDate;
use tracing::{trace, warn};

/// Capacity timeline for one specialty, starting on a given date.
#[derive(Debug, Clone, Copy)]
pub struct CapacityTimeline<'a> {
    pub specialty: &'a str,
    pub start: NaiveDate,
    pub segments: &'a [CapacitySegment],
}

impl<'a> CapacityTimeline<'a> {
    pub fn new(specialty: &'a str, start: NaiveDate, segments: &'a [CapacitySegment]) -> Self {
        Self {
            specialty,
            start,
            segments,
        }
    }
}

/// Lowest efficiency factor honoured; smaller positive values are raised to it.
pub const MIN_EFFICIENCY: f64 = 0.01;

/// Longest lane the engine will produce, roughly a century of business days.
pub const MAX_DURATION_DAYS: u32 = 26_100;

/// Efficiency must be a positive finite factor; anything else counts as 1.
fn sanitize_efficiency(efficiency: f64) -> f64 {
    if !efficiency.is_finite() || efficiency <= 0.0 {
        warn!(efficiency, "non-positive efficiency, using 1.0");
        return 1.0;
    }
    if efficiency < MIN_EFFICIENCY {
        warn!(efficiency, floor = MIN_EFFICIENCY, "efficiency below floor, clamping");
        return MIN_EFFICIENCY;
    }
    efficiency
}

fn ceil_days(man_days: f64, rate: f64) -> i64 {
    (man_days / rate).ceil().min(f64::from(MAX_DURATION_DAYS)) as i64
}

fn clamp_days(days: i64) -> u32 {
    u32::try_from(days.clamp(1, i64::from(MAX_DURATION_DAYS))).unwrap_or(MAX_DURATION_DAYS)
}

/// Business days needed to burn `man_days` of effort for `specialty`
/// starting on `start`, given a possibly changing headcount.
///
/// `segments` must be sorted by date. Each segment lasts until the next
/// segment's date; the last one lasts indefinitely. The result is 0 for
/// non-positive effort and otherwise in `1..=MAX_DURATION_DAYS`.
pub fn duration_with_capacity_changes(
    man_days: f64,
    specialty: &str,
    start: NaiveDate,
    segments: &[CapacitySegment],
    efficiency: f64,
    buffer_fraction: f64,
) -> u32 {
    if man_days.is_nan() || man_days <= 0.0 {
        return 0;
    }
    let buffer_fraction = if buffer_fraction.is_finite() {
        buffer_fraction
    } else {
        0.0
    };
    let efficiency = sanitize_efficiency(efficiency);
    let adjusted = man_days * (1.0 + buffer_fraction);

    let headcounts: Vec<u32> = segments.iter().map(|s| s.headcount(specialty)).collect();
    let Some(&first_positive) = headcounts.iter().find(|count| **count > 0) else {
        trace!(specialty, "no capacity data, assuming a single person");
        return clamp_days(ceil_days(adjusted, efficiency));
    };
    if headcounts.iter().all(|count| *count == headcounts[0]) {
        return clamp_days(ceil_days(adjusted, f64::from(first_positive) * efficiency));
    }

    let mut idx = segments
        .iter()
        .rposition(|segment| segment.date <= start)
        .unwrap_or(0);
    let mut cursor = start;
    let mut remaining = adjusted;
    let mut days: i64 = 0;
    let mut last_rate: Option<f64> = None;

    while idx < segments.len() && remaining > 0.0 {
        let headcount = headcounts[idx];
        let rate = f64::from(headcount) * efficiency;
        if headcount > 0 {
            last_rate = Some(rate);
        }
        let Some(next) = segments.get(idx + 1) else {
            if headcount > 0 {
                days += ceil_days(remaining, rate);
                remaining = 0.0;
            }
            break;
        };

        let span = business_days_between(cursor, next.date);
        let absorbable = span as f64 * rate;
        if headcount > 0 && remaining <= absorbable {
            days += ceil_days(remaining, rate);
            remaining = 0.0;
            break;
        }
        remaining -= absorbable;
        days += span;
        cursor = cursor.max(next.date);
        idx += 1;
    }

    if remaining > 0.0 {
        // Trailing segments had nobody in this specialty; extrapolate from
        // the last staffed rate.
        let rate = last_rate.unwrap_or(f64::from(first_positive) * efficiency);
        days += ceil_days(remaining, rate);
    }
    clamp_days(days)
}

/// Duration for a lane, with or without a capacity timeline.
///
/// With a timeline the capacity-aware walk is used. Without one the flat
/// formula `ceil(man_days * (1 + buffer) / (headcount * efficiency))`
/// applies, and a headcount of zero means the work cannot be staffed (0).
pub fn duration(
    man_days: f64,
    headcount: f64,
    efficiency: f64,
    buffer_fraction: f64,
    timeline: Option<CapacityTimeline<'_>>,
) -> u32 {
    if let Some(timeline) = timeline {
        return duration_with_capacity_changes(
            man_days,
            timeline.specialty,
            timeline.start,
            timeline.segments,
            efficiency,
            buffer_fraction,
        );
    }
    if man_days.is_nan() || man_days <= 0.0 || headcount.is_nan() || headcount <= 0.0 {
        return 0;
    }
    let buffer_fraction = if buffer_fraction.is_finite() {
        buffer_fraction
    } else {
        0.0
    };
    let efficiency = sanitize_efficiency(efficiency);
    let adjusted = man_days * (1.0 + buffer_fraction);
    clamp_days(ceil_days(adjusted, headcount * efficiency))
}
