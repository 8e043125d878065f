//! Backend-agnostic chart geometry and a plain-text renderer.

use crate::calendar::{add_business_days, business_days_between};
use crate::capacity::{Capacity, capacity_at};
use crate::effort_types::LaneSpec;
use crate::schedule::{LaneWindow, ScheduleResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

/// Anything drawn as a bar on a single lane.
pub trait TimelineSpan {
    fn start(&self) -> NaiveDate;
    fn duration_days(&self) -> u32;

    /// First business day after the bar.
    fn end_exclusive(&self) -> NaiveDate {
        add_business_days(self.start(), i64::from(self.duration_days()))
    }
}

impl TimelineSpan for LaneWindow {
    fn start(&self) -> NaiveDate {
        self.start
    }

    fn duration_days(&self) -> u32 {
        self.duration_days
    }
}

impl TimelineSpan for (NaiveDate, u32) {
    fn start(&self) -> NaiveDate {
        self.0
    }

    fn duration_days(&self) -> u32 {
        self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackedSpan<'a, S> {
    pub span: &'a S,
    pub row: usize,
}

/// Assign each span the lowest row whose previous bar has ended.
///
/// Spans are processed in start order; equal starts keep input order. The
/// output follows that processing order.
pub fn stack_overlaps<S: TimelineSpan>(spans: &[S]) -> Vec<StackedSpan<'_, S>> {
    let mut ordered: Vec<&S> = spans.iter().collect();
    ordered.sort_by_key(|span| span.start());

    let mut row_ends: Vec<NaiveDate> = Vec::new();
    ordered
        .into_iter()
        .map(|span| {
            let start = span.start();
            let end = span.end_exclusive();
            let row = match row_ends.iter().position(|row_end| *row_end <= start) {
                Some(row) => {
                    row_ends[row] = end;
                    row
                }
                None => {
                    row_ends.push(end);
                    row_ends.len() - 1
                }
            };
            StackedSpan { span, row }
        })
        .collect()
}

/// A lane bar tagged with the phase it belongs to.
struct TrackSpan<'a> {
    phase_id: &'a str,
    window: &'a LaneWindow,
}

impl TimelineSpan for TrackSpan<'_> {
    fn start(&self) -> NaiveDate {
        self.window.start
    }

    fn duration_days(&self) -> u32 {
        self.window.duration_days
    }
}

/// Something that turns a schedule into its own display form.
pub trait Renderer {
    type Output;

    fn render(&self, schedule: &ScheduleResult) -> Self::Output;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttBar {
    pub phase_id: String,
    pub specialty: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration_days: u32,
    pub row: usize,
    pub offset_pct: f64,
    pub width_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneTrack {
    pub lane: LaneSpec,
    pub rows: usize,
    pub bars: Vec<GanttBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseBar {
    pub phase_id: String,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub offset_pct: f64,
    pub width_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityMarker {
    pub date: NaiveDate,
    pub offset_pct: f64,
    pub capacity: Capacity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttLayout {
    pub chart_start: NaiveDate,
    pub chart_end: NaiveDate,
    /// Business days in `[chart_start, chart_end]`, at least 1.
    pub total_business_days: i64,
    pub phases: Vec<PhaseBar>,
    pub tracks: Vec<LaneTrack>,
    pub markers: Vec<CapacityMarker>,
}

impl GanttLayout {
    pub fn from_schedule(schedule: &ScheduleResult) -> Self {
        let chart_start = schedule.chart_start;
        let total = business_days_between(chart_start, add_business_days(schedule.chart_end, 1)).max(1);
        let pct = |days: i64| days as f64 / total as f64 * 100.0;
        let offset = |date: NaiveDate| pct(business_days_between(chart_start, date));

        let phases = schedule
            .phase_windows
            .iter()
            .map(|window| PhaseBar {
                phase_id: window.phase_id.clone(),
                name: window.name.clone(),
                start: window.start,
                end: window.end,
                offset_pct: offset(window.start),
                width_pct: pct(business_days_between(window.start, add_business_days(window.end, 1))),
            })
            .collect();

        let tracks = schedule
            .lanes
            .iter()
            .map(|lane| {
                let key = lane.key.as_str();
                let spans: Vec<TrackSpan<'_>> = schedule
                    .phase_windows
                    .iter()
                    .flat_map(|phase| {
                        phase
                            .lanes
                            .iter()
                            .filter(move |window| window.specialty == key)
                            .map(move |window| TrackSpan {
                                phase_id: &phase.phase_id,
                                window,
                            })
                    })
                    .collect();
                let stacked = stack_overlaps(&spans);
                let rows = stacked.iter().map(|s| s.row + 1).max().unwrap_or(0);
                let bars = stacked
                    .into_iter()
                    .map(|stacked| {
                        let window = stacked.span.window;
                        GanttBar {
                            phase_id: stacked.span.phase_id.to_string(),
                            specialty: window.specialty.clone(),
                            start: window.start,
                            end: window.end(),
                            duration_days: window.duration_days,
                            row: stacked.row,
                            offset_pct: offset(window.start),
                            width_pct: pct(i64::from(window.duration_days)),
                        }
                    })
                    .collect();
                LaneTrack {
                    lane: lane.clone(),
                    rows,
                    bars,
                }
            })
            .collect();

        let markers = schedule
            .change_points
            .iter()
            .filter(|date| **date >= chart_start && **date <= schedule.chart_end)
            .map(|date| CapacityMarker {
                date: *date,
                offset_pct: offset(*date),
                capacity: capacity_at(&schedule.capacity_segments, *date).clone(),
            })
            .collect();

        Self {
            chart_start,
            chart_end: schedule.chart_end,
            total_business_days: total,
            phases,
            tracks,
            markers,
        }
    }
}

/// Plain-text Gantt chart, one character column per slice of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextGantt {
    pub columns: usize,
}

impl Default for TextGantt {
    fn default() -> Self {
        Self { columns: 60 }
    }
}

const LABEL_WIDTH: usize = 18;

impl TextGantt {
    fn column(&self, offset_pct: f64) -> usize {
        let col = (offset_pct / 100.0 * self.columns as f64).floor();
        (col.max(0.0) as usize).min(self.columns.saturating_sub(1))
    }

    fn paint(&self, line: &mut [char], offset_pct: f64, width_pct: f64, fill: char) {
        if line.is_empty() {
            return;
        }
        let from = self.column(offset_pct);
        let to = self.column(offset_pct + width_pct - f64::EPSILON).max(from);
        for cell in &mut line[from..=to] {
            *cell = fill;
        }
    }

    fn row(label: &str, cells: &[char]) -> String {
        let mut label: String = label.chars().take(LABEL_WIDTH).collect();
        while label.chars().count() < LABEL_WIDTH {
            label.push(' ');
        }
        let body: String = cells.iter().collect();
        format!("{label}|{body}|")
    }
}

impl Renderer for TextGantt {
    type Output = String;

    fn render(&self, schedule: &ScheduleResult) -> String {
        let layout = GanttLayout::from_schedule(schedule);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} .. {} ({} business days)",
            layout.chart_start, layout.chart_end, layout.total_business_days
        );

        for phase in &layout.phases {
            let mut cells = vec![' '; self.columns];
            self.paint(&mut cells, phase.offset_pct, phase.width_pct, '=');
            let _ = writeln!(out, "{}", Self::row(&phase.name, &cells));
        }

        for track in &layout.tracks {
            for row in 0..track.rows.max(1) {
                let mut cells = vec![' '; self.columns];
                for bar in track.bars.iter().filter(|bar| bar.row == row) {
                    self.paint(&mut cells, bar.offset_pct, bar.width_pct, '#');
                }
                let label = if row == 0 { track.lane.display_name.as_str() } else { "" };
                let _ = writeln!(out, "{}", Self::row(label, &cells));
            }
        }

        if !layout.markers.is_empty() {
            let mut cells = vec![' '; self.columns];
            for marker in &layout.markers {
                if let Some(cell) = cells.get_mut(self.column(marker.offset_pct)) {
                    *cell = '^';
                }
            }
            let _ = writeln!(out, "{}", Self::row("capacity change", &cells));
        }
        out
    }
}

/// One flattened lane bar for tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub phase_id: String,
    pub phase: String,
    pub lane: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
}

pub fn schedule_rows(schedule: &ScheduleResult) -> Vec<ScheduleRow> {
    schedule
        .phase_windows
        .iter()
        .flat_map(|phase| {
            phase.lanes.iter().map(move |lane| ScheduleRow {
                phase_id: phase.phase_id.clone(),
                phase: phase.name.clone(),
                lane: lane.specialty.clone(),
                start: lane.start,
                end: lane.end(),
                days: lane.duration_days,
            })
        })
        .collect()
}
