use chrono::NaiveDate;
use lane_planner::aggregate::aggregate;
use lane_planner::layout::{GanttLayout, Renderer, TextGantt, schedule_rows, stack_overlaps};
use lane_planner::phase::Phase;
use lane_planner::plan::Plan;
use lane_planner::schedule::{LaneWindow, QaStartRule, ScheduleOptions, ScheduleResult, compute_schedule};
use lane_planner::task::Task;
use lane_planner::team::Team;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_schedule() -> ScheduleResult {
    let teams = vec![
        Team::new("team-1", "Core")
            .with_size("BE", 1)
            .with_size("iOS", 1)
            .with_size("QA", 1),
    ];
    let phases = vec![Phase::new("p1", "Discovery", 1)];
    let plan = Plan::new("plan-1", "proj-1", "team-1", vec!["p1".to_string()]);
    let tasks = vec![
        Task::new("t1", "proj-1")
            .in_phase("p1")
            .with_effort("BE", 10.0)
            .with_effort("iOS", 4.0)
            .with_effort("QA", 2.0),
    ];
    let aggregation = aggregate(&plan, &tasks, &teams, None, None);
    let options = ScheduleOptions::default().with_qa_start(QaStartRule::AfterFrontend);
    compute_schedule(&plan, &aggregation, 1.0, &phases, d(2025, 1, 6), &options)
}

#[test]
fn overlapping_spans_stack_into_rows() {
    let d0 = d(2025, 1, 6);
    let spans = vec![(d0, 2u32), (d(2025, 1, 7), 2), (d(2025, 1, 9), 1)];
    let rows: Vec<usize> = stack_overlaps(&spans).iter().map(|s| s.row).collect();
    assert_eq!(rows, vec![0, 1, 0]);
}

#[test]
fn stacking_sorts_by_start_and_keeps_ties_stable() {
    let spans = vec![
        LaneWindow { specialty: "late".into(), start: d(2025, 1, 9), duration_days: 1 },
        LaneWindow { specialty: "first".into(), start: d(2025, 1, 6), duration_days: 3 },
        LaneWindow { specialty: "second".into(), start: d(2025, 1, 6), duration_days: 1 },
    ];
    let stacked = stack_overlaps(&spans);
    let order: Vec<(&str, usize)> = stacked
        .iter()
        .map(|s| (s.span.specialty.as_str(), s.row))
        .collect();
    assert_eq!(order, vec![("first", 0), ("second", 1), ("late", 0)]);
}

#[test]
fn back_to_back_spans_share_a_row() {
    let spans = vec![(d(2025, 1, 6), 2u32), (d(2025, 1, 8), 2)];
    let rows: Vec<usize> = stack_overlaps(&spans).iter().map(|s| s.row).collect();
    assert_eq!(rows, vec![0, 0]);
}

#[test]
fn span_crossing_a_weekend_holds_its_row_through_monday() {
    // Friday for two business days covers Friday and Monday
    let spans = vec![(d(2025, 1, 10), 2u32), (d(2025, 1, 13), 1), (d(2025, 1, 14), 1)];
    let rows: Vec<usize> = stack_overlaps(&spans).iter().map(|s| s.row).collect();
    assert_eq!(rows, vec![0, 1, 0]);
}

#[test]
fn pinned_lane_overlapping_a_weekend_bar_gets_its_own_row() {
    let teams = vec![Team::new("team-1", "Core").with_size("BE", 1)];
    let phases = vec![Phase::new("p1", "Discovery", 1), Phase::new("p2", "Build", 2)];
    let plan = Plan::new("plan-1", "proj-1", "team-1", vec!["p1".to_string(), "p2".to_string()])
        .with_override("p2", "BE", d(2025, 1, 13));
    let tasks = vec![
        Task::new("t1", "proj-1").in_phase("p1").with_effort("BE", 2.0),
        Task::new("t2", "proj-1").in_phase("p2").with_effort("BE", 1.0),
    ];
    let aggregation = aggregate(&plan, &tasks, &teams, None, None);
    let schedule = compute_schedule(&plan, &aggregation, 1.0, &phases, d(2025, 1, 10), &ScheduleOptions::default());
    assert_eq!(schedule.lane_window("p1", "BE").unwrap().end(), d(2025, 1, 13));

    let layout = GanttLayout::from_schedule(&schedule);
    let be = layout.tracks.iter().find(|t| t.lane.key == "BE").unwrap();
    assert_eq!(be.rows, 2);
    let rows: Vec<(&str, usize)> = be.bars.iter().map(|b| (b.phase_id.as_str(), b.row)).collect();
    assert_eq!(rows, vec![("p1", 0), ("p2", 1)]);
}

#[test]
fn layout_positions_bars_by_business_days() {
    let schedule = sample_schedule();
    let layout = GanttLayout::from_schedule(&schedule);

    // 2025-01-06 through 2025-01-20 inclusive
    assert_eq!(layout.total_business_days, 11);
    assert_eq!(layout.tracks.len(), 3);
    assert_eq!(layout.phases.len(), 1);
    assert!((layout.phases[0].width_pct - 100.0).abs() < 1e-9);

    let be = &layout.tracks[0].bars[0];
    assert_eq!(be.offset_pct, 0.0);
    assert!((be.width_pct - 1000.0 / 11.0).abs() < 1e-9);

    let ios = &layout.tracks[1].bars[0];
    assert_eq!(ios.phase_id, "p1");
    assert!((ios.offset_pct - 500.0 / 11.0).abs() < 1e-9);
    assert!(layout.markers.is_empty());
}

#[test]
fn text_gantt_renders_every_lane() {
    let schedule = sample_schedule();
    let chart = TextGantt { columns: 22 }.render(&schedule);
    assert!(chart.starts_with("2025-01-06 .. 2025-01-20 (11 business days)"));
    assert!(chart.contains("Discovery"));
    for lane in ["BE", "iOS", "QA"] {
        assert!(chart.lines().any(|line| line.starts_with(lane)), "missing {lane}:\n{chart}");
    }
    let be_line = chart.lines().find(|line| line.starts_with("BE")).unwrap();
    assert!(be_line.contains("####################"));
}

#[test]
fn rows_flatten_phase_lanes() {
    let schedule = sample_schedule();
    let rows = schedule_rows(&schedule);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].lane, "BE");
    assert_eq!(rows[0].phase, "Discovery");
    assert_eq!(rows[0].days, 10);
    assert_eq!(rows[2].lane, "QA");
    assert_eq!(rows[2].start, d(2025, 1, 17));
    assert_eq!(rows[2].end, d(2025, 1, 20));
}
