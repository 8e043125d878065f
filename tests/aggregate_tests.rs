use chrono::NaiveDate;
use lane_planner::aggregate::aggregate;
use lane_planner::plan::Plan;
use lane_planner::task::Task;
use lane_planner::team::{MemberAssignment, Team, TeamMember};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn plan(phases: &[&str]) -> Plan {
    Plan::new("plan-1", "proj-1", "team-1", phases.iter().map(|p| p.to_string()).collect())
}

fn teams() -> Vec<Team> {
    vec![Team::new("team-1", "Core").with_size("BE", 2).with_size("iOS", 1)]
}

#[test]
fn buffer_is_applied_and_rounded() {
    let plan = plan(&["p1"]).with_buffer_pct(10.0);
    let tasks = vec![Task::new("t1", "proj-1").in_phase("p1").with_effort("BE", 100.0)];
    let aggregation = aggregate(&plan, &tasks, &teams(), None, None);
    assert_eq!(aggregation.buffer, 0.1);
    assert_eq!(aggregation.totals_for("p1").unwrap().man_days("BE"), 110.0);
}

#[test]
fn buffered_totals_round_to_one_decimal() {
    let plan = plan(&["p1"]).with_buffer_pct(15.0);
    let tasks = vec![Task::new("t1", "proj-1").in_phase("p1").with_effort("iOS", 3.33)];
    let aggregation = aggregate(&plan, &tasks, &teams(), None, None);
    // 3.33 * 1.15 = 3.8295
    assert_eq!(aggregation.totals_for("p1").unwrap().man_days("iOS"), 3.8);
}

#[test]
fn only_plan_project_and_phases_count() {
    let plan = plan(&["p1", "p2"]);
    let tasks = vec![
        Task::new("t1", "proj-1").in_phase("p1").with_effort("BE", 4.0).with_effort("QA", 1.0),
        Task::new("t2", "proj-1").in_phase("p1").in_phase("p3").with_effort("BE", 2.0),
        Task::new("t3", "proj-2").in_phase("p1").with_effort("BE", 50.0),
        Task::new("t4", "proj-1").in_phase("p2").with_effort("Flutter", 3.0),
    ];
    let aggregation = aggregate(&plan, &tasks, &teams(), None, None);

    let p1 = aggregation.totals_for("p1").unwrap();
    assert_eq!(p1.man_days("BE"), 6.0);
    assert_eq!(p1.man_days("QA"), 1.0);
    assert!(aggregation.totals_for("p3").is_none());

    // Specialties outside the built-in set are summed too
    assert_eq!(aggregation.totals_for("p2").unwrap().man_days("Flutter"), 3.0);
}

#[test]
fn every_plan_phase_gets_totals() {
    let plan = plan(&["p1", "p2"]);
    let aggregation = aggregate(&plan, &[], &teams(), None, None);
    assert_eq!(aggregation.phase_totals.len(), 2);
    assert_eq!(aggregation.totals_for("p2").unwrap().total(), 0.0);
}

#[test]
fn earliest_start_ignores_blank_dates() {
    let plan = plan(&["p1"]);
    let mut blank = Task::new("t1", "proj-1").in_phase("p1").with_effort("BE", 1.0);
    blank.start_date = Some("   ".to_string());
    let mut malformed = Task::new("t2", "proj-1").in_phase("p1");
    malformed.start_date = Some("next week".to_string());
    let tasks = vec![
        blank,
        malformed,
        Task::new("t3", "proj-1").in_phase("p1").with_start(d(2025, 3, 10)),
        Task::new("t4", "proj-1").in_phase("p1").with_start(d(2025, 2, 3)),
    ];
    let aggregation = aggregate(&plan, &tasks, &teams(), None, None);
    assert_eq!(aggregation.totals_for("p1").unwrap().earliest, Some(d(2025, 2, 3)));
}

#[test]
fn unknown_team_yields_empty_headcount() {
    let mut plan = plan(&["p1"]);
    plan.team_id = "missing".to_string();
    let aggregation = aggregate(&plan, &[], &teams(), None, None);
    assert!(aggregation.team.is_empty());
    assert!(aggregation.capacity_segments.is_empty());
}

#[test]
fn snapshot_uses_sizes_without_target_date() {
    let aggregation = aggregate(&plan(&["p1"]), &[], &teams(), None, None);
    assert_eq!(aggregation.headcount("BE"), 2);
    assert_eq!(aggregation.headcount("iOS"), 1);
    assert_eq!(aggregation.headcount("QA"), 0);
}

fn staffed_team() -> (Vec<Team>, Vec<TeamMember>) {
    let team = Team::new("team-1", "Core")
        .with_assignment(MemberAssignment::new("m1", d(2025, 1, 6), None))
        .with_assignment(MemberAssignment::new("m2", d(2025, 1, 6), Some(d(2025, 1, 13))))
        .with_assignment(MemberAssignment::new("m3", d(2025, 1, 6), None));
    let members = vec![
        TeamMember::new("m1", "BE"),
        TeamMember::new("m2", "BE"),
        TeamMember::new("m3", "QA"),
    ];
    (vec![team], members)
}

#[test]
fn membership_timeline_produces_capacity_segments() {
    let (teams, members) = staffed_team();
    let plan = plan(&["p1"]);
    let tasks = vec![Task::new("t1", "proj-1").in_phase("p1").with_effort("BE", 14.0)];
    let aggregation = aggregate(&plan, &tasks, &teams, Some(d(2025, 1, 6)), Some(members.as_slice()));

    assert_eq!(aggregation.headcount("BE"), 2);
    assert_eq!(aggregation.headcount("QA"), 1);
    assert_eq!(aggregation.change_points, vec![d(2025, 1, 13)]);
    assert_eq!(aggregation.capacity_segments.len(), 2);
    assert_eq!(aggregation.capacity_segments[0].date, d(2025, 1, 6));
    assert_eq!(aggregation.capacity_segments[1].headcount("BE"), 1);
}

#[test]
fn target_date_snapshot_follows_assignments() {
    let (teams, members) = staffed_team();
    let aggregation = aggregate(&plan(&["p1"]), &[], &teams, Some(d(2025, 1, 20)), Some(members.as_slice()));
    assert_eq!(aggregation.headcount("BE"), 1);
}

#[test]
fn aggregation_is_repeatable() {
    let (teams, members) = staffed_team();
    let plan = plan(&["p1"]).with_buffer_pct(20.0);
    let tasks = vec![Task::new("t1", "proj-1").in_phase("p1").with_effort("BE", 7.0)];
    let first = aggregate(&plan, &tasks, &teams, Some(d(2025, 1, 6)), Some(members.as_slice()));
    let second = aggregate(&plan, &tasks, &teams, Some(d(2025, 1, 6)), Some(members.as_slice()));
    assert_eq!(first, second);
}
