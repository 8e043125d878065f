use std::io::{self, Write};

use chrono::NaiveDate;
use lane_planner::{MIN_EFFICIENCY, PlanningContext, QaStartRule, Renderer, TextGantt, schedule_rows};
use tracing_subscriber::EnvFilter;

fn push_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    out.push('|');
    for (i, cell) in cells.enumerate() {
        out.push(' ');
        out.push_str(cell);
        let pad = widths.get(i).copied().unwrap_or(0).saturating_sub(cell.chars().count());
        if pad > 0 {
            out.push_str(&" ".repeat(pad));
        }
        out.push_str(" |");
    }
    out.push('\n');
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if ci < widths.len() && len > widths[ci] {
                widths[ci] = len;
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &widths, headers.iter().copied());
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        push_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load <path.json>                   Load a planning snapshot\n  save <path.json>                   Write the snapshot back to disk\n  plans                              List plans\n  totals <plan>                      Buffered effort per phase and specialty\n  show <plan>                        Lane windows per phase\n  chart <plan>                       Text Gantt chart\n  override <plan> <phase> <lane> <YYYY-MM-DD>\n                                     Pin a lane start\n  clear <plan> <phase> <lane>        Remove a pinned lane start\n  stagger <n>                        Business days between primary and other lanes\n  qa <half|afterFE>                  QA start rule\n  efficiency <f>                     Efficiency factor\n  start <YYYY-MM-DD>                 Plan start date\n  meta show                          Show settings\n  quit|exit                          Exit"
    );
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn print_plans(context: &PlanningContext) {
    let rows: Vec<Vec<String>> = context
        .plans
        .iter()
        .map(|plan| {
            vec![
                plan.id.clone(),
                plan.name.clone(),
                plan.project_id.clone(),
                plan.team_id.clone(),
                plan.phase_ids.join(","),
                format!("{}", plan.buffer_pct),
            ]
        })
        .collect();
    print!(
        "{}",
        render_text_table(&["id", "name", "project", "team", "phases", "buffer%"], &rows)
    );
}

fn print_totals(context: &PlanningContext, plan_id: &str) {
    let aggregation = match context.aggregate_plan(plan_id, Some(context.meta.start_date)) {
        Ok(a) => a,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    let mut rows = Vec::new();
    for (phase_id, totals) in &aggregation.phase_totals {
        let earliest = totals.earliest.map(|d| d.to_string()).unwrap_or_default();
        for (specialty, man_days) in &totals.efforts {
            rows.push(vec![
                phase_id.clone(),
                specialty.clone(),
                format!("{:.1}", man_days),
                aggregation.headcount(specialty).to_string(),
                earliest.clone(),
            ]);
        }
    }
    print!(
        "{}",
        render_text_table(&["phase", "specialty", "man_days", "headcount", "earliest"], &rows)
    );
    if !aggregation.change_points.is_empty() {
        let points: Vec<String> = aggregation.change_points.iter().map(|d| d.to_string()).collect();
        println!("Capacity changes: {}", points.join(", "));
    }
}

fn print_schedule(context: &PlanningContext, plan_id: &str) {
    match context.schedule_plan(plan_id) {
        Ok(schedule) => {
            let rows: Vec<Vec<String>> = schedule_rows(&schedule)
                .into_iter()
                .map(|row| {
                    vec![
                        row.phase,
                        row.lane,
                        row.start.to_string(),
                        row.end.to_string(),
                        row.days.to_string(),
                    ]
                })
                .collect();
            println!("Chart {} .. {}", schedule.chart_start, schedule.chart_end);
            print!("{}", render_text_table(&["phase", "lane", "start", "end", "days"], &rows));
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn print_meta(context: &PlanningContext) {
    let meta = &context.meta;
    println!(
        "start_date: {}\nefficiency: {}\nstagger_days: {}\nqa_start: {}\nprimary_lane: {}\nqa_lane: {}",
        meta.start_date, meta.efficiency, meta.stagger_days, meta.qa_start, meta.primary_lane, meta.qa_lane
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LANE_PLANNER_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut context = PlanningContext::default();

    println!("Lane Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => match parts.next() {
                Some(path) => match PlanningContext::load_json(path) {
                    Ok(loaded) => {
                        context = loaded;
                        println!(
                            "Snapshot loaded from {} ({} plans, {} tasks).",
                            path,
                            context.plans.len(),
                            context.tasks.len()
                        );
                    }
                    Err(e) => println!("Load error: {}", e),
                },
                None => println!("Usage: load <path.json>"),
            },
            "save" => match parts.next() {
                Some(path) => match context.save_json(path) {
                    Ok(()) => println!("Snapshot saved to {}.", path),
                    Err(e) => println!("Save error: {}", e),
                },
                None => println!("Usage: save <path.json>"),
            },
            "plans" => print_plans(&context),
            "totals" => match parts.next() {
                Some(plan_id) => print_totals(&context, plan_id),
                None => println!("Usage: totals <plan>"),
            },
            "show" => match parts.next() {
                Some(plan_id) => print_schedule(&context, plan_id),
                None => println!("Usage: show <plan>"),
            },
            "chart" => match parts.next() {
                Some(plan_id) => match context.schedule_plan(plan_id) {
                    Ok(schedule) => print!("{}", TextGantt::default().render(&schedule)),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: chart <plan>"),
            },
            "override" => {
                let args: Vec<&str> = parts.collect();
                match args.as_slice() {
                    [plan_id, phase_id, lane, date_s] => {
                        let date = match parse_date(date_s) {
                            Some(d) => d,
                            None => {
                                println!("Invalid date (YYYY-MM-DD)");
                                continue;
                            }
                        };
                        match context.set_override(plan_id, phase_id, lane, date) {
                            Ok(()) => {
                                println!("Override set.");
                                print_schedule(&context, plan_id);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: override <plan> <phase> <lane> <YYYY-MM-DD>"),
                }
            }
            "clear" => {
                let args: Vec<&str> = parts.collect();
                match args.as_slice() {
                    [plan_id, phase_id, lane] => {
                        match context.clear_override(plan_id, phase_id, lane) {
                            Ok(true) => {
                                println!("Override cleared.");
                                print_schedule(&context, plan_id);
                            }
                            Ok(false) => println!("No override for {} {}.", phase_id, lane),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: clear <plan> <phase> <lane>"),
                }
            }
            "stagger" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(n)) => {
                    context.meta.stagger_days = n;
                    println!("stagger_days set to {}.", n);
                }
                _ => println!("Usage: stagger <n>"),
            },
            "qa" => match parts.next().map(str::parse::<QaStartRule>) {
                Some(Ok(rule)) => {
                    context.meta.qa_start = rule;
                    println!("qa_start set to {}.", rule);
                }
                Some(Err(e)) => println!("Error: {}", e),
                None => println!("Usage: qa <half|afterFE>"),
            },
            "efficiency" => match parts.next().map(str::parse::<f64>) {
                Some(Ok(f)) if f.is_finite() && f >= MIN_EFFICIENCY => {
                    context.meta.efficiency = f;
                    println!("efficiency set to {}.", f);
                }
                Some(_) => println!("Efficiency must be a number of at least {}", MIN_EFFICIENCY),
                None => println!("Usage: efficiency <f>"),
            },
            "start" => match parts.next().map(parse_date) {
                Some(Some(date)) => {
                    context.meta.start_date = date;
                    println!("start_date set to {}.", date);
                }
                _ => println!("Usage: start <YYYY-MM-DD>"),
            },
            "meta" => match parts.next() {
                Some("show") => print_meta(&context),
                _ => println!("Usage: meta show"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
