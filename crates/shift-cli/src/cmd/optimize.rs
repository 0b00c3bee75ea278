use crate::output::{join_or_dash, print_json, print_table};
use anyhow::Context;
use shift_core::optimizer::HttpOptimizer;
use shift_core::Coordinator;
use std::path::Path;
use std::time::Duration;

pub fn run(
    config_path: Option<&Path>,
    scenario: &Path,
    url: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let mut coordinator = super::load_scenario(&config, scenario)?;

    let client = match url {
        Some(url) => HttpOptimizer::new(url, Duration::from_secs(config.optimizer.timeout_secs)),
        None => config.optimizer.client(),
    }
    .context("failed to build optimizer client")?;

    coordinator
        .optimize(&client)
        .with_context(|| format!("optimizer at {} failed", client.endpoint()))?;

    let summaries = coordinator.staff_summaries();
    let coverage = coordinator.coverage();

    if json {
        return print_json(&serde_json::json!({
            "assignments": coordinator.grid().cells(),
            "staff": summaries,
            "coverage": coverage,
        }));
    }

    println!("Month: {}", coordinator.schedule().month);
    println!();
    print_grid(&coordinator);
    println!();

    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.staff_id.to_string(),
                s.name.clone(),
                s.tier.to_string(),
                s.work_days.to_string(),
                s.assigned_days.to_string(),
                join_or_dash(s.desired_off_conflicts.iter()),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "TIER", "TARGET", "ASSIGNED", "DESIRED-OFF CONFLICTS"],
        rows,
    );

    let short: Vec<_> = coverage
        .iter()
        .filter(|c| c.assigned < c.required as usize)
        .collect();
    if !short.is_empty() {
        println!();
        println!("Understaffed days:");
        for c in short {
            println!("  day {}: {} of {} required", c.date, c.assigned, c.required);
        }
    }
    Ok(())
}

/// One row per staff member, one column per day.
/// `x` closed, `O` locked working, `o` working, `.` off.
fn print_grid(coordinator: &Coordinator) {
    let schedule = coordinator.schedule();
    let days = schedule.month.days_in_month();
    let width = coordinator
        .staff()
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0);

    let header: String = (1..=days).map(|d| char::from(b'0' + (d % 10) as u8)).collect();
    println!("{:width$}  {header}", "");

    for member in coordinator.staff() {
        let row: String = (1..=days)
            .map(|day| {
                if schedule.closed_days.contains(&day) {
                    return 'x';
                }
                match coordinator.grid().cell(day, member.id) {
                    Some(c) if c.is_working && c.locked => 'O',
                    Some(c) if c.is_working => 'o',
                    _ => '.',
                }
            })
            .collect();
        println!("{:width$}  {row}", member.name);
    }
}
