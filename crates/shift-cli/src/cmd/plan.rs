use crate::output::{join_or_dash, print_json, print_table};
use chrono::Datelike;
use std::path::Path;

pub fn run(config_path: Option<&Path>, scenario: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let coordinator = super::load_scenario(&config, scenario)?;
    let schedule = coordinator.schedule();

    if json {
        return print_json(&serde_json::json!({
            "schedule": schedule,
            "requirements": coordinator.requirements(),
        }));
    }

    println!("Month: {}", schedule.month);
    println!(
        "Staff: {} ({})",
        coordinator.staff().len(),
        coordinator
            .roster()
            .tier_counts()
            .iter()
            .map(|(tier, n)| format!("{}={n}", tier.label()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let rows = coordinator
        .requirements()
        .iter()
        .map(|r| {
            let weekday = schedule
                .month
                .date(r.date)
                .map(|d| d.weekday().to_string())
                .unwrap_or_default();
            vec![
                r.date.to_string(),
                weekday,
                schedule.day_status(r.date).to_string(),
                r.required_staff_count.to_string(),
                join_or_dash(r.required_attendance_tiers.iter()),
                r.required_attendance_tier_count.to_string(),
            ]
        })
        .collect();
    print_table(
        &["DATE", "DAY", "STATUS", "STAFF", "TIERS", "TIER COUNT"],
        rows,
    );
    Ok(())
}
