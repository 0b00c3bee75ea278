//! Scenario files: a month's inputs replayed through a fresh [`Coordinator`].
//!
//! ```yaml
//! month: 2024-06
//! work_days: 20
//! staff:            # tier -> head count
//!   1: 1
//!   3: 2
//! desired_off:      # staff id -> days
//!   1: [3, 4]
//! updates:
//!   - type: day_status
//!     closed_days: [10, 21]
//!   - type: staff_counts
//!     normal: 2
//!     busy: 3
//! assignments:
//!   - { date: 1, staff_id: 1, is_working: true, locked: true }
//! ```

use anyhow::{bail, Context};
use chrono::Local;
use serde::Deserialize;
use shift_core::config::Config;
use shift_core::grid::CellPatch;
use shift_core::schedule::ScheduleUpdate;
use shift_core::types::{Day, Month, StaffId, Tier};
use shift_core::Coordinator;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Defaults to next month.
    #[serde(default)]
    pub month: Option<Month>,
    #[serde(default)]
    pub work_days: Option<u32>,
    #[serde(default)]
    pub staff: BTreeMap<Tier, usize>,
    #[serde(default)]
    pub desired_off: BTreeMap<StaffId, BTreeSet<Day>>,
    #[serde(default)]
    pub updates: Vec<ScheduleUpdate>,
    #[serde(default)]
    pub assignments: Vec<ScenarioCell>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioCell {
    pub date: Day,
    pub staff_id: StaffId,
    #[serde(default)]
    pub is_working: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_yaml::from_str(&data)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub fn month(&self) -> anyhow::Result<Month> {
        match self.month {
            Some(month) => Ok(month),
            None => Month::of(Local::now().date_naive())
                .next()
                .context("no month after the current one"),
        }
    }

    pub fn build(&self, config: &Config) -> anyhow::Result<Coordinator> {
        let mut coordinator = Coordinator::new(config, self.month()?)?;

        if let Some(work_days) = self.work_days {
            coordinator.set_work_days_for_all(work_days);
        }
        for (&tier, &count) in &self.staff {
            coordinator
                .set_tier_count(tier, count)
                .with_context(|| format!("failed to set tier {tier} head count"))?;
        }
        for (&id, days) in &self.desired_off {
            let Some(member) = coordinator.roster().get(id) else {
                bail!("desired_off names unknown staff id {id}");
            };
            let mut member = member.clone();
            member.desired_off_days = days.clone();
            coordinator.update_staff(member)?;
        }
        for (i, update) in self.updates.iter().enumerate() {
            coordinator
                .update_schedule(update.clone())
                .with_context(|| format!("update #{} ({update:?}) rejected", i + 1))?;
        }
        for cell in &self.assignments {
            coordinator.set_cell(
                cell.date,
                cell.staff_id,
                CellPatch {
                    is_working: cell.is_working,
                    locked: cell.locked,
                },
            );
        }

        tracing::debug!(
            month = %coordinator.schedule().month,
            staff = coordinator.staff().len(),
            cells = coordinator.grid().len(),
            "scenario loaded"
        );
        Ok(coordinator)
    }
}
