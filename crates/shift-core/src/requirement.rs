//! Projection of a [`ScheduleConfig`] into one requirement per calendar day.

use crate::error::{Result, ShiftError};
use crate::schedule::ScheduleConfig;
use crate::types::{Day, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRequirement {
    pub date: Day,
    pub required_staff_count: u32,
    pub required_attendance_tiers: BTreeSet<Tier>,
    pub required_attendance_tier_count: u32,
}

/// One [`DayRequirement`] per day of the month, in ascending date order.
///
/// Staffing comes from the day's override when present, otherwise from the
/// busy/normal classification. Closed days require nobody, whatever their
/// overrides say. A day that is both closed and busy is an
/// error rather than being resolved either way.
pub fn project(config: &ScheduleConfig) -> Result<Vec<DayRequirement>> {
    if let Some(&day) = config.closed_days.intersection(&config.busy_days).next() {
        return Err(ShiftError::ConfigInconsistency { day });
    }

    let requirements = config
        .month
        .days()
        .map(|date| {
            let closed = config.closed_days.contains(&date);

            let base_count = if config.busy_days.contains(&date) {
                config.required_staff_count_on_busy
            } else {
                config.required_staff_count_on_normal
            };
            let required_staff_count = if closed {
                0
            } else {
                config
                    .override_required_staff_count
                    .get(&date)
                    .copied()
                    .unwrap_or(base_count)
            };

            let (required_attendance_tiers, required_attendance_tier_count) = if closed {
                (BTreeSet::new(), 0)
            } else {
                (
                    config
                        .override_required_attendance_tiers
                        .get(&date)
                        .unwrap_or(&config.required_attendance_tiers)
                        .clone(),
                    config
                        .override_required_attendance_tier_count
                        .get(&date)
                        .copied()
                        .unwrap_or(config.required_attendance_tier_count),
                )
            };

            DayRequirement {
                date,
                required_staff_count,
                required_attendance_tiers,
                required_attendance_tier_count,
            }
        })
        .collect();

    Ok(requirements)
}
