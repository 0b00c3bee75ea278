use crate::calendar::{restricted_days, HolidayCalendar};
use crate::error::{Result, ShiftError};
use crate::types::{Day, DayStatus, Month, Tier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// ScheduleDefaults
// ---------------------------------------------------------------------------

/// Month-wide requirement values a fresh month starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDefaults {
    #[serde(default = "default_attendance_tiers")]
    pub required_attendance_tiers: BTreeSet<Tier>,
    #[serde(default)]
    pub required_attendance_tier_count: u32,
    #[serde(default = "default_staff_count")]
    pub required_staff_count_on_normal: u32,
    #[serde(default = "default_staff_count")]
    pub required_staff_count_on_busy: u32,
}

fn default_attendance_tiers() -> BTreeSet<Tier> {
    BTreeSet::from([Tier::MANAGER, Tier::DAY_MANAGER])
}

fn default_staff_count() -> u32 {
    1
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            required_attendance_tiers: default_attendance_tiers(),
            required_attendance_tier_count: 0,
            required_staff_count_on_normal: default_staff_count(),
            required_staff_count_on_busy: default_staff_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub month: Month,
    pub closed_days: BTreeSet<Day>,
    pub busy_days: BTreeSet<Day>,
    pub required_attendance_tiers: BTreeSet<Tier>,
    pub required_attendance_tier_count: u32,
    pub required_staff_count_on_normal: u32,
    pub required_staff_count_on_busy: u32,
    #[serde(default)]
    pub override_required_attendance_tiers: BTreeMap<Day, BTreeSet<Tier>>,
    #[serde(default)]
    pub override_required_attendance_tier_count: BTreeMap<Day, u32>,
    #[serde(default)]
    pub override_required_staff_count: BTreeMap<Day, u32>,
}

impl ScheduleConfig {
    /// A fresh month: defaults everywhere, weekends and holidays marked busy.
    pub fn for_month(
        month: Month,
        defaults: &ScheduleDefaults,
        calendar: &dyn HolidayCalendar,
    ) -> Self {
        Self {
            month,
            closed_days: BTreeSet::new(),
            busy_days: restricted_days(month, calendar),
            required_attendance_tiers: defaults.required_attendance_tiers.clone(),
            required_attendance_tier_count: defaults.required_attendance_tier_count,
            required_staff_count_on_normal: defaults.required_staff_count_on_normal,
            required_staff_count_on_busy: defaults.required_staff_count_on_busy,
            override_required_attendance_tiers: BTreeMap::new(),
            override_required_attendance_tier_count: BTreeMap::new(),
            override_required_staff_count: BTreeMap::new(),
        }
    }

    pub fn day_status(&self, day: Day) -> DayStatus {
        if self.closed_days.contains(&day) {
            DayStatus::Closed
        } else if self.busy_days.contains(&day) {
            DayStatus::Busy
        } else {
            DayStatus::Normal
        }
    }

    pub fn day_override(&self, day: Day) -> DayOverride {
        DayOverride {
            required_staff_count: self.override_required_staff_count.get(&day).copied(),
            required_attendance_tiers: self.override_required_attendance_tiers.get(&day).cloned(),
            required_attendance_tier_count: self
                .override_required_attendance_tier_count
                .get(&day)
                .copied(),
        }
    }

    fn remove_overrides(&mut self, day: Day) {
        self.override_required_attendance_tiers.remove(&day);
        self.override_required_attendance_tier_count.remove(&day);
        self.override_required_staff_count.remove(&day);
    }
}

/// Per-day exceptions to the month-wide requirement values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_staff_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_attendance_tiers: Option<BTreeSet<Tier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_attendance_tier_count: Option<u32>,
}

impl DayOverride {
    pub fn is_empty(&self) -> bool {
        self.required_staff_count.is_none()
            && self.required_attendance_tiers.is_none()
            && self.required_attendance_tier_count.is_none()
    }
}

// ---------------------------------------------------------------------------
// ScheduleUpdate
// ---------------------------------------------------------------------------

/// A change to the schedule configuration, grouped by the fields it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleUpdate {
    /// Switch to another month. Resets everything else.
    Month { month: Month },
    /// Replace the closed and/or busy day sets. Closed wins on conflict.
    DayStatus {
        #[serde(default)]
        closed_days: Option<BTreeSet<Day>>,
        #[serde(default)]
        busy_days: Option<BTreeSet<Day>>,
    },
    /// Change the status of a single day.
    SetDayStatus { day: Day, status: DayStatus },
    StaffCounts {
        #[serde(default)]
        normal: Option<u32>,
        #[serde(default)]
        busy: Option<u32>,
    },
    AttendanceTiers {
        #[serde(default)]
        tiers: Option<BTreeSet<Tier>>,
        #[serde(default)]
        count: Option<u32>,
    },
    /// Set the given fields of a day's override; absent fields are left as they are.
    SetOverride {
        day: Day,
        #[serde(flatten)]
        value: DayOverride,
    },
    ClearOverride { day: Day },
}

/// What an applied update replaced, for downstream reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleChange {
    pub previous_month: Month,
    pub previous_closed_days: BTreeSet<Day>,
    pub month_changed: bool,
}

// ---------------------------------------------------------------------------
// ScheduleConfigStore
// ---------------------------------------------------------------------------

pub struct ScheduleConfigStore {
    config: ScheduleConfig,
    defaults: ScheduleDefaults,
    calendar: Box<dyn HolidayCalendar>,
}

impl std::fmt::Debug for ScheduleConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleConfigStore")
            .field("config", &self.config)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ScheduleConfigStore {
    pub fn new(month: Month, defaults: ScheduleDefaults, calendar: Box<dyn HolidayCalendar>) -> Self {
        let config = ScheduleConfig::for_month(month, &defaults, calendar.as_ref());
        Self {
            config,
            defaults,
            calendar,
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn defaults(&self) -> &ScheduleDefaults {
        &self.defaults
    }

    /// Validates and merges `update`. On error the config is unchanged.
    pub fn apply(&mut self, update: ScheduleUpdate) -> Result<ScheduleChange> {
        let change = ScheduleChange {
            previous_month: self.config.month,
            previous_closed_days: self.config.closed_days.clone(),
            month_changed: false,
        };

        match update {
            ScheduleUpdate::Month { month } => {
                if month == self.config.month {
                    return Ok(change);
                }
                self.config = ScheduleConfig::for_month(month, &self.defaults, self.calendar.as_ref());
                tracing::debug!(
                    month = %month,
                    busy_days = self.config.busy_days.len(),
                    "schedule reset for new month"
                );
                return Ok(ScheduleChange {
                    month_changed: true,
                    ..change
                });
            }
            ScheduleUpdate::DayStatus {
                closed_days,
                busy_days,
            } => {
                for day in closed_days.iter().chain(busy_days.iter()).flatten() {
                    self.check_day(*day)?;
                }
                self.set_day_sets(closed_days, busy_days);
            }
            ScheduleUpdate::SetDayStatus { day, status } => {
                self.check_day(day)?;
                let mut closed = self.config.closed_days.clone();
                let mut busy = self.config.busy_days.clone();
                match status {
                    DayStatus::Normal => {
                        closed.remove(&day);
                        busy.remove(&day);
                        self.set_day_sets(Some(closed), Some(busy));
                    }
                    DayStatus::Busy => {
                        busy.insert(day);
                        self.set_day_sets(None, Some(busy));
                    }
                    DayStatus::Closed => {
                        closed.insert(day);
                        self.set_day_sets(Some(closed), None);
                    }
                }
            }
            ScheduleUpdate::StaffCounts { normal, busy } => {
                if let Some(n) = normal {
                    self.config.required_staff_count_on_normal = n;
                }
                if let Some(b) = busy {
                    self.config.required_staff_count_on_busy = b;
                }
            }
            ScheduleUpdate::AttendanceTiers { tiers, count } => {
                if let Some(t) = tiers {
                    self.config.required_attendance_tiers = t;
                }
                if let Some(c) = count {
                    self.config.required_attendance_tier_count = c;
                }
            }
            ScheduleUpdate::SetOverride { day, value } => {
                self.check_day(day)?;
                if self.config.closed_days.contains(&day) {
                    return Err(ShiftError::OverrideOnClosedDay(day));
                }
                if let Some(n) = value.required_staff_count {
                    self.config.override_required_staff_count.insert(day, n);
                }
                if let Some(t) = value.required_attendance_tiers {
                    self.config.override_required_attendance_tiers.insert(day, t);
                }
                if let Some(c) = value.required_attendance_tier_count {
                    self.config
                        .override_required_attendance_tier_count
                        .insert(day, c);
                }
            }
            ScheduleUpdate::ClearOverride { day } => {
                self.check_day(day)?;
                self.config.remove_overrides(day);
            }
        }

        Ok(change)
    }

    /// Applies the closed/busy exclusion rules and prunes overrides on closed days.
    fn set_day_sets(&mut self, closed: Option<BTreeSet<Day>>, busy: Option<BTreeSet<Day>>) {
        let (closed, busy) = match (closed, busy) {
            (Some(closed), Some(busy)) => {
                let busy = busy.difference(&closed).copied().collect();
                (closed, busy)
            }
            (Some(closed), None) => {
                let busy = self.config.busy_days.difference(&closed).copied().collect();
                (closed, busy)
            }
            (None, Some(busy)) => {
                let closed = self.config.closed_days.difference(&busy).copied().collect();
                (closed, busy)
            }
            (None, None) => return,
        };

        self.config.closed_days = closed;
        self.config.busy_days = busy;

        let closed: Vec<Day> = self.config.closed_days.iter().copied().collect();
        for day in closed {
            self.config.remove_overrides(day);
        }
    }

    fn check_day(&self, day: Day) -> Result<()> {
        if self.config.month.contains_day(day) {
            Ok(())
        } else {
            Err(ShiftError::DayOutOfRange {
                day,
                days_in_month: self.config.month.days_in_month(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::StaticCalendar;

    fn days(list: &[Day]) -> BTreeSet<Day> {
        list.iter().copied().collect()
    }

    fn store(month: &str) -> ScheduleConfigStore {
        ScheduleConfigStore::new(
            month.parse().unwrap(),
            ScheduleDefaults::default(),
            Box::new(StaticCalendar::default()),
        )
    }

    fn assert_disjoint(config: &ScheduleConfig) {
        assert!(
            config.closed_days.is_disjoint(&config.busy_days),
            "closed {:?} overlaps busy {:?}",
            config.closed_days,
            config.busy_days
        );
    }

    #[test]
    fn co_update_closed_wins() {
        let mut s = store("2024-06");
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: Some(days(&[10, 21])),
            busy_days: Some(days(&[10])),
        })
        .unwrap();
        assert_eq!(s.config().closed_days, days(&[10, 21]));
        assert!(s.config().busy_days.is_empty());
    }

    #[test]
    fn closed_only_filters_busy() {
        let mut s = store("2024-06");
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: None,
            busy_days: Some(days(&[1, 2, 3])),
        })
        .unwrap();
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: Some(days(&[2])),
            busy_days: None,
        })
        .unwrap();
        assert_eq!(s.config().closed_days, days(&[2]));
        assert_eq!(s.config().busy_days, days(&[1, 3]));

        // Reopening day 2 does not make it busy again.
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: Some(BTreeSet::new()),
            busy_days: None,
        })
        .unwrap();
        assert_eq!(s.config().busy_days, days(&[1, 3]));
        assert_disjoint(s.config());
    }

    #[test]
    fn busy_only_filters_closed() {
        let mut s = store("2024-06");
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: Some(days(&[5, 6])),
            busy_days: None,
        })
        .unwrap();
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: None,
            busy_days: Some(days(&[6, 7])),
        })
        .unwrap();
        assert_eq!(s.config().closed_days, days(&[5]));
        assert_eq!(s.config().busy_days, days(&[6, 7]));
    }

    #[test]
    fn closing_a_day_prunes_its_overrides() {
        let mut s = store("2024-06");
        s.apply(ScheduleUpdate::SetOverride {
            day: 10,
            value: DayOverride {
                required_staff_count: Some(4),
                required_attendance_tiers: Some(BTreeSet::from([Tier::MANAGER])),
                required_attendance_tier_count: Some(1),
            },
        })
        .unwrap();
        s.apply(ScheduleUpdate::SetOverride {
            day: 11,
            value: DayOverride {
                required_staff_count: Some(2),
                ..Default::default()
            },
        })
        .unwrap();

        s.apply(ScheduleUpdate::SetDayStatus {
            day: 10,
            status: DayStatus::Closed,
        })
        .unwrap();

        assert!(s.config().day_override(10).is_empty());
        assert_eq!(s.config().day_override(11).required_staff_count, Some(2));
    }

    #[test]
    fn override_on_closed_day_is_rejected() {
        let mut s = store("2024-06");
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: Some(days(&[10])),
            busy_days: None,
        })
        .unwrap();
        let before = s.config().clone();
        let err = s
            .apply(ScheduleUpdate::SetOverride {
                day: 10,
                value: DayOverride {
                    required_staff_count: Some(3),
                    ..Default::default()
                },
            })
            .unwrap_err();
        assert!(matches!(err, ShiftError::OverrideOnClosedDay(10)));
        assert_eq!(s.config(), &before);
    }

    #[test]
    fn days_outside_month_are_rejected() {
        let mut s = store("2024-06");
        let err = s
            .apply(ScheduleUpdate::DayStatus {
                closed_days: Some(days(&[31])),
                busy_days: None,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ShiftError::DayOutOfRange {
                day: 31,
                days_in_month: 30
            }
        ));
        assert!(s.config().closed_days.is_empty());
    }

    #[test]
    fn month_change_resets_everything() {
        let mut s = ScheduleConfigStore::new(
            "2024-05".parse().unwrap(),
            ScheduleDefaults::default(),
            Box::new(StaticCalendar::weekends_only()),
        );
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: Some(days(&[7])),
            busy_days: None,
        })
        .unwrap();
        s.apply(ScheduleUpdate::StaffCounts {
            normal: Some(5),
            busy: Some(8),
        })
        .unwrap();
        s.apply(ScheduleUpdate::SetOverride {
            day: 9,
            value: DayOverride {
                required_staff_count: Some(2),
                ..Default::default()
            },
        })
        .unwrap();

        let change = s
            .apply(ScheduleUpdate::Month {
                month: "2024-06".parse().unwrap(),
            })
            .unwrap();

        assert!(change.month_changed);
        assert_eq!(change.previous_closed_days, days(&[7]));
        let config = s.config();
        assert_eq!(config.month.to_string(), "2024-06");
        assert!(config.closed_days.is_empty());
        assert_eq!(config.busy_days, days(&[1, 2, 8, 9, 15, 16, 22, 23, 29, 30]));
        assert_eq!(config.required_staff_count_on_normal, 1);
        assert_eq!(config.required_staff_count_on_busy, 1);
        assert!(config.override_required_staff_count.is_empty());
    }

    #[test]
    fn same_month_is_noop() {
        let mut s = store("2024-06");
        s.apply(ScheduleUpdate::DayStatus {
            closed_days: Some(days(&[3])),
            busy_days: None,
        })
        .unwrap();
        let change = s
            .apply(ScheduleUpdate::Month {
                month: "2024-06".parse().unwrap(),
            })
            .unwrap();
        assert!(!change.month_changed);
        assert_eq!(s.config().closed_days, days(&[3]));
    }

    #[test]
    fn single_day_toggles_keep_sets_disjoint() {
        let mut s = store("2024-06");
        for (day, status) in [
            (4, DayStatus::Busy),
            (4, DayStatus::Closed),
            (5, DayStatus::Closed),
            (5, DayStatus::Busy),
            (6, DayStatus::Busy),
            (6, DayStatus::Normal),
        ] {
            s.apply(ScheduleUpdate::SetDayStatus { day, status }).unwrap();
            assert_disjoint(s.config());
        }
        assert_eq!(s.config().day_status(4), DayStatus::Closed);
        assert_eq!(s.config().day_status(5), DayStatus::Busy);
        assert_eq!(s.config().day_status(6), DayStatus::Normal);
    }

    #[test]
    fn update_deserializes_from_tagged_yaml() {
        let yaml = "type: set_override\nday: 12\nrequired_staff_count: 3\n";
        let update: ScheduleUpdate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            update,
            ScheduleUpdate::SetOverride {
                day: 12,
                value: DayOverride {
                    required_staff_count: Some(3),
                    ..Default::default()
                },
            }
        );
    }
}
