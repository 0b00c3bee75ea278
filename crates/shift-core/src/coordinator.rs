//! Facade over the roster, schedule and grid stores.
//!
//! Every mutation runs the same chain before returning:
//! store update → requirement projection → grid reconciliation.
//! Callers therefore never observe a grid that disagrees with the roster or
//! the schedule.

use crate::calendar::HolidayCalendar;
use crate::config::Config;
use crate::error::Result;
use crate::grid::{AssignmentCell, AssignmentGrid, CellPatch};
use crate::optimizer::Optimizer;
use crate::request::{build_request, OptimizeRequest};
use crate::requirement::{project, DayRequirement};
use crate::roster::{StaffMember, StaffRoster};
use crate::schedule::{ScheduleConfig, ScheduleConfigStore, ScheduleUpdate};
use crate::types::{Day, DayStatus, Month, StaffId, Tier};
use serde::Serialize;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffSummary {
    pub staff_id: StaffId,
    pub name: String,
    pub tier: Tier,
    pub work_days: u32,
    /// Days off implied by the target: days in month minus `work_days`.
    pub days_off: u32,
    pub assigned_days: usize,
    /// Assigned days the member asked to have off.
    pub desired_off_conflicts: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCoverage {
    pub date: Day,
    pub status: DayStatus,
    pub required: u32,
    pub assigned: usize,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Coordinator {
    roster: StaffRoster,
    schedule: ScheduleConfigStore,
    grid: AssignmentGrid,
    requirements: Vec<DayRequirement>,
    revision: u64,
    in_flight: usize,
}

/// An optimizer call in flight: its payload and the revision it was built from.
#[derive(Debug, Clone)]
pub struct PendingOptimize {
    pub request: OptimizeRequest,
    pub revision: u64,
}

impl Coordinator {
    /// Builds a session for `month` using the calendar described by `config`.
    pub fn new(config: &Config, month: Month) -> Result<Self> {
        Self::with_calendar(config, month, Box::new(config.calendar.calendar()))
    }

    pub fn with_calendar(
        config: &Config,
        month: Month,
        calendar: Box<dyn HolidayCalendar>,
    ) -> Result<Self> {
        let roster = if config.roster.seed_one_per_tier {
            StaffRoster::with_one_per_tier(config.roster.default_work_days)
        } else {
            StaffRoster::new(config.roster.default_work_days)
        };
        let schedule = ScheduleConfigStore::new(month, config.schedule.clone(), calendar);

        let mut coordinator = Self {
            roster,
            schedule,
            grid: AssignmentGrid::new(),
            requirements: Vec::new(),
            revision: 0,
            in_flight: 0,
        };
        coordinator.sync(&BTreeSet::new())?;
        Ok(coordinator)
    }

    // ---------------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------------

    pub fn staff(&self) -> &[StaffMember] {
        self.roster.staff()
    }

    pub fn roster(&self) -> &StaffRoster {
        &self.roster
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        self.schedule.config()
    }

    pub fn requirements(&self) -> &[DayRequirement] {
        &self.requirements
    }

    pub fn grid(&self) -> &AssignmentGrid {
        &self.grid
    }

    /// Incremented by every mutation, including optimizer responses.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True while at least one optimizer request has not completed.
    pub fn is_optimizing(&self) -> bool {
        self.in_flight > 0
    }

    // ---------------------------------------------------------------------------
    // Roster mutations
    // ---------------------------------------------------------------------------

    /// Adds a member of `tier` and returns its id.
    pub fn add_staff(&mut self, tier: Tier) -> Result<StaffId> {
        let id = self
            .roster
            .add(tier)
            .iter()
            .map(|s| s.id)
            .max()
            .unwrap_or_default();
        self.resync()?;
        Ok(id)
    }

    pub fn remove_staff(&mut self, id: StaffId) -> Result<bool> {
        if !self.roster.remove(id) {
            tracing::warn!(staff_id = id, "ignoring removal of unknown staff member");
            return Ok(false);
        }
        self.resync()?;
        Ok(true)
    }

    pub fn update_staff(&mut self, staff: StaffMember) -> Result<bool> {
        if !self.roster.update(staff) {
            return Ok(false);
        }
        self.resync()?;
        Ok(true)
    }

    pub fn set_work_days_for_all(&mut self, work_days: u32) {
        self.roster.set_work_days_for_all(work_days);
        self.revision += 1;
    }

    /// Adds or removes members so exactly `count` hold `tier`. Returns removed ids.
    pub fn set_tier_count(&mut self, tier: Tier, count: usize) -> Result<Vec<StaffId>> {
        let removed = self.roster.set_tier_count(tier, count);
        self.resync()?;
        Ok(removed)
    }

    // ---------------------------------------------------------------------------
    // Schedule mutations
    // ---------------------------------------------------------------------------

    pub fn update_schedule(&mut self, update: ScheduleUpdate) -> Result<()> {
        let change = self.schedule.apply(update)?;
        if change.month_changed {
            tracing::debug!(
                from = %change.previous_month,
                to = %self.schedule.config().month,
                "carrying assignments into new month"
            );
        }
        self.sync(&change.previous_closed_days)
    }

    // ---------------------------------------------------------------------------
    // Grid edits
    // ---------------------------------------------------------------------------

    /// Edits one cell. Closed days and unknown keys are left untouched.
    pub fn set_cell(&mut self, date: Day, staff_id: StaffId, patch: CellPatch) -> bool {
        if self.schedule.config().closed_days.contains(&date) {
            tracing::warn!(date, staff_id, "ignoring edit of a closed day");
            return false;
        }
        if !self.grid.set_cell(date, staff_id, patch) {
            tracing::warn!(date, staff_id, "ignoring edit of unknown assignment cell");
            return false;
        }
        self.revision += 1;
        true
    }

    pub fn replace_assignments(&mut self, cells: Vec<AssignmentCell>) -> Result<()> {
        self.grid.replace_all(cells)?;
        self.revision += 1;
        Ok(())
    }

    pub fn build_request(&self) -> OptimizeRequest {
        build_request(self.roster.staff(), &self.requirements, &self.grid)
    }

    // ---------------------------------------------------------------------------
    // Optimizer round trip
    // ---------------------------------------------------------------------------

    /// Marks an optimizer call as in flight and returns its payload.
    ///
    /// Edits remain allowed until the response arrives.
    pub fn begin_optimize(&mut self) -> PendingOptimize {
        if self.in_flight > 0 {
            tracing::debug!(in_flight = self.in_flight, "optimizer call already in flight");
        }
        self.in_flight += 1;
        PendingOptimize {
            request: self.build_request(),
            revision: self.revision,
        }
    }

    /// True when the state changed after `pending` was issued.
    pub fn is_stale(&self, pending: &PendingOptimize) -> bool {
        pending.revision != self.revision
    }

    /// Applies the response to `pending` and clears one in-flight marker.
    ///
    /// A response to a request issued before later edits is still applied;
    /// the overwrite is logged.
    pub fn complete_optimize(
        &mut self,
        pending: &PendingOptimize,
        cells: Vec<AssignmentCell>,
    ) -> Result<()> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.is_stale(pending) {
            tracing::warn!(
                requested_at = pending.revision,
                current = self.revision,
                "applying optimizer response over newer edits"
            );
        }
        self.replace_assignments(cells)
    }

    /// Clears one in-flight marker after a failed call.
    pub fn abandon_optimize(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn optimize(&mut self, optimizer: &dyn Optimizer) -> Result<()> {
        let pending = self.begin_optimize();
        match optimizer.optimize(&pending.request) {
            Ok(cells) => self.complete_optimize(&pending, cells),
            Err(e) => {
                self.abandon_optimize();
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------------
    // Summaries
    // ---------------------------------------------------------------------------

    pub fn staff_summaries(&self) -> Vec<StaffSummary> {
        let days_in_month = self.schedule.config().month.days_in_month();
        self.roster
            .staff()
            .iter()
            .map(|s| {
                let assigned = self.grid.assigned_days(s.id);
                StaffSummary {
                    staff_id: s.id,
                    name: s.name.clone(),
                    tier: s.tier,
                    work_days: s.work_days,
                    days_off: days_in_month.saturating_sub(s.work_days),
                    assigned_days: assigned.len(),
                    desired_off_conflicts: assigned
                        .into_iter()
                        .filter(|d| s.desired_off_days.contains(d))
                        .collect(),
                }
            })
            .collect()
    }

    pub fn coverage(&self) -> Vec<DayCoverage> {
        let config = self.schedule.config();
        self.requirements
            .iter()
            .map(|r| DayCoverage {
                date: r.date,
                status: config.day_status(r.date),
                required: r.required_staff_count,
                assigned: self.grid.working_count(r.date),
            })
            .collect()
    }

    // ---------------------------------------------------------------------------
    // Sequencing
    // ---------------------------------------------------------------------------

    fn resync(&mut self) -> Result<()> {
        let closed = self.schedule.config().closed_days.clone();
        self.sync(&closed)
    }

    fn sync(&mut self, previous_closed_days: &BTreeSet<Day>) -> Result<()> {
        let config = self.schedule.config();
        self.requirements = project(config)?;
        self.grid.reconcile(
            self.roster.staff(),
            &self.requirements,
            &config.closed_days,
            previous_closed_days,
        );
        self.revision += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::StaticCalendar;
    use crate::error::ShiftError;
    use crate::schedule::DayOverride;
    use std::cell::RefCell;

    fn coordinator(month: &str) -> Coordinator {
        Coordinator::with_calendar(
            &Config::default(),
            month.parse().unwrap(),
            Box::new(StaticCalendar::default()),
        )
        .unwrap()
    }

    fn days(list: &[Day]) -> BTreeSet<Day> {
        list.iter().copied().collect()
    }

    fn close(c: &mut Coordinator, list: &[Day]) {
        c.update_schedule(ScheduleUpdate::DayStatus {
            closed_days: Some(days(list)),
            busy_days: None,
        })
        .unwrap();
    }

    fn work(is_working: bool, locked: bool) -> CellPatch {
        CellPatch {
            is_working: Some(is_working),
            locked: Some(locked),
        }
    }

    /// Echoes the grid back with every unlocked cell flipped to working.
    struct EchoOptimizer;

    impl Optimizer for EchoOptimizer {
        fn optimize(&self, request: &OptimizeRequest) -> Result<Vec<AssignmentCell>> {
            let mut cells = Vec::new();
            for shift in &request.shifts {
                for staff in &request.staffs {
                    let locked = request
                        .locked
                        .iter()
                        .find(|l| l.date == shift.date && l.staff_id == staff.id);
                    cells.push(AssignmentCell {
                        date: shift.date,
                        staff_id: staff.id,
                        is_working: locked.map_or(true, |l| l.is_working),
                        locked: locked.is_some(),
                    });
                }
            }
            Ok(cells)
        }
    }

    struct FailingOptimizer;

    impl Optimizer for FailingOptimizer {
        fn optimize(&self, _request: &OptimizeRequest) -> Result<Vec<AssignmentCell>> {
            Err(ShiftError::Optimizer("503 Service Unavailable".to_string()))
        }
    }

    #[test]
    fn thirty_day_month_with_two_closed_days() {
        let mut c = coordinator("2024-06");
        close(&mut c, &[10, 21]);

        assert_eq!(c.grid().len(), 150);
        for cell in c.grid().cells().iter().filter(|c| c.date == 10 || c.date == 21) {
            assert!(!cell.is_working && cell.locked);
        }
        let day10 = &c.requirements()[9];
        assert_eq!(day10.required_staff_count, 0);
        assert_eq!(day10.required_attendance_tier_count, 0);
        assert!(day10.required_attendance_tiers.is_empty());
    }

    #[test]
    fn co_update_keeps_closed_and_busy_disjoint() {
        let mut c = coordinator("2024-06");
        c.update_schedule(ScheduleUpdate::DayStatus {
            closed_days: Some(days(&[10, 21])),
            busy_days: Some(days(&[10])),
        })
        .unwrap();
        assert_eq!(c.schedule().closed_days, days(&[10, 21]));
        assert!(c.schedule().busy_days.is_empty());
    }

    #[test]
    fn adding_staff_preserves_edits() {
        let mut c = coordinator("2024-06");
        close(&mut c, &[10]);
        assert!(c.set_cell(3, 1, work(true, true)));
        assert!(c.set_cell(4, 2, work(true, false)));
        let before = c.grid().cells().to_vec();

        let id = c.add_staff(Tier::UPPER).unwrap();
        assert_eq!(id, 6);
        assert_eq!(c.grid().len(), 180);
        for old in before {
            assert_eq!(c.grid().cell(old.date, old.staff_id), Some(&old));
        }
    }

    #[test]
    fn removing_staff_drops_their_cells() {
        let mut c = coordinator("2024-06");
        assert!(c.remove_staff(2).unwrap());
        assert!(!c.remove_staff(2).unwrap());
        assert_eq!(c.grid().len(), 120);
        assert!(c.grid().cells().iter().all(|cell| cell.staff_id != 2));
    }

    #[test]
    fn removing_every_member_empties_the_grid() {
        let mut c = coordinator("2024-06");
        for id in 1..=5 {
            c.remove_staff(id).unwrap();
        }
        assert!(c.grid().is_empty());
    }

    #[test]
    fn reopening_a_day_releases_locks() {
        let mut c = coordinator("2024-06");
        close(&mut c, &[10, 11]);
        close(&mut c, &[11]);

        assert!(c
            .grid()
            .cells()
            .iter()
            .filter(|cell| cell.date == 10)
            .all(|cell| !cell.locked));
        assert!(c
            .grid()
            .cells()
            .iter()
            .filter(|cell| cell.date == 11)
            .all(|cell| cell.locked));
    }

    #[test]
    fn closing_a_day_forces_edited_cells() {
        let mut c = coordinator("2024-06");
        c.set_cell(12, 1, work(true, false));
        c.update_schedule(ScheduleUpdate::SetDayStatus {
            day: 12,
            status: DayStatus::Closed,
        })
        .unwrap();
        assert_eq!(
            c.grid().cell(12, 1),
            Some(&AssignmentCell {
                date: 12,
                staff_id: 1,
                is_working: false,
                locked: true,
            })
        );
        assert!(!c.set_cell(12, 1, work(true, false)));
    }

    #[test]
    fn closed_day_override_is_pruned() {
        let mut c = coordinator("2024-06");
        c.update_schedule(ScheduleUpdate::SetOverride {
            day: 14,
            value: DayOverride {
                required_staff_count: Some(4),
                required_attendance_tier_count: Some(2),
                ..Default::default()
            },
        })
        .unwrap();
        assert_eq!(c.requirements()[13].required_staff_count, 4);

        close(&mut c, &[14]);
        assert_eq!(c.requirements()[13].required_staff_count, 0);
        assert_eq!(c.requirements()[13].required_attendance_tier_count, 0);
        assert!(c.schedule().day_override(14).is_empty());
    }

    #[test]
    fn month_change_keeps_surviving_cells() {
        let mut c = coordinator("2024-06");
        close(&mut c, &[12]);
        c.set_cell(5, 1, work(true, true));
        c.set_cell(6, 2, work(true, false));
        c.update_schedule(ScheduleUpdate::Month {
            month: "2024-07".parse().unwrap(),
        })
        .unwrap();

        assert_eq!(c.requirements().len(), 31);
        assert_eq!(c.grid().len(), 155);
        let kept = |date, staff_id| {
            c.grid()
                .cell(date, staff_id)
                .map(|cell| (cell.is_working, cell.locked))
        };
        assert_eq!(kept(5, 1), Some((true, true)));
        assert_eq!(kept(6, 2), Some((true, false)));
        // Closed in June, open in July.
        assert!(c
            .grid()
            .cells()
            .iter()
            .filter(|cell| cell.date == 12)
            .all(|cell| !cell.is_working && !cell.locked));
        assert_eq!(kept(31, 1), Some((false, false)));
    }

    #[test]
    fn shorter_month_drops_trailing_days() {
        let mut c = coordinator("2024-01");
        c.set_cell(31, 1, work(true, true));
        c.set_cell(3, 1, work(true, false));
        c.update_schedule(ScheduleUpdate::Month {
            month: "2024-02".parse().unwrap(),
        })
        .unwrap();

        assert_eq!(c.grid().len(), 29 * 5);
        assert!(c.grid().cell(31, 1).is_none());
        assert!(c.grid().cell(3, 1).unwrap().is_working);
    }

    #[test]
    fn request_and_same_shaped_response_roundtrip() {
        let mut c = coordinator("2024-06");
        close(&mut c, &[10, 21]);
        c.set_cell(1, 1, work(false, true));

        let pending = c.begin_optimize();
        assert!(c.is_optimizing());
        assert!(!c.is_stale(&pending));
        assert_eq!(pending.request.locked.len(), 11);

        let response = EchoOptimizer.optimize(&pending.request).unwrap();
        c.complete_optimize(&pending, response).unwrap();

        assert!(!c.is_optimizing());
        assert_eq!(c.grid().len(), c.staff().len() * 30);
        assert!(!c.grid().cell(1, 1).unwrap().is_working);
        assert!(c.grid().cell(2, 1).unwrap().is_working);
        assert_eq!(c.grid().working_count(10), 0);
    }

    #[test]
    fn stale_response_is_still_applied() {
        let mut c = coordinator("2024-06");
        let pending = c.begin_optimize();
        c.set_cell(2, 2, work(false, true));
        assert!(c.is_stale(&pending));
        let response = EchoOptimizer.optimize(&pending.request).unwrap();
        c.complete_optimize(&pending, response).unwrap();
        assert!(c.grid().cell(2, 2).unwrap().is_working);
    }

    #[test]
    fn overlapping_calls_track_their_own_revision() {
        let mut c = coordinator("2024-06");
        let first = c.begin_optimize();
        c.set_cell(2, 2, work(true, false));
        let second = c.begin_optimize();

        assert!(c.is_stale(&first));
        assert!(!c.is_stale(&second));

        let response = EchoOptimizer.optimize(&first.request).unwrap();
        c.complete_optimize(&first, response).unwrap();
        assert!(c.is_optimizing());
        // The first response moved the grid on.
        assert!(c.is_stale(&second));

        let response = EchoOptimizer.optimize(&second.request).unwrap();
        c.complete_optimize(&second, response).unwrap();
        assert!(!c.is_optimizing());
    }

    #[test]
    fn response_for_an_older_roster_is_rejected() {
        let mut c = coordinator("2024-06");
        let pending = c.begin_optimize();
        c.add_staff(Tier::JUNIOR).unwrap();
        let before = c.grid().clone();

        let response = EchoOptimizer.optimize(&pending.request).unwrap();
        let err = c.complete_optimize(&pending, response).unwrap_err();
        assert!(matches!(
            err,
            ShiftError::GridCardinalityMismatch {
                expected: 180,
                actual: 150
            }
        ));
        assert_eq!(c.grid(), &before);
        assert!(!c.is_optimizing());
    }

    #[test]
    fn failed_optimize_clears_busy_flag() {
        let mut c = coordinator("2024-06");
        assert!(c.optimize(&FailingOptimizer).is_err());
        assert!(!c.is_optimizing());

        c.optimize(&EchoOptimizer).unwrap();
        assert_eq!(c.grid().working_count(1), 5);
    }

    #[test]
    fn optimizer_sees_current_state() {
        struct Recording(RefCell<Vec<usize>>);
        impl Optimizer for Recording {
            fn optimize(&self, request: &OptimizeRequest) -> Result<Vec<AssignmentCell>> {
                self.0.borrow_mut().push(request.staffs.len());
                EchoOptimizer.optimize(request)
            }
        }

        let mut c = coordinator("2024-06");
        let recorder = Recording(RefCell::new(Vec::new()));
        c.optimize(&recorder).unwrap();
        c.set_tier_count(Tier::JUNIOR, 3).unwrap();
        c.optimize(&recorder).unwrap();
        assert_eq!(*recorder.0.borrow(), vec![5, 7]);
    }

    #[test]
    fn summaries_report_targets_and_conflicts() {
        let mut c = coordinator("2024-06");
        let mut staff = c.roster().get(1).unwrap().clone();
        staff.desired_off_days.insert(2);
        staff.work_days = 22;
        c.update_staff(staff).unwrap();
        c.set_cell(1, 1, work(true, false));
        c.set_cell(2, 1, work(true, false));

        let summary = c
            .staff_summaries()
            .into_iter()
            .find(|s| s.staff_id == 1)
            .unwrap();
        assert_eq!(summary.days_off, 8);
        assert_eq!(summary.assigned_days, 2);
        assert_eq!(summary.desired_off_conflicts, vec![2]);

        let coverage = c.coverage();
        assert_eq!(coverage.len(), 30);
        assert_eq!(coverage[0].assigned, 1);
        assert_eq!(coverage[0].required, 1);
    }

    #[test]
    fn every_update_sequence_keeps_invariants() {
        let mut c = coordinator("2024-06");
        let updates = [
            ScheduleUpdate::DayStatus {
                closed_days: None,
                busy_days: Some(days(&[1, 2, 3, 4])),
            },
            ScheduleUpdate::SetDayStatus {
                day: 3,
                status: DayStatus::Closed,
            },
            ScheduleUpdate::DayStatus {
                closed_days: Some(days(&[4, 5])),
                busy_days: Some(days(&[5, 6])),
            },
            ScheduleUpdate::SetDayStatus {
                day: 5,
                status: DayStatus::Busy,
            },
            ScheduleUpdate::StaffCounts {
                normal: Some(2),
                busy: Some(4),
            },
        ];
        for update in updates {
            c.update_schedule(update).unwrap();
            let config = c.schedule();
            assert!(config.closed_days.is_disjoint(&config.busy_days));
            for day in &config.closed_days {
                let req = &c.requirements()[(*day - 1) as usize];
                assert_eq!(req.required_staff_count, 0);
                assert_eq!(req.required_attendance_tier_count, 0);
            }
            assert_eq!(c.grid().len(), 150);
        }
        assert_eq!(c.schedule().closed_days, days(&[4]));
        assert_eq!(c.schedule().busy_days, days(&[5, 6]));
    }

    #[test]
    fn revision_tracks_mutations() {
        let mut c = coordinator("2024-06");
        let start = c.revision();
        c.set_work_days_for_all(15);
        assert!(c.roster().staff().iter().all(|s| s.work_days == 15));
        assert!(!c.set_cell(40, 1, work(true, true)));
        assert_eq!(c.revision(), start + 1);
    }
}
