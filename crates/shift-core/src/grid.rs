//! The day × staff assignment grid.
//!
//! The grid always holds exactly one cell per (requirement date, staff id)
//! pair. It is rebuilt wholesale by [`AssignmentGrid::reconcile`] whenever the
//! roster or the day list changes, carrying forward the working and lock flags
//! of every cell whose key survives.

use crate::error::{Result, ShiftError};
use crate::requirement::DayRequirement;
use crate::roster::StaffMember;
use crate::types::{Day, StaffId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCell {
    pub date: Day,
    pub staff_id: StaffId,
    pub is_working: bool,
    pub locked: bool,
}

impl AssignmentCell {
    fn key(&self) -> (Day, StaffId) {
        (self.date, self.staff_id)
    }
}

/// Partial edit of a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPatch {
    #[serde(default)]
    pub is_working: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentGrid {
    cells: Vec<AssignmentCell>,
    dates: Vec<Day>,
    staff_ids: Vec<StaffId>,
}

impl AssignmentGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[AssignmentCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, date: Day, staff_id: StaffId) -> Option<&AssignmentCell> {
        self.cells
            .iter()
            .find(|c| c.date == date && c.staff_id == staff_id)
    }

    /// Number of cells the current staff × day cross product requires.
    pub fn expected_len(&self) -> usize {
        self.dates.len() * self.staff_ids.len()
    }

    pub fn locked_cells(&self) -> impl Iterator<Item = &AssignmentCell> {
        self.cells.iter().filter(|c| c.locked)
    }

    pub fn working_count(&self, date: Day) -> usize {
        self.cells
            .iter()
            .filter(|c| c.date == date && c.is_working)
            .count()
    }

    pub fn assigned_days(&self, staff_id: StaffId) -> Vec<Day> {
        self.cells
            .iter()
            .filter(|c| c.staff_id == staff_id && c.is_working)
            .map(|c| c.date)
            .collect()
    }

    // ---------------------------------------------------------------------------
    // Reconciliation
    // ---------------------------------------------------------------------------

    /// Rebuilds the grid for `staff` × `requirements`.
    ///
    /// Closed days are forced to non-working and locked. Other cells keep their
    /// previous flags or start unassigned and unlocked. Days that were closed
    /// before and are open now always come out unlocked.
    pub fn reconcile(
        &mut self,
        staff: &[StaffMember],
        requirements: &[DayRequirement],
        closed_days: &BTreeSet<Day>,
        previous_closed_days: &BTreeSet<Day>,
    ) {
        let previous: HashMap<(Day, StaffId), AssignmentCell> =
            self.cells.iter().map(|c| (c.key(), *c)).collect();

        let mut cells = Vec::with_capacity(requirements.len() * staff.len());
        for req in requirements {
            let closed = closed_days.contains(&req.date);
            let reopened = !closed && previous_closed_days.contains(&req.date);

            for member in staff {
                let cell = if closed {
                    AssignmentCell {
                        date: req.date,
                        staff_id: member.id,
                        is_working: false,
                        locked: true,
                    }
                } else {
                    let prior = previous.get(&(req.date, member.id));
                    AssignmentCell {
                        date: req.date,
                        staff_id: member.id,
                        is_working: prior.is_some_and(|c| c.is_working),
                        locked: !reopened && prior.is_some_and(|c| c.locked),
                    }
                };
                cells.push(cell);
            }
        }

        tracing::debug!(
            days = requirements.len(),
            staff = staff.len(),
            carried = cells.iter().filter(|c| previous.contains_key(&c.key())).count(),
            "assignment grid reconciled"
        );

        self.cells = cells;
        self.dates = requirements.iter().map(|r| r.date).collect();
        self.staff_ids = staff.iter().map(|s| s.id).collect();
    }

    // ---------------------------------------------------------------------------
    // Edits
    // ---------------------------------------------------------------------------

    /// Merges `patch` into the cell at (`date`, `staff_id`). Returns false when
    /// no such cell exists.
    pub fn set_cell(&mut self, date: Day, staff_id: StaffId, patch: CellPatch) -> bool {
        let Some(cell) = self
            .cells
            .iter_mut()
            .find(|c| c.date == date && c.staff_id == staff_id)
        else {
            return false;
        };
        if let Some(w) = patch.is_working {
            cell.is_working = w;
        }
        if let Some(l) = patch.locked {
            cell.locked = l;
        }
        true
    }

    /// Replaces every cell, typically with an optimizer response.
    ///
    /// The new set must cover the current cross product exactly; otherwise the
    /// grid is left as it was. Cells are stored in the grid's own order
    /// regardless of the order they arrive in.
    pub fn replace_all(&mut self, cells: Vec<AssignmentCell>) -> Result<()> {
        let expected = self.expected_len();
        if cells.len() != expected {
            return Err(ShiftError::GridCardinalityMismatch {
                expected,
                actual: cells.len(),
            });
        }

        let dates: BTreeSet<Day> = self.dates.iter().copied().collect();
        let staff_ids: BTreeSet<StaffId> = self.staff_ids.iter().copied().collect();
        let mut incoming: HashMap<(Day, StaffId), AssignmentCell> = HashMap::with_capacity(expected);
        for cell in cells {
            if !dates.contains(&cell.date) || !staff_ids.contains(&cell.staff_id) {
                return Err(ShiftError::UnknownCell {
                    date: cell.date,
                    staff_id: cell.staff_id,
                });
            }
            incoming.insert(cell.key(), cell);
        }
        if incoming.len() != expected {
            // Duplicate keys leave part of the grid uncovered.
            return Err(ShiftError::GridCardinalityMismatch {
                expected,
                actual: incoming.len(),
            });
        }

        let mut ordered = Vec::with_capacity(expected);
        for &date in &self.dates {
            for &staff_id in &self.staff_ids {
                if let Some(cell) = incoming.remove(&(date, staff_id)) {
                    ordered.push(cell);
                }
            }
        }
        self.cells = ordered;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
