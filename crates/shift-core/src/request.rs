use crate::grid::{AssignmentCell, AssignmentGrid};
use crate::requirement::DayRequirement;
use crate::roster::{StaffInput, StaffMember};
use crate::types::{Day, StaffId};
use serde::{Deserialize, Serialize};

/// A cell the optimizer must keep at its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedCell {
    pub date: Day,
    pub staff_id: StaffId,
    pub is_working: bool,
}

impl From<&AssignmentCell> for LockedCell {
    fn from(cell: &AssignmentCell) -> Self {
        Self {
            date: cell.date,
            staff_id: cell.staff_id,
            is_working: cell.is_working,
        }
    }
}

/// Body of `POST /api/v1/optimize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub staffs: Vec<StaffInput>,
    pub shifts: Vec<DayRequirement>,
    pub locked: Vec<LockedCell>,
}

impl OptimizeRequest {
    /// Number of cells a complete response must contain.
    pub fn expected_cells(&self) -> usize {
        self.staffs.len() * self.shifts.len()
    }
}

pub fn build_request(
    staff: &[StaffMember],
    requirements: &[DayRequirement],
    grid: &AssignmentGrid,
) -> OptimizeRequest {
    OptimizeRequest {
        staffs: staff.iter().map(StaffInput::from).collect(),
        shifts: requirements.to_vec(),
        locked: grid.locked_cells().map(LockedCell::from).collect(),
    }
}
