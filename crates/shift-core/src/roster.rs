use crate::types::{Day, StaffId, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: StaffId,
    pub tier: Tier,
    pub name: String,
    #[serde(default)]
    pub desired_off_days: BTreeSet<Day>,
    pub work_days: u32,
}

/// The solver-facing view of a staff member: everything but the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffInput {
    pub id: StaffId,
    pub tier: Tier,
    pub desired_off_days: BTreeSet<Day>,
    pub work_days: u32,
}

impl From<&StaffMember> for StaffInput {
    fn from(staff: &StaffMember) -> Self {
        Self {
            id: staff.id,
            tier: staff.tier,
            desired_off_days: staff.desired_off_days.clone(),
            work_days: staff.work_days,
        }
    }
}

// ---------------------------------------------------------------------------
// StaffRoster
// ---------------------------------------------------------------------------

/// Staff members ordered by tier, ties kept in insertion order.
#[derive(Debug, Clone)]
pub struct StaffRoster {
    staff: Vec<StaffMember>,
    next_id: StaffId,
    default_work_days: u32,
}

impl StaffRoster {
    pub fn new(default_work_days: u32) -> Self {
        Self {
            staff: Vec::new(),
            next_id: 1,
            default_work_days,
        }
    }

    /// One member per tier, ids 1 through 5.
    pub fn with_one_per_tier(default_work_days: u32) -> Self {
        let mut roster = Self::new(default_work_days);
        for &tier in Tier::all() {
            roster.add(tier);
        }
        roster
    }

    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    pub fn len(&self) -> usize {
        self.staff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staff.is_empty()
    }

    pub fn get(&self, id: StaffId) -> Option<&StaffMember> {
        self.staff.iter().find(|s| s.id == id)
    }

    pub fn default_work_days(&self) -> u32 {
        self.default_work_days
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    pub fn add(&mut self, tier: Tier) -> &[StaffMember] {
        let id = self.next_id;
        self.next_id += 1;
        self.staff.push(StaffMember {
            id,
            tier,
            name: format!("{} {}", tier.label(), id),
            desired_off_days: BTreeSet::new(),
            work_days: self.default_work_days,
        });
        self.sort();
        &self.staff
    }

    /// Returns whether a member was removed.
    pub fn remove(&mut self, id: StaffId) -> bool {
        let before = self.staff.len();
        self.staff.retain(|s| s.id != id);
        self.staff.len() != before
    }

    /// Replaces the member with the same id. Unknown ids leave the roster untouched.
    pub fn update(&mut self, staff: StaffMember) -> bool {
        let Some(existing) = self.staff.iter_mut().find(|s| s.id == staff.id) else {
            tracing::warn!(staff_id = staff.id, "ignoring update for unknown staff member");
            return false;
        };
        *existing = staff;
        self.sort();
        true
    }

    /// Overwrites every member's target attendance and the default for new members.
    pub fn set_work_days_for_all(&mut self, work_days: u32) {
        self.default_work_days = work_days;
        for s in &mut self.staff {
            s.work_days = work_days;
        }
    }

    /// Grows or shrinks the number of members holding `tier`.
    ///
    /// Shrinking removes the earliest-listed members of that tier first.
    /// Returns the ids that were removed.
    pub fn set_tier_count(&mut self, tier: Tier, count: usize) -> Vec<StaffId> {
        let current = self.count_for(tier);
        if current < count {
            for _ in current..count {
                self.add(tier);
            }
            return Vec::new();
        }

        let removed: Vec<StaffId> = self
            .staff
            .iter()
            .filter(|s| s.tier == tier)
            .take(current - count)
            .map(|s| s.id)
            .collect();
        self.staff.retain(|s| !removed.contains(&s.id));
        removed
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn count_for(&self, tier: Tier) -> usize {
        self.staff.iter().filter(|s| s.tier == tier).count()
    }

    /// `(tier, count)` for every tier, including empty ones.
    pub fn tier_counts(&self) -> Vec<(Tier, usize)> {
        Tier::all()
            .iter()
            .map(|&tier| (tier, self.count_for(tier)))
            .collect()
    }

    pub fn staff_inputs(&self) -> Vec<StaffInput> {
        self.staff.iter().map(StaffInput::from).collect()
    }

    fn sort(&mut self) {
        // Vec::sort_by_key is stable, so equal tiers keep insertion order.
        self.staff.sort_by_key(|s| s.tier);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
