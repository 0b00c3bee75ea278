//! Schedule state synchronization for monthly shift planning.
//!
//! Keeps a staff roster, a month's schedule configuration and the day × staff
//! assignment grid consistent with each other, and builds the payloads
//! exchanged with the external assignment optimizer.
//!
//! ```text
//! mutation ──► StaffRoster / ScheduleConfigStore
//!                    │
//!                    ▼
//!             requirement::project   (ScheduleConfig → Vec<DayRequirement>)
//!                    │
//!                    ▼
//!             AssignmentGrid::reconcile
//! ```
//!
//! [`coordinator::Coordinator`] owns all three stores and runs that chain for
//! every mutation.

pub mod calendar;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod grid;
pub mod optimizer;
pub mod request;
pub mod requirement;
pub mod roster;
pub mod schedule;
pub mod types;

pub use coordinator::Coordinator;
pub use error::{Result, ShiftError};
