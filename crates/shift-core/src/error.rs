use crate::types::{Day, StaffId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShiftError {
    #[error("day {day} is both closed and busy")]
    ConfigInconsistency { day: Day },

    #[error("assignment grid expects {expected} cells, got {actual}")]
    GridCardinalityMismatch { expected: usize, actual: usize },

    #[error("assignment for day {date}, staff {staff_id} is not part of the current grid")]
    UnknownCell { date: Day, staff_id: StaffId },

    #[error("invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("invalid tier {0}: must be between 1 and 5")]
    InvalidTier(u8),

    #[error("invalid day status '{0}': expected normal, busy or closed")]
    InvalidDayStatus(String),

    #[error("day {day} is outside the month (1..={days_in_month})")]
    DayOutOfRange { day: Day, days_in_month: u32 },

    #[error("day {0} is closed and cannot carry a requirement override")]
    OverrideOnClosedDay(Day),

    #[error("optimizer error: {0}")]
    Optimizer(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ShiftError>;
