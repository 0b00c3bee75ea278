use crate::error::ShiftError;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Day of month, 1-based.
pub type Day = u32;

pub type StaffId = u32;

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Seniority rank of a staff member. 1 is the most senior, 5 the most junior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const MANAGER: Tier = Tier(1);
    pub const DAY_MANAGER: Tier = Tier(2);
    pub const UPPER: Tier = Tier(3);
    pub const MIDDLE: Tier = Tier(4);
    pub const JUNIOR: Tier = Tier(5);

    pub fn new(value: u8) -> Result<Self, ShiftError> {
        if (1..=5).contains(&value) {
            Ok(Tier(value))
        } else {
            Err(ShiftError::InvalidTier(value))
        }
    }

    pub fn all() -> &'static [Tier] {
        &[
            Tier::MANAGER,
            Tier::DAY_MANAGER,
            Tier::UPPER,
            Tier::MIDDLE,
            Tier::JUNIOR,
        ]
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Manager",
            2 => "Day manager",
            3 => "Upper",
            4 => "Middle",
            _ => "Junior",
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = ShiftError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Tier::new(value)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Month
// ---------------------------------------------------------------------------

static MONTH_RE: OnceLock<Regex> = OnceLock::new();

fn month_re() -> &'static Regex {
    MONTH_RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap())
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, ShiftError> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(ShiftError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(self) -> u32 {
        let (year, month) = self.following();
        match (self.first_day(), NaiveDate::from_ymd_opt(year, month, 1)) {
            (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
            _ => 0,
        }
    }

    /// Days 1..=days_in_month in ascending order.
    pub fn days(self) -> impl Iterator<Item = Day> {
        1..=self.days_in_month()
    }

    pub fn contains_day(self, day: Day) -> bool {
        (1..=self.days_in_month()).contains(&day)
    }

    pub fn date(self, day: Day) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    /// The following month. Fails past `9999-12`.
    pub fn next(self) -> Result<Self, ShiftError> {
        let (year, month) = self.following();
        Month::new(year, month)
    }

    fn following(self) -> (i32, u32) {
        if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for Month {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = month_re()
            .captures(s.trim())
            .ok_or_else(|| ShiftError::InvalidMonth(s.to_string()))?;
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| ShiftError::InvalidMonth(s.to_string()))?;
        let month: u32 = caps[2]
            .parse()
            .map_err(|_| ShiftError::InvalidMonth(s.to_string()))?;
        Month::new(year, month).map_err(|_| ShiftError::InvalidMonth(s.to_string()))
    }
}

impl TryFrom<String> for Month {
    type Error = ShiftError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> String {
        month.to_string()
    }
}

// ---------------------------------------------------------------------------
// DayStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Normal,
    Busy,
    Closed,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Normal => "normal",
            DayStatus::Busy => "busy",
            DayStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DayStatus {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(DayStatus::Normal),
            "busy" => Ok(DayStatus::Busy),
            "closed" => Ok(DayStatus::Closed),
            _ => Err(ShiftError::InvalidDayStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
