use crate::calendar::StaticCalendar;
use crate::error::Result;
use crate::optimizer::HttpOptimizer;
use crate::schedule::ScheduleDefaults;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RosterSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSettings {
    #[serde(default = "default_work_days")]
    pub default_work_days: u32,
    /// Start every session with one member per tier.
    #[serde(default = "default_true")]
    pub seed_one_per_tier: bool,
}

fn default_work_days() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            default_work_days: default_work_days(),
            seed_one_per_tier: default_true(),
        }
    }
}

// ---------------------------------------------------------------------------
// CalendarSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSettings {
    #[serde(default = "default_true")]
    pub weekends_restricted: bool,
    /// Public holidays, `YYYY-MM-DD`.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            weekends_restricted: default_true(),
            holidays: Vec::new(),
        }
    }
}

impl CalendarSettings {
    pub fn calendar(&self) -> StaticCalendar {
        StaticCalendar {
            weekends: self.weekends_restricted,
            holidays: self.holidays.iter().copied().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// OptimizerSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default = "default_optimizer_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_optimizer_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            url: default_optimizer_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OptimizerSettings {
    pub fn client(&self) -> Result<HttpOptimizer> {
        HttpOptimizer::new(&self.url, Duration::from_secs(self.timeout_secs))
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub roster: RosterSettings,
    #[serde(default)]
    pub schedule: ScheduleDefaults,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub optimizer: OptimizerSettings,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            roster: RosterSettings::default(),
            schedule: ScheduleDefaults::default(),
            calendar: CalendarSettings::default(),
            optimizer: OptimizerSettings::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Writes through a tempfile in the target directory so a crash never
    /// leaves a half-written config behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        if self.roster.default_work_days > 31 {
            push(
                WarnLevel::Error,
                format!(
                    "roster.default_work_days={} exceeds the longest month",
                    self.roster.default_work_days
                ),
            );
        }

        let s = &self.schedule;
        if s.required_attendance_tier_count > 0 && s.required_attendance_tiers.is_empty() {
            push(
                WarnLevel::Error,
                format!(
                    "schedule.required_attendance_tier_count={} but no attendance tiers are set",
                    s.required_attendance_tier_count
                ),
            );
        }
        if s.required_attendance_tier_count > s.required_staff_count_on_normal {
            push(
                WarnLevel::Warning,
                format!(
                    "schedule.required_attendance_tier_count={} exceeds required_staff_count_on_normal={}",
                    s.required_attendance_tier_count, s.required_staff_count_on_normal
                ),
            );
        }
        if s.required_staff_count_on_busy < s.required_staff_count_on_normal {
            push(
                WarnLevel::Warning,
                format!(
                    "busy days require fewer staff ({}) than normal days ({})",
                    s.required_staff_count_on_busy, s.required_staff_count_on_normal
                ),
            );
        }

        let url = self.optimizer.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            push(
                WarnLevel::Error,
                format!("optimizer.url '{url}' must start with http:// or https://"),
            );
        }
        if self.optimizer.timeout_secs == 0 {
            push(
                WarnLevel::Warning,
                "optimizer.timeout_secs=0 disables the request timeout".to_string(),
            );
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
