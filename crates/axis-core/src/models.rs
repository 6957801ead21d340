//! Persisted domain types.
//!
//! Every type serializes with camelCase keys so that the state blob stays
//! readable across app revisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::time::parse_time_to_minutes;

/// Top-level context partition with independent settings and data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Work,
    Home,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::Home => "home",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Mode::Work),
            "home" => Ok(Mode::Home),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("expected 'work' or 'home', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Focus,
    ShortBreak,
    Lunch,
    TaskBreak,
}

impl SessionType {
    pub const ALL: [SessionType; 4] = [
        SessionType::Focus,
        SessionType::ShortBreak,
        SessionType::Lunch,
        SessionType::TaskBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Focus => "focus",
            SessionType::ShortBreak => "short_break",
            SessionType::Lunch => "lunch",
            SessionType::TaskBreak => "task_break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Focus)
    }
}

impl std::str::FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "type".into(),
                message: format!("unknown session type '{s}'"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    Manual,
    AutoClosed,
}

/// One tracked activity interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub mode: Mode,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    /// `None` while the session is running.
    pub end_time: Option<DateTime<Utc>>,
    /// Planned duration; 0 means open-ended.
    pub intended_minutes: u32,
    pub source: SessionSource,
    /// Weak reference to a [`Task`]; never dereferenced by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Session {
    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }
}

/// An externally scheduled commitment (call or meeting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyBlock {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl BusyBlock {
    /// Half-open overlap test against `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_time && end > self.start_time
    }
}

/// Recurring work-day window for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSchedule {
    /// 0 = Sunday … 6 = Saturday.
    pub day_of_week: u8,
    pub start: String,
    pub end: String,
}

impl WorkSchedule {
    pub fn new(day_of_week: u8, start: &str, end: &str) -> Self {
        Self {
            day_of_week,
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Check day range and both clock strings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.day_of_week > 6 {
            return Err(ValidationError::InvalidDayOfWeek(self.day_of_week));
        }
        let start = parse_time_to_minutes(&self.start)?;
        let end = parse_time_to_minutes(&self.end)?;
        if end <= start {
            return Err(ValidationError::InvalidValue {
                field: "end".into(),
                message: format!("{} is not after {}", self.end, self.start),
            });
        }
        Ok(())
    }
}

pub fn default_work_schedule() -> Vec<WorkSchedule> {
    vec![
        WorkSchedule::new(1, "09:00", "17:00"),
        WorkSchedule::new(2, "08:00", "18:00"),
        WorkSchedule::new(3, "08:30", "18:00"),
        WorkSchedule::new(4, "09:00", "13:00"),
        WorkSchedule::new(5, "09:00", "17:00"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeSettings {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub lunch_minutes: u32,
    pub task_break_minutes: u32,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 50,
            short_break_minutes: 10,
            lunch_minutes: 45,
            task_break_minutes: 5,
        }
    }
}

impl ModeSettings {
    /// Planned duration for a new session of `session_type`.
    pub fn intended_minutes(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Focus => self.focus_minutes,
            SessionType::ShortBreak => self.short_break_minutes,
            SessionType::Lunch => self.lunch_minutes,
            SessionType::TaskBreak => self.task_break_minutes,
        }
    }
}

/// Partial update for [`ModeSettings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSettingsPatch {
    pub focus_minutes: Option<u32>,
    pub short_break_minutes: Option<u32>,
    pub lunch_minutes: Option<u32>,
    pub task_break_minutes: Option<u32>,
}

impl ModeSettingsPatch {
    pub fn apply(&self, settings: &mut ModeSettings) {
        if let Some(v) = self.focus_minutes {
            settings.focus_minutes = v;
        }
        if let Some(v) = self.short_break_minutes {
            settings.short_break_minutes = v;
        }
        if let Some(v) = self.lunch_minutes {
            settings.lunch_minutes = v;
        }
        if let Some(v) = self.task_break_minutes {
            settings.task_break_minutes = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AxisSettings {
    pub work: ModeSettings,
    pub home: ModeSettings,
}

impl AxisSettings {
    pub fn for_mode(&self, mode: Mode) -> &ModeSettings {
        match mode {
            Mode::Work => &self.work,
            Mode::Home => &self.home,
        }
    }

    pub fn for_mode_mut(&mut self, mode: Mode) -> &mut ModeSettings {
        match mode {
            Mode::Work => &mut self.work,
            Mode::Home => &mut self.home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("expected low, medium or high, got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub mode: Mode,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    /// Hidden from the active view until this passes.
    pub deferred_until: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_deferred(&self, now: DateTime<Utc>) -> bool {
        self.deferred_until.is_some_and(|until| until > now)
    }
}

/// Partial update for [`Task`]. `deferred_until: Some(None)` clears the deferral.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub mode: Option<Mode>,
    pub priority: Option<TaskPriority>,
    pub deferred_until: Option<Option<DateTime<Utc>>>,
}

/// A clocked work shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub mode: Mode,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainDumpItem {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyNotes {
    pub meeting_notes: String,
    pub brain_dump: String,
    pub brain_dump_items: Vec<BrainDumpItem>,
    pub doodle_data_url: Option<String>,
}

/// Partial update for [`DailyNotes`] text fields.
#[derive(Debug, Clone, Default)]
pub struct NotesPatch {
    pub meeting_notes: Option<String>,
    pub brain_dump: Option<String>,
}

/// Notes are keyed by day and mode, e.g. `2024-01-01_work`.
pub fn notes_key(day_key: &str, mode: Mode) -> String {
    format!("{day_key}_{mode}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardItemKind {
    #[default]
    Note,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardColor {
    #[default]
    Lime,
    Amber,
    Blue,
    Rose,
    Slate,
}

pub const DEFAULT_BOARD_ITEM_WIDTH: f64 = 240.0;
pub const DEFAULT_BOARD_ITEM_HEIGHT: f64 = 160.0;
pub const DEFAULT_GRID_SIZE: u32 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BoardItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    pub color: BoardColor,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub z_index: u32,
    pub created_at: DateTime<Utc>,
}

/// Partial update for [`BoardItem`] placement and content.
#[derive(Debug, Clone, Default)]
pub struct BoardItemPatch {
    pub text: Option<String>,
    pub color: Option<BoardColor>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub z_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainDumpBoard {
    pub items: Vec<BoardItem>,
    pub camera: Camera,
    pub snap_to_grid: bool,
    pub grid_size: u32,
    pub doodle_data_url: Option<String>,
}

impl Default for BrainDumpBoard {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            camera: Camera::default(),
            snap_to_grid: false,
            grid_size: DEFAULT_GRID_SIZE,
            doodle_data_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoardsByMode {
    pub work: BrainDumpBoard,
    pub home: BrainDumpBoard,
}

impl BoardsByMode {
    pub fn for_mode(&self, mode: Mode) -> &BrainDumpBoard {
        match mode {
            Mode::Work => &self.work,
            Mode::Home => &self.home,
        }
    }

    pub fn for_mode_mut(&mut self, mode: Mode) -> &mut BrainDumpBoard {
        match mode {
            Mode::Work => &mut self.work,
            Mode::Home => &mut self.home,
        }
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
