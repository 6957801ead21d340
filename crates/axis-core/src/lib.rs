//! # Axis Core Library
//!
//! This library provides the core logic for Axis, a personal
//! time-regulation tool that tracks focus and break sessions in two modes
//! (work and home), plans breaks and lunch around busy blocks, and keeps
//! tasks and daily notes. All operations are available through the `axis`
//! CLI binary, which is a thin shell over this crate.
//!
//! ## Architecture
//!
//! - **Store**: An explicitly constructed state container with optimistic
//!   session transitions and single-level undo of auto-closes
//! - **Schedule**: Pure break and lunch placement over the work-day window
//! - **Watchdog / Reminders**: Polled checks that auto-end capped sessions
//!   and emit one-shot nudges; the caller drives `tick()`
//! - **Storage**: SQLite key-value persistence of one JSON state blob and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`AxisStore`]: Session state machine and entity actions
//! - [`generate_suggestions`]: Break/lunch suggestion engine
//! - [`TimerWatchdog`]: Hard caps and nudges for the running session
//! - [`KvStorage`]: Persistent key-value medium
//! - [`Config`]: Application configuration management

pub mod auth;
pub mod error;
pub mod error_log;
pub mod events;
pub mod insights;
pub mod models;
pub mod reminders;
pub mod schedule;
pub mod storage;
pub mod store;
pub mod time;
pub mod watchdog;

pub use auth::{AuthProvider, AuthSession, LocalAuthProvider};
pub use error::{AuthError, ConfigError, CoreError, Result, StorageError, ValidationError};
pub use error_log::{ErrorLog, ErrorLogEntry};
pub use events::Event;
pub use models::{
    BusyBlock, DailyNotes, Mode, ModeSettings, Session, SessionSource, SessionType, Shift, Task,
    TaskPriority, WorkSchedule,
};
pub use reminders::{Notifier, ReminderManager};
pub use schedule::{generate_suggestions, SuggestedSession, SuggestionInput, TimeRange};
pub use storage::{Config, KvStorage, MemoryStorage, StateStorage};
pub use store::{AxisState, AxisStore, SessionPhase};
pub use watchdog::TimerWatchdog;
