//! Subcommand handlers and the helpers they share.

pub mod auth;
pub mod block;
pub mod config;
pub mod insights;
pub mod log;
pub mod mode;
pub mod notes;
pub mod schedule;
pub mod session;
pub mod settings;
pub mod shift;
pub mod task;
pub mod watch;

use std::error::Error;
use std::rc::Rc;

use axis_core::auth::require_session;
use axis_core::store::UndoSnapshot;
use axis_core::{AxisStore, Config, KvStorage, LocalAuthProvider, StateStorage};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn Error>>;

/// Undo snapshot key, kept apart from the state blob.
const UNDO_KEY: &str = "axis_undo_v1";

/// One connection shared by the store, the error log and auth.
pub fn open_kv() -> Result<Rc<KvStorage>, Box<dyn Error>> {
    Ok(Rc::new(KvStorage::open()?))
}

/// Hydrate the store and carry the undo snapshot across invocations.
pub fn open_store(kv: &Rc<KvStorage>) -> AxisStore {
    let config = Config::load_or_default();
    let mut store = AxisStore::hydrate_with_key(kv.clone(), &config.storage.state_key)
        .with_undo_state(load_undo(kv));
    let sink = kv.clone();
    store.subscribe(move |state| {
        let result = match &state.undo_state {
            Some(snapshot) => serde_json::to_string(snapshot)
                .map_err(|e| e.to_string())
                .and_then(|json| sink.save(UNDO_KEY, &json).map_err(|e| e.to_string())),
            None => sink.remove(UNDO_KEY).map_err(|e| e.to_string()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to store undo snapshot");
        }
    });
    store
}

fn load_undo(kv: &KvStorage) -> Option<UndoSnapshot> {
    let raw = kv.load(UNDO_KEY).ok()??;
    serde_json::from_str(&raw).ok()
}

/// Open the store after checking for a signed-in session.
pub fn signed_in_store() -> Result<AxisStore, Box<dyn Error>> {
    let kv = open_kv()?;
    require_session(&LocalAuthProvider::new(kv.clone()))?;
    Ok(open_store(&kv))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM` or `HH:MM` (today), in local time.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .or_else(|_| {
            chrono::NaiveTime::parse_from_str(value, "%H:%M").map(|time| today().and_time(time))
        })
        .map_err(|_| format!("invalid time '{value}', expected RFC 3339, 'YYYY-MM-DD HH:MM' or 'HH:MM'"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{value}' does not exist in the local time zone"))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}', expected YYYY-MM-DD"))
}
