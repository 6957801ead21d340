//! Foreground loop driving the watchdog and the reminder checks.
//!
//! The store is re-read from disk on every tick so sessions started from
//! another `axis` invocation are picked up.

use std::rc::Rc;
use std::time::Duration;

use axis_core::auth::require_session;
use axis_core::reminders::{deliver, Notifier};
use axis_core::{Config, Event, KvStorage, LocalAuthProvider, ReminderManager, TimerWatchdog};
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};

use super::{open_kv, open_store, CmdResult};

struct StderrNotifier {
    enabled: bool,
}

impl Notifier for StderrNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "notification");
        if self.enabled {
            eprintln!("[{title}] {body}");
        }
    }
}

pub fn run() -> CmdResult {
    let kv = open_kv()?;
    require_session(&LocalAuthProvider::new(kv.clone()))?;
    let config = Config::load_or_default();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(kv, config))
}

async fn watch(kv: Rc<KvStorage>, config: Config) -> CmdResult {
    let notifier = StderrNotifier {
        enabled: config.notifications.enabled,
    };
    let mut watchdog = TimerWatchdog::new();
    let mut reminders = ReminderManager::new(config.reminders.lead_minutes);

    let mut tick = interval(Duration::from_secs(config.watchdog.tick_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut check = interval(Duration::from_secs(config.reminders.check_secs.max(1)));
    check.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    tracing::info!(
        tick_secs = config.watchdog.tick_secs,
        check_secs = config.reminders.check_secs,
        "watching"
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let mut store = open_store(&kv);
                let events = watchdog.tick(&mut store, Utc::now());
                emit(&notifier, &events)?;
            }
            _ = check.tick() => {
                let store = open_store(&kv);
                let events = reminders.check(store.state(), Utc::now());
                emit(&notifier, &events)?;
            }
            result = &mut shutdown => {
                result?;
                tracing::info!("stopped");
                break;
            }
        }
    }
    Ok(())
}

fn emit(notifier: &dyn Notifier, events: &[Event]) -> CmdResult {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    deliver(notifier, events);
    Ok(())
}
