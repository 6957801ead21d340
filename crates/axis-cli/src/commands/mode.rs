use axis_core::Mode;
use serde_json::json;

use super::{open_kv, open_store, print_json, signed_in_store, CmdResult};

pub fn run(mode: Option<Mode>) -> CmdResult {
    match mode {
        None => {
            let store = open_store(&open_kv()?);
            print_json(&json!({ "mode": store.mode() }))
        }
        Some(next) => {
            let mut store = signed_in_store()?;
            let changed = store.set_mode(next);
            print_json(&json!({
                "mode": store.mode(),
                "changed": changed,
                "canUndo": store.can_undo(),
            }))
        }
    }
}
