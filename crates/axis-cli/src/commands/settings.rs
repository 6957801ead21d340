use axis_core::models::ModeSettingsPatch;
use axis_core::Mode;
use clap::Subcommand;

use super::{open_kv, open_store, print_json, signed_in_store, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print session durations for both modes
    Show,
    /// Change session durations for a mode
    Set {
        /// work or home
        mode: Mode,
        #[arg(long)]
        focus: Option<u32>,
        #[arg(long)]
        short_break: Option<u32>,
        #[arg(long)]
        lunch: Option<u32>,
        #[arg(long)]
        task_break: Option<u32>,
    },
}

pub fn run(action: SettingsAction) -> CmdResult {
    match action {
        SettingsAction::Show => {
            let store = open_store(&open_kv()?);
            print_json(&store.state().settings)
        }
        SettingsAction::Set {
            mode,
            focus,
            short_break,
            lunch,
            task_break,
        } => {
            let mut store = signed_in_store()?;
            store.update_settings(
                mode,
                ModeSettingsPatch {
                    focus_minutes: focus,
                    short_break_minutes: short_break,
                    lunch_minutes: lunch,
                    task_break_minutes: task_break,
                },
            );
            print_json(store.state().settings.for_mode(mode))
        }
    }
}
