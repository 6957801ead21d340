use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "axis", version, about = "Axis time-regulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session tracking
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Show or switch the active mode
    Mode {
        /// New mode (work or home); omit to show the current one
        mode: Option<axis_core::Mode>,
    },
    /// Busy blocks (calls and meetings)
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Work schedule and break suggestions
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Per-mode session durations
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Clock in and out of shifts
    Shift {
        #[command(subcommand)]
        action: commands::shift::ShiftAction,
    },
    /// Daily notes and brain dump
    Notes {
        #[command(subcommand)]
        action: commands::notes::NotesAction,
    },
    /// Focus and break summaries
    Insights {
        #[command(subcommand)]
        action: commands::insights::InsightsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Diagnostic error log
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Account sign-in
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Run the watchdog and reminders until Ctrl-C
    Watch,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AXIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    commands::log::install_panic_hook();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Mode { mode } => commands::mode::run(mode),
        Commands::Block { action } => commands::block::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Shift { action } => commands::shift::run(action),
        Commands::Notes { action } => commands::notes::run(action),
        Commands::Insights { action } => commands::insights::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Watch => commands::watch::run(),
    };

    if let Err(e) = result {
        commands::log::record_failure(e.as_ref());
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
