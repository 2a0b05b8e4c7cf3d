//! Plain-text views of the panel state.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};

use common::{HistoryEntry, HistoryStatus, Job, Server};

use crate::clock::Clock;
use crate::selection::HeaderState;
use crate::state::{AppState, Target};

pub const NO_SERVERS: &str = "No servers found.";
pub const NO_JOBS: &str = "No scheduled tasks.";
pub const NO_HISTORY: &str = "No execution history.";
pub const LOADING: &str = "Loading...";

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

pub fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

pub fn header_checkbox(state: HeaderState) -> &'static str {
    match state {
        HeaderState::Unchecked => "[ ]",
        HeaderState::Indeterminate => "[-]",
        HeaderState::Checked => "[x]",
    }
}

/// Actions currently in flight for `server`, e.g. `restart...`.
fn busy_marker(state: &AppState, server: &Server) -> String {
    let mut actions: Vec<&str> = state
        .busy
        .iter()
        .filter(|c| matches!(&c.target, Target::Server(name) if *name == server.name))
        .map(|c| c.action.as_str())
        .collect();
    actions.sort_unstable();
    actions.iter().map(|a| format!("{}...", a)).collect::<Vec<_>>().join(" ")
}

pub fn inventory(state: &AppState) -> String {
    if !state.inventory_loaded {
        return LOADING.to_string();
    }
    if state.inventory.is_empty() {
        return NO_SERVERS.to_string();
    }
    let mut t = table();
    t.set_header(vec![header_checkbox(state.header_state()), "Name", "Status", "Class", ""]);
    for server in &state.inventory {
        t.add_row(vec![
            Cell::new(checkbox(state.selection.contains(&server.name))),
            Cell::new(&server.name),
            Cell::new(&server.status),
            Cell::new(server.class().as_str()),
            Cell::new(busy_marker(state, server)),
        ]);
    }
    t.to_string()
}

pub fn jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return NO_JOBS.to_string();
    }
    let mut t = table();
    t.set_header(vec!["Action", "Servers", "Schedule", "Cluster Aware", "Next Run", "ID"]);
    for job in jobs {
        t.add_row(vec![
            job.args.action().to_uppercase(),
            job.args.servers().join(", "),
            job.schedule_label(),
            if job.args.cluster_aware() { "Yes" } else { "No" }.to_string(),
            job.next_run_label(),
            job.id.to_string(),
        ]);
    }
    t.to_string()
}

fn outcome_label(entry: &HistoryEntry) -> String {
    match entry.outcome() {
        HistoryStatus::Success | HistoryStatus::Skipped => entry.status.clone(),
        HistoryStatus::Failure => format!("{} (!)", entry.status),
    }
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return NO_HISTORY.to_string();
    }
    let mut t = table();
    t.set_header(vec!["Time", "Action", "Targets", "Status", "Detail"]);
    for entry in entries {
        t.add_row(vec![
            entry.timestamp_label(),
            entry.action.to_uppercase(),
            entry.targets.join(", "),
            outcome_label(entry),
            entry.detail.clone(),
        ]);
    }
    t.to_string()
}

pub fn clock(clock: &Clock) -> String {
    format!("Server time: {}", clock.display().unwrap_or_else(|| "--".to_string()))
}

/// One-line status bar: active WAS, selection size and job count.
pub fn summary(state: &AppState) -> String {
    format!(
        "WAS: {} | Selected: {} | Scheduled tasks: {}",
        state.was.current(),
        state.selection.len(),
        state.job_count()
    )
}

/// Everything, top to bottom.
pub fn screen(state: &AppState) -> String {
    [
        clock(&state.clock),
        summary(state),
        inventory(state),
        jobs(&state.jobs),
        history(&state.history),
    ]
    .join("\n")
}
