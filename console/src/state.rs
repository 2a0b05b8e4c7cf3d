use std::collections::HashSet;

use common::{Action, HistoryEntry, Job, Server};

use crate::clock::Clock;
use crate::config::SelectionPolicy;
use crate::scheduler::JobDraft;
use crate::selection::{HeaderState, SelectionSet};
use crate::was::WasContext;

/// What an action applies to: one explicit server or the whole selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Server(String),
    Bulk,
}

impl Target {
    pub fn is_bulk(&self) -> bool {
        matches!(self, Target::Bulk)
    }
}

/// A control that can be busy while its action is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Control {
    pub action: Action,
    pub target: Target,
}

impl Control {
    pub fn new(action: Action, target: Target) -> Self {
        Self { action, target }
    }
}

/// All mutable panel state, owned by the controller.
#[derive(Debug, Default)]
pub struct AppState {
    pub was: WasContext,
    pub inventory: Vec<Server>,
    pub selection: SelectionSet,
    pub policy: SelectionPolicy,
    pub jobs: Vec<Job>,
    pub history: Vec<HistoryEntry>,
    pub clock: Clock,
    pub busy: HashSet<Control>,
    pub job_dialog: Option<JobDraft>,
    /// False until the first inventory answer for the current WAS arrives.
    pub inventory_loaded: bool,
}

impl AppState {
    pub fn new(was: WasContext, policy: SelectionPolicy) -> Self {
        Self {
            was,
            policy,
            ..Self::default()
        }
    }

    /// Swap in a freshly fetched inventory.
    pub fn replace_inventory(&mut self, servers: Vec<Server>) {
        self.inventory = servers;
        self.inventory_loaded = true;
        match self.policy {
            SelectionPolicy::Sticky => {
                let stale = self.selection.stale(&self.inventory);
                if !stale.is_empty() {
                    log::debug!("Selection keeps servers no longer listed: {:?}", stale);
                }
            }
            SelectionPolicy::Prune => self.selection.retain_present(&self.inventory),
        }
    }

    pub fn has_server(&self, name: &str) -> bool {
        self.inventory.iter().any(|s| s.name == name)
    }

    pub fn header_state(&self) -> HeaderState {
        self.selection.header_state(&self.inventory)
    }

    pub fn is_busy(&self, control: &Control) -> bool {
        self.busy.contains(control)
    }

    /// Bulk buttons are live iff something is selected and that button is not in flight.
    pub fn bulk_enabled(&self, action: Action) -> bool {
        !self.selection.is_empty() && !self.is_busy(&Control::new(action, Target::Bulk))
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(policy: SelectionPolicy) -> AppState {
        let mut state = AppState::new(WasContext::default(), policy);
        state.replace_inventory(vec![
            Server::new("web1", "RUNNING"),
            Server::new("web2", "STOPPED"),
        ]);
        state
    }

    #[test]
    fn bulk_buttons_follow_selection() {
        let mut s = state(SelectionPolicy::Sticky);
        for action in [Action::Start, Action::Stop, Action::Restart] {
            assert!(!s.bulk_enabled(action));
        }
        s.selection.toggle("web1", true);
        for action in [Action::Start, Action::Stop, Action::Restart] {
            assert!(s.bulk_enabled(action));
        }
        s.selection.toggle("web1", false);
        assert!(!s.bulk_enabled(Action::Start));
    }

    #[test]
    fn busy_bulk_button_is_disabled_alone() {
        let mut s = state(SelectionPolicy::Sticky);
        s.selection.toggle("web1", true);
        s.busy.insert(Control::new(Action::Restart, Target::Bulk));
        assert!(!s.bulk_enabled(Action::Restart));
        assert!(s.bulk_enabled(Action::Stop));
    }

    #[test]
    fn sticky_policy_keeps_vanished_names() {
        let mut s = state(SelectionPolicy::Sticky);
        s.selection.toggle("web2", true);
        s.replace_inventory(vec![Server::new("web1", "RUNNING")]);
        assert!(s.selection.contains("web2"));
        assert!(s.bulk_enabled(Action::Start));
    }

    #[test]
    fn prune_policy_drops_vanished_names() {
        let mut s = state(SelectionPolicy::Prune);
        s.selection.toggle("web1", true);
        s.selection.toggle("web2", true);
        s.replace_inventory(vec![Server::new("web1", "RUNNING")]);
        assert_eq!(s.selection.names(), vec!["web1"]);
    }
}
