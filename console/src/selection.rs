use std::collections::BTreeSet;

use common::Server;

/// Tri-state of the "select all" header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    Unchecked,
    Indeterminate,
    Checked,
}

/// Names of servers checked for bulk operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    names: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-row checkbox change.
    pub fn toggle(&mut self, name: &str, checked: bool) {
        if checked {
            self.names.insert(name.to_string());
        } else {
            self.names.remove(name);
        }
    }

    /// Header checkbox change: checked selects the whole inventory, unchecked clears.
    pub fn set_all(&mut self, checked: bool, inventory: &[Server]) {
        if checked {
            self.names.extend(inventory.iter().map(|s| s.name.clone()));
        } else {
            self.names.clear();
        }
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Drop names that are not in `inventory`.
    pub fn retain_present(&mut self, inventory: &[Server]) {
        self.names
            .retain(|name| inventory.iter().any(|s| &s.name == name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// Selected names missing from `inventory`.
    pub fn stale(&self, inventory: &[Server]) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| !inventory.iter().any(|s| &s.name == *name))
            .cloned()
            .collect()
    }

    /// Checked iff the selection equals the non-empty inventory, indeterminate
    /// for any other non-empty selection.
    pub fn header_state(&self, inventory: &[Server]) -> HeaderState {
        if self.names.is_empty() {
            return HeaderState::Unchecked;
        }
        let covers_inventory = !inventory.is_empty()
            && self.names.len() == inventory.len()
            && inventory.iter().all(|s| self.names.contains(&s.name));
        if covers_inventory {
            HeaderState::Checked
        } else {
            HeaderState::Indeterminate
        }
    }
}
