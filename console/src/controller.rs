use std::sync::{Arc, Mutex, PoisonError};

use common::WasId;

use crate::api::Backend;
use crate::config::TimerConfig;
use crate::error::ConsoleError;
use crate::notifier::{Notice, Notifier, Prompt};
use crate::poller::RefreshOrigin;
use crate::state::AppState;
use crate::timers::Timers;

/// Owns the panel state and the collaborators every component talks through.
///
/// Cloning is cheap and yields a handle onto the same state, which is how the
/// periodic tasks get at it. The state lock is never held across an await.
pub struct Controller<B, P> {
    state: Arc<Mutex<AppState>>,
    backend: Arc<B>,
    prompt: Arc<P>,
    notifier: Arc<dyn Notifier>,
}

impl<B, P> Clone for Controller<B, P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            backend: self.backend.clone(),
            prompt: self.prompt.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<B: Backend, P: Prompt> Controller<B, P> {
    pub fn new(state: AppState, backend: B, prompt: P, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            backend: Arc::new(backend),
            prompt: Arc::new(prompt),
            notifier,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Run `f` with exclusive access to the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// First load: clock anchor, inventory for the active WAS, jobs and history.
    pub async fn load(&self) {
        self.sync_time().await;
        let _ = self.refresh_inventory(RefreshOrigin::Manual).await;
        let _ = self.refresh_jobs().await;
        let _ = self.refresh_history().await;
    }

    /// Spawn the clock tick, time re-anchor and poll tasks.
    pub fn start(&self, periods: &TimerConfig) -> Timers {
        let mut timers = Timers::new();

        let c = self.clone();
        timers.every("clock-tick", periods.clock_tick(), move || {
            let c = c.clone();
            async move { c.tick_clock() }
        });

        let c = self.clone();
        timers.every("time-sync", periods.time_sync(), move || {
            let c = c.clone();
            async move {
                c.sync_time().await;
            }
        });

        let c = self.clone();
        timers.every("poll", periods.poll(), move || {
            let c = c.clone();
            async move { c.poll().await }
        });

        timers
    }

    /// Switch the active WAS. Always clears the selection and reloads the inventory.
    pub async fn select_was(&self, id: WasId) -> Result<(), ConsoleError> {
        self.with_state(|s| -> Result<(), ConsoleError> {
            s.was.switch(id.clone())?;
            s.selection.clear();
            s.inventory.clear();
            s.inventory_loaded = false;
            Ok(())
        })?;
        log::info!("Switched WAS to {}", id);
        let _ = self.refresh_inventory(RefreshOrigin::Manual).await;
        Ok(())
    }

    /// Row checkbox. Only listed servers can be checked; anything can be unchecked.
    pub fn toggle_server(&self, name: &str, checked: bool) -> Result<(), ConsoleError> {
        self.with_state(|s| {
            if checked && !s.has_server(name) {
                return Err(ConsoleError::UnknownServer(name.to_string()));
            }
            s.selection.toggle(name, checked);
            Ok(())
        })
    }

    /// Header checkbox.
    pub fn toggle_all(&self, checked: bool) {
        self.with_state(|s| {
            let AppState { selection, inventory, .. } = s;
            selection.set_all(checked, inventory);
        });
    }
}
