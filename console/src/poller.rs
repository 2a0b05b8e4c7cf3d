//! Periodic refresh of the inventory, job list and history.

use crate::api::{ApiResult, Backend};
use crate::controller::Controller;
use crate::notifier::{Notice, Prompt};

/// Why an inventory refresh was started. Background polls never raise notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOrigin {
    Poll,
    Manual,
    AfterCommand,
}

impl RefreshOrigin {
    fn surfaces_errors(&self) -> bool {
        !matches!(self, RefreshOrigin::Poll)
    }
}

impl<B: Backend, P: Prompt> Controller<B, P> {
    /// Fetch the inventory for the active WAS and replace the local copy.
    ///
    /// Returns `Ok(false)` when the answer arrived after a WAS switch and was dropped.
    pub async fn refresh_inventory(&self, origin: RefreshOrigin) -> ApiResult<bool> {
        let (was, generation) = self.with_state(|s| (s.was.current().clone(), s.was.generation()));

        let servers = match self.backend().list_servers(&was).await {
            Ok(servers) => servers,
            Err(e) => {
                log::warn!("Failed to fetch server list for {}: {}", was, e);
                let stale = self.with_state(|s| !s.was.is_current(generation));
                if origin.surfaces_errors() && !stale {
                    self.notify(Notice::error(e.user_message()));
                }
                return Err(e);
            }
        };

        let applied = self.with_state(|s| {
            if !s.was.is_current(generation) {
                return false;
            }
            s.replace_inventory(servers);
            true
        });
        if applied {
            log::debug!("Inventory for {} refreshed ({:?})", was, origin);
        } else {
            log::debug!("Dropped inventory for {} from superseded generation {}", was, generation);
        }
        Ok(applied)
    }

    pub async fn refresh_jobs(&self) -> ApiResult<()> {
        match self.backend().list_jobs().await {
            Ok(jobs) => {
                self.with_state(|s| s.jobs = jobs);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to fetch jobs: {}", e);
                Err(e)
            }
        }
    }

    pub async fn refresh_history(&self) -> ApiResult<()> {
        match self.backend().history().await {
            Ok(history) => {
                self.with_state(|s| s.history = history);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to fetch history: {}", e);
                Err(e)
            }
        }
    }

    /// One poll tick: inventory, then jobs, then history, each awaited in turn.
    /// A failure in one does not skip the others.
    pub async fn poll(&self) {
        let _ = self.refresh_inventory(RefreshOrigin::Poll).await;
        let _ = self.refresh_jobs().await;
        let _ = self.refresh_history().await;
    }
}
