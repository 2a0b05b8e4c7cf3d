use common::WasId;

use crate::api::{ApiResult, Backend};
use crate::controller::Controller;
use crate::error::ConsoleError;
use crate::notifier::{Notice, Prompt};
use crate::poller::RefreshOrigin;

/// The single active WAS environment plus a generation that changes on every switch.
#[derive(Debug, Clone)]
pub struct WasContext {
    current: WasId,
    variants: Vec<WasId>,
    generation: u64,
}

impl WasContext {
    pub fn new(default: WasId, variants: Vec<WasId>) -> Self {
        let mut variants = variants;
        if !variants.contains(&default) {
            variants.insert(0, default.clone());
        }
        Self {
            current: default,
            variants,
            generation: 0,
        }
    }

    pub fn current(&self) -> &WasId {
        &self.current
    }

    pub fn variants(&self) -> &[WasId] {
        &self.variants
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Make `id` current. Re-selecting the active id still counts as a switch.
    pub fn switch(&mut self, id: WasId) -> Result<u64, ConsoleError> {
        if !self.variants.contains(&id) {
            return Err(ConsoleError::UnknownWas(id));
        }
        self.current = id;
        self.generation += 1;
        Ok(self.generation)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

impl Default for WasContext {
    fn default() -> Self {
        Self::new(WasId::default(), Vec::new())
    }
}

impl<B: Backend, P: Prompt> Controller<B, P> {
    /// Ask the backend to re-read its WAS definitions, then reload the inventory.
    pub async fn reload_was_config(&self) -> ApiResult<usize> {
        match self.backend().reload_config().await {
            Ok(result) => {
                log::info!("Backend reloaded {} WAS configurations", result.count);
                self.notify(Notice::success(format!(
                    "Reloaded {} WAS configurations",
                    result.count
                )));
                let _ = self.refresh_inventory(RefreshOrigin::Manual).await;
                Ok(result.count)
            }
            Err(e) => {
                log::error!("Config reload failed: {}", e);
                self.notify(Notice::error(format!("Config reload failed: {}", e.user_message())));
                Err(e)
            }
        }
    }
}
