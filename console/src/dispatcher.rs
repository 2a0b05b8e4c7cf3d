//! Start/stop/restart dispatch for one server or the whole selection.
//!
//! Nothing here predicts the resulting server status: a successful command is
//! followed by an inventory refresh and the refreshed list is what counts.

use common::{Action, ActionRequest, WasId};

use crate::api::Backend;
use crate::controller::Controller;
use crate::notifier::{Notice, Prompt};
use crate::poller::RefreshOrigin;
use crate::state::{Control, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing to act on; no prompt was shown.
    NoTargets,
    /// The user answered no.
    Declined,
    /// The same control already has a command in flight.
    Busy,
    Completed,
    Failed(String),
}

pub fn confirmation_message(action: Action, target: &Target, count: usize) -> String {
    let action = action.as_str().to_uppercase();
    match target {
        Target::Bulk => format!("Are you sure you want to {} {} selected servers?", action, count),
        Target::Server(name) => format!("Are you sure you want to {} {}?", action, name),
    }
}

fn target_label(target: &Target, count: usize) -> String {
    match target {
        Target::Bulk => format!("Selected ({})", count),
        Target::Server(name) => name.clone(),
    }
}

/// A confirmed command that holds the busy flag of its control.
///
/// Hand it to [`Controller::run_claimed`]; the flag is released only there.
#[derive(Debug)]
pub struct Claim {
    control: Control,
    servers: Vec<String>,
    was: WasId,
}

impl<B: Backend, P: Prompt> Controller<B, P> {
    pub async fn dispatch(&self, action: Action, target: Target) -> Dispatch {
        match self.claim(action, target).await {
            Ok(claim) => self.run_claimed(claim).await,
            Err(outcome) => outcome,
        }
    }

    /// Everything up to the request: busy check, targets, confirmation, busy claim.
    ///
    /// `Err` carries the outcome of a command that will not be sent.
    pub async fn claim(&self, action: Action, target: Target) -> Result<Claim, Dispatch> {
        let control = Control::new(action, target.clone());
        let (servers, was, busy) = self.with_state(|s| {
            let servers = match &target {
                Target::Bulk => s.selection.names(),
                Target::Server(name) => vec![name.clone()],
            };
            (servers, s.was.current().clone(), s.is_busy(&control))
        });
        if busy {
            return Err(Dispatch::Busy);
        }
        if servers.is_empty() {
            return Err(Dispatch::NoTargets);
        }

        if action.requires_confirmation() {
            let message = confirmation_message(action, &target, servers.len());
            if !self.prompt().confirm(&message).await {
                log::info!("{} on {:?} declined", action, servers);
                return Err(Dispatch::Declined);
            }
        }

        // The control may have been fired again while the prompt was open.
        let claimed = self.with_state(|s| s.busy.insert(control.clone()));
        if !claimed {
            return Err(Dispatch::Busy);
        }
        Ok(Claim { control, servers, was })
    }

    /// Send a claimed command and release its control.
    pub async fn run_claimed(&self, claim: Claim) -> Dispatch {
        let Claim { control, servers, was } = claim;
        let outcome = self.execute(control.action, &control.target, servers, was).await;
        self.with_state(|s| s.busy.remove(&control));
        outcome
    }

    async fn execute(
        &self,
        action: Action,
        target: &Target,
        servers: Vec<String>,
        was: WasId,
    ) -> Dispatch {
        self.notify(Notice::info(format!(
            "Executing {} on {}...",
            action,
            target_label(target, servers.len())
        )));
        log::info!("Executing {} on {:?} via WAS {}", action, servers, was);

        let request = ActionRequest { action, servers, was };
        match self.backend().execute(&request).await {
            Ok(result) if result.success => {
                self.notify(Notice::success(format!(
                    "{} completed successfully.",
                    action.as_str().to_uppercase()
                )));
                if target.is_bulk() {
                    self.with_state(|s| s.selection.clear());
                }
                let _ = self.refresh_inventory(RefreshOrigin::AfterCommand).await;
                Dispatch::Completed
            }
            Ok(result) => {
                let message = result.failure_message();
                log::warn!("{} on {:?} failed: {}", action, request.servers, message);
                self.notify(Notice::error(format!("Error: {}", message)));
                Dispatch::Failed(message)
            }
            Err(e) => {
                let message = e.user_message();
                log::error!("{} on {:?} request failed: {}", action, request.servers, e);
                self.notify(Notice::error(format!("Request failed: {}", message)));
                Dispatch::Failed(message)
            }
        }
    }
}
