//! Locally advancing clock anchored to the backend's time source.
//!
//! The anchor is replaced on every successful sync and advanced one second
//! per tick in between. Nothing corrects drift between syncs.

use chrono::{Duration, NaiveDateTime};

use common::schedule::SYSTEM_TIME_FORMAT;

use crate::api::Backend;
use crate::controller::Controller;
use crate::notifier::Prompt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clock {
    current: Option<NaiveDateTime>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&mut self, instant: NaiveDateTime) {
        self.current = Some(instant);
    }

    /// Advance by one unit; a clock that was never anchored stays blank.
    pub fn tick(&mut self) {
        if let Some(now) = self.current {
            self.current = Some(now + Duration::seconds(1));
        }
    }

    pub fn now(&self) -> Option<NaiveDateTime> {
        self.current
    }

    pub fn display(&self) -> Option<String> {
        self.current.map(|t| t.format(SYSTEM_TIME_FORMAT).to_string())
    }
}

impl<B: Backend, P: Prompt> Controller<B, P> {
    /// Re-anchor from the time source. A failure leaves the running clock alone.
    pub async fn sync_time(&self) -> bool {
        let raw = match self.backend().system_time().await {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Time sync failed: {}", e);
                return false;
            }
        };
        match common::parse_system_time(&raw) {
            Ok(instant) => {
                self.with_state(|s| s.clock.anchor(instant));
                log::debug!("Clock anchored at {}", instant);
                true
            }
            Err(e) => {
                log::error!("Time sync failed: {:#}", e);
                false
            }
        }
    }

    pub fn tick_clock(&self) {
        self.with_state(|s| s.clock.tick());
    }
}
