pub mod api;
pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod notifier;
pub mod poller;
pub mod render;
pub mod scheduler;
pub mod selection;
pub mod state;
pub mod timers;
pub mod was;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, ApiResult, Backend};
pub use config::Config;
pub use controller::Controller;
pub use error::ConsoleError;
pub use notifier::{AutoConfirm, Notice, Notifier, Prompt, Toasts};
pub use state::{AppState, Target};
