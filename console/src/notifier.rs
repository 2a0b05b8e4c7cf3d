use std::future::Future;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
    /// Blocking-style message the user must see, e.g. a form validation failure.
    Alert,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Error => "error",
            Level::Alert => "alert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self { Self::new(Level::Info, message) }
    pub fn success(message: impl Into<String>) -> Self { Self::new(Level::Success, message) }
    pub fn error(message: impl Into<String>) -> Self { Self::new(Level::Error, message) }
    pub fn alert(message: impl Into<String>) -> Self { Self::new(Level::Alert, message) }
}

/// Sink for user-visible, non-fatal feedback.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Yes/no confirmation asked before destructive operations.
pub trait Prompt: Send + Sync + 'static {
    fn confirm(&self, message: &str) -> impl Future<Output = bool> + Send;
}

/// Answers yes to everything; used for `--yes`.
pub struct AutoConfirm;

impl Prompt for AutoConfirm {
    async fn confirm(&self, message: &str) -> bool {
        log::debug!("Auto-confirmed: {}", message);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Stdout,
    Stderr,
    Log,
}

/// Fans notices out to every configured channel.
pub struct Toasts {
    channels: Vec<Channel>,
}

impl Toasts {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    fn send(&self, notice: &Notice, channel: Channel) -> std::io::Result<()> {
        use std::io::Write;

        let line = format!("[{}] {}", notice.level.as_str(), notice.message);
        match channel {
            Channel::Stdout => writeln!(std::io::stdout().lock(), "{}", line),
            Channel::Stderr => writeln!(std::io::stderr().lock(), "{}", line),
            Channel::Log => {
                match notice.level {
                    Level::Error | Level::Alert => log::warn!(target: "notice", "{}", notice.message),
                    Level::Info | Level::Success => log::info!(target: "notice", "{}", notice.message),
                }
                Ok(())
            }
        }
    }
}

impl Notifier for Toasts {
    fn notify(&self, notice: Notice) {
        for channel in &self.channels {
            if let Err(e) = self.send(&notice, *channel) {
                log::error!("Failed to deliver notice via {:?}: {}", channel, e);
            }
        }
    }
}
