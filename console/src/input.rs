//! Terminal input shared by the command loop and confirmation prompts.
//!
//! Every line lands in one queue. Whoever reads next gets it: the command loop
//! between commands, or a prompt while a command waits for its answer. An answer
//! typed ahead of its question simply waits in the queue.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, Mutex};

use crate::command::Command;
use crate::notifier::Prompt;

pub struct Lines {
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl Lines {
    /// An empty queue and the sender that feeds it. Dropping the sender ends the input.
    pub fn channel() -> (mpsc::UnboundedSender<String>, Arc<Self>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Arc::new(Self { rx: Mutex::new(rx) }))
    }

    /// Queue the lines of `reader` from a background task until EOF or a read error.
    pub fn spawn<R>(reader: R) -> Arc<Self>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, lines) = Self::channel();
        tokio::spawn(async move {
            let mut reader = reader.lines();
            loop {
                match reader.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        });
        lines
    }

    /// Queue stdin lines from a dedicated thread.
    ///
    /// A blocking read parked on the runtime's pool would keep the process alive after `quit`.
    pub fn stdin() -> Arc<Self> {
        let (tx, lines) = Self::channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
        lines
    }

    /// The next line, or `None` once input has ended.
    pub async fn next_line(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }

    /// The next non-blank line as a command. End of input reads as `quit`.
    pub async fn next_command(&self) -> anyhow::Result<Command> {
        loop {
            match self.next_line().await {
                None => return Ok(Command::Quit),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return line.parse(),
            }
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Asks on stdout and takes the next queued line as the answer.
pub struct LinePrompt {
    lines: Arc<Lines>,
}

impl LinePrompt {
    pub fn new(lines: Arc<Lines>) -> Self {
        Self { lines }
    }
}

impl Prompt for LinePrompt {
    async fn confirm(&self, message: &str) -> bool {
        print!("{} [y/N] ", message);
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Some(answer) => is_yes(&answer),
            None => {
                println!();
                false
            }
        }
    }
}
