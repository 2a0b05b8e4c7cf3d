use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Set of named periodic tasks running on the tokio runtime.
///
/// Each task first fires one period after it is added. A run that overruns
/// its period delays the next one rather than overlapping it.
#[derive(Default)]
pub struct Timers {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn every<F, Fut>(&mut self, name: &'static str, period: Duration, mut task: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task().await;
            }
        });
        log::debug!("Started periodic task {} every {:?}", name, period);
        self.tasks.push((name, handle));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|(name, _)| *name).collect()
    }

    pub fn shutdown(&mut self) {
        for (name, handle) in self.tasks.drain(..) {
            handle.abort();
            log::debug!("Stopped periodic task {}", name);
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.shutdown();
    }
}
