//! Worker-thread host for periodic generation runs.
//!
//! The transition in [`crate::generate`] is pure; this module supplies
//! the cadence. One named worker thread owns the job, so runs can never
//! overlap, and shutdown is deterministic: drop the handle and the
//! worker is joined.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use tracing::debug;

enum Command {
    RunOnce,
    Start(Duration),
    Stop,
    Shutdown,
}

/// Drives a generation job on a single worker thread.
///
/// The job receives the wall-clock time of each invocation. `start`
/// runs it immediately and then once per interval; `run_once` requests
/// a single off-cycle run at any time; `stop` pauses the cadence while
/// keeping the worker available.
pub struct GenerationScheduler {
    tx: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl GenerationScheduler {
    /// Spawn the worker in its idle state.
    pub fn new<F>(mut job: F) -> Self
    where
        F: FnMut(DateTime<Utc>) + Send + 'static,
    {
        let (tx, rx) = unbounded::<Command>();
        let worker = thread::Builder::new()
            .name("pfl-generation".to_string())
            .spawn(move || {
                let mut cadence: Option<Duration> = None;
                loop {
                    let command = match cadence {
                        Some(interval) => match rx.recv_timeout(interval) {
                            Ok(command) => command,
                            Err(RecvTimeoutError::Timeout) => {
                                job(Utc::now());
                                continue;
                            }
                            Err(RecvTimeoutError::Disconnected) => break,
                        },
                        None => match rx.recv() {
                            Ok(command) => command,
                            Err(_) => break,
                        },
                    };
                    match command {
                        Command::RunOnce => job(Utc::now()),
                        Command::Start(interval) => {
                            debug!(?interval, "generation cadence started");
                            cadence = Some(interval);
                            job(Utc::now());
                        }
                        Command::Stop => {
                            debug!("generation cadence stopped");
                            cadence = None;
                        }
                        Command::Shutdown => break,
                    }
                }
            })
            .expect("failed to spawn generation worker");
        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// Run the job once, now. Works with or without an active cadence.
    pub fn run_once(&self) {
        let _ = self.tx.send(Command::RunOnce);
    }

    /// Begin periodic runs: one immediately, then one per `interval`.
    /// Calling again replaces the previous cadence.
    pub fn start(&self, interval: Duration) {
        let _ = self.tx.send(Command::Start(interval));
    }

    /// Pause the cadence. The worker stays up for later `start` or
    /// `run_once` calls.
    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }
}

impl Drop for GenerationScheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_once_fires_exactly_one_run() {
        let (tick_tx, tick_rx) = unbounded();
        let scheduler = GenerationScheduler::new(move |_now| {
            let _ = tick_tx.send(());
        });
        scheduler.run_once();
        assert!(tick_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        // idle: no cadence means no further runs
        assert!(tick_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn start_runs_immediately_then_on_cadence() {
        let (tick_tx, tick_rx) = unbounded();
        let scheduler = GenerationScheduler::new(move |_now| {
            let _ = tick_tx.send(());
        });
        scheduler.start(Duration::from_millis(5));
        for _ in 0..3 {
            assert!(tick_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        }
        drop(scheduler);
    }

    #[test]
    fn stop_pauses_the_cadence() {
        let (tick_tx, tick_rx) = unbounded();
        let scheduler = GenerationScheduler::new(move |_now| {
            let _ = tick_tx.send(());
        });
        scheduler.start(Duration::from_millis(5));
        assert!(tick_rx.recv_timeout(Duration::from_secs(2)).is_ok());

        scheduler.stop();
        // drain runs already in flight; the line then goes quiet
        while tick_rx.recv_timeout(Duration::from_millis(50)).is_ok() {}
        assert!(tick_rx.recv_timeout(Duration::from_millis(100)).is_err());

        // still serviceable after a stop
        scheduler.run_once();
        assert!(tick_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn drop_joins_the_worker() {
        let (tick_tx, tick_rx) = unbounded();
        let scheduler = GenerationScheduler::new(move |_now| {
            let _ = tick_tx.send(());
        });
        scheduler.start(Duration::from_millis(5));
        assert!(tick_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        drop(scheduler);

        // the job closure died with the worker, so after any buffered
        // ticks the channel reports disconnection
        while tick_rx.recv_timeout(Duration::from_millis(50)).is_ok() {}
        assert_eq!(
            tick_rx.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Disconnected)
        );
    }
}
