// src/progress.rs
use log::info;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_millis(300);
const CLIMB_CEILING: u8 = 90;
const DONE: u8 = 100;

/// One climb step: a random increment clamped so the indicator parks
/// at the ceiling until the request settles.
pub fn climb(value: u8, increment: u8) -> u8 {
    value.saturating_add(increment).min(CLIMB_CEILING)
}

/// Cosmetic progress for an in-flight analysis. The value carries no
/// correlation to actual transfer progress; it climbs toward 90 on a
/// fixed interval and jumps to 100 when the request settles. The
/// ticking task never outlives the submission it decorates.
pub struct ProgressTicker {
    value: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl ProgressTicker {
    pub fn start() -> Self {
        let value = Arc::new(AtomicU8::new(0));
        let shared = value.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.tick().await;
            loop {
                interval.tick().await;
                let increment = rand::thread_rng().gen_range(0..10);
                let next = climb(shared.load(Ordering::Relaxed), increment);
                shared.store(next, Ordering::Relaxed);
                info!("analyzing... {}%", next);
                if next >= CLIMB_CEILING {
                    break;
                }
            }
        });
        Self { value, task }
    }

    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }

    /// Settles the indicator at 100 and stops the timer, success and
    /// failure alike.
    pub fn finish(self) {
        self.task.abort();
        self.value.store(DONE, Ordering::Relaxed);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
