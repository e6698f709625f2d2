//! Single-shot track deadline
//!
//! A deadline is never adjusted in place: re-arming cancels the old one
//! and spawns a new one with a fresh generation number.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A pending "current track is over" callback
#[derive(Debug)]
pub struct Deadline {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Deadline {
    /// Run `on_expiry` once `delay` has elapsed
    pub fn spawn<F>(generation: u64, delay: Duration, on_expiry: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_expiry.await;
        });
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the timer; its callback will not run if it has not started
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Forget the timer without aborting it
    ///
    /// Used by the callback itself, which must not abort its own task.
    pub fn release(self) {
        drop(self.handle);
    }
}
