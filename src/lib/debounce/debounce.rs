use std::{future::Future, sync::Arc, time::Duration};

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::types::{Action, Debouncer, Slot};

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(interval: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let action: Action<T> = Arc::new(move |args| action(args).boxed());
        Debouncer {
            interval,
            action,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Cancels any pending run and arms a new timer for `args`.
    pub async fn schedule(&self, args: T) {
        let mut slot = self.slot.lock().await;
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.firing.retain(|run| !run.is_finished());

        let action = self.action.clone();
        let shared = self.slot.clone();
        let interval = self.interval;
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            // Holding the lock means this task is still the armed timer.
            {
                let mut slot = shared.lock().await;
                if let Some(me) = slot.timer.take() {
                    slot.firing.push(me);
                }
            }
            action(args).await;
        }));
        debug!("Debounced action scheduled in {:?}", interval);
    }

    /// Drops the pending run, if any. Returns whether one was cancelled.
    pub async fn cancel_pending(&self) -> bool {
        match self.slot.lock().await.timer.take() {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                true
            }
            _ => false,
        }
    }

    /// Cancels the pending run, waits for any run already in progress, then
    /// executes the action inline.
    pub async fn run_now(&self, args: T) {
        let firing = {
            let mut slot = self.slot.lock().await;
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
            std::mem::take(&mut slot.firing)
        };
        for run in firing {
            let _ = run.await;
        }
        (self.action)(args).await;
    }
}
