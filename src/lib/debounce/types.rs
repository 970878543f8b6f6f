use std::{sync::Arc, time::Duration};

use futures_util::future::BoxFuture;
use tokio::{sync::Mutex, task::JoinHandle};

pub type Action<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
pub(super) struct Slot {
    /// Armed timer that has not fired yet. Safe to abort.
    pub(super) timer: Option<JoinHandle<()>>,
    /// Timers that fired and may still be running the action.
    pub(super) firing: Vec<JoinHandle<()>>,
}

/// Collapses bursts of calls into one trailing run of `action`.
///
/// Holds at most one pending timer. Every `schedule` replaces it, so the
/// action fires `interval` after the last call with that call's argument.
/// A run that has already started is never interrupted.
pub struct Debouncer<T> {
    pub interval: Duration,
    pub(super) action: Action<T>,
    pub(super) slot: Arc<Mutex<Slot>>,
}
