use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::lib::{
    containers::types::{ContainerRuntime, RuntimeError},
    debounce::types::Debouncer,
    sync::types::FileSync,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Mirroring the containers that are already running.
    Priming,
    /// Following the event feed.
    Watching,
    /// Removing every mirrored file before exit.
    Draining,
    Terminated,
}

/// Restarts the dependent container, if one is configured.
pub struct Restarter<R> {
    pub runtime: Arc<R>,
    pub target: Option<String>,
}

pub struct Reconciler<R: ContainerRuntime> {
    pub runtime: Arc<R>,
    pub label: String,
    pub files: FileSync,
    pub(super) restart: Debouncer<()>,
    pub(super) tracked: BTreeSet<PathBuf>,
    pub(super) phase: Phase,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("container runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
