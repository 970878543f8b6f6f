use std::{collections::BTreeSet, future::Future, path::PathBuf, sync::Arc};

use futures_util::stream::StreamExt;
use tracing::{debug, error, info, warn};

use super::types::{Phase, ReconcileResult, Reconciler, Restarter};
use crate::lib::{
    config::types::Config,
    containers::types::{
        ContainerEvent, ContainerFilter, ContainerRuntime, EventAction, EventFilter, RuntimeError,
        RuntimeResult,
    },
    debounce::types::Debouncer,
    sync::types::{FileSync, Removal},
    template::types::Attributes,
};

fn display_name(attrs: &Attributes) -> &str {
    attrs.get("name").map(String::as_str).unwrap_or("<unnamed>")
}

impl<R: ContainerRuntime> Restarter<R> {
    /// Looks `name` up once so later restarts go straight to the container id.
    pub async fn resolve(runtime: Arc<R>, name: Option<&str>) -> RuntimeResult<Self> {
        let target = match name {
            Some(name) => {
                let container = runtime
                    .find_container(name)
                    .await?
                    .ok_or_else(|| RuntimeError::ContainerNotFound(name.to_string()))?;
                info!("Will restart container {} ({}) on changes", container.name, container.id);
                Some(container.id)
            }
            None => None,
        };
        Ok(Restarter { runtime, target })
    }

    pub async fn restart(&self) {
        let Some(target) = &self.target else {
            return;
        };
        if let Err(err) = self.runtime.restart_container(target).await {
            error!("Failed to restart container {}: {}", target, err);
        }
    }
}

impl<R: ContainerRuntime> Reconciler<R> {
    pub fn new(runtime: Arc<R>, config: &Config, restarter: Restarter<R>) -> Self {
        let restarter = Arc::new(restarter);
        let restart = Debouncer::new(config.restart_debounce, move |()| {
            let restarter = restarter.clone();
            async move { restarter.restart().await }
        });

        Reconciler {
            runtime,
            label: config.label.clone(),
            files: FileSync::new(config),
            restart,
            tracked: BTreeSet::new(),
            phase: Phase::Priming,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Paths written by this process that have not been removed since.
    pub fn tracked(&self) -> impl Iterator<Item = &PathBuf> {
        self.tracked.iter()
    }

    fn enter(&mut self, next: Phase) {
        if self.phase != next {
            info!("Reconciler {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }

    /// Primes from the running containers, follows the event feed until
    /// `shutdown` resolves or the feed ends, then drains.
    pub async fn run<S>(&mut self, shutdown: S) -> ReconcileResult<()>
    where
        S: Future<Output = ()>,
    {
        self.prime().await?;

        let filter = EventFilter {
            actions: EventAction::ALL.to_vec(),
            label: self.label.clone(),
        };
        let mut events = self.runtime.events(&filter).await?;
        self.enter(Phase::Watching);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Interrupted");
                    break;
                }
                next = events.next() => match next {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(err)) => warn!("Event feed error: {}", err),
                    None => {
                        warn!("Event feed closed");
                        break;
                    }
                },
            }
        }

        self.drain().await;
        Ok(())
    }

    /// Mirrors every running labelled container. Returns how many were found.
    pub async fn prime(&mut self) -> ReconcileResult<usize> {
        self.enter(Phase::Priming);
        let running = self
            .runtime
            .list_containers(&ContainerFilter {
                status: Some("running".to_string()),
                label: self.label.clone(),
            })
            .await?;
        info!("Found {} running containers labelled {}", running.len(), self.label);

        for container in &running {
            self.mirror(&container.attributes()).await;
        }
        Ok(running.len())
    }

    pub async fn handle_event(&mut self, event: ContainerEvent) {
        match event.kind() {
            Some(action) if action.is_active() => self.mirror(&event.attributes).await,
            Some(_) => self.unmirror(&event.attributes).await,
            None => debug!("Ignoring {:?} event", event.action),
        }
    }

    async fn mirror(&mut self, attrs: &Attributes) {
        match self.files.write(attrs, None).await {
            Ok(path) => {
                self.tracked.insert(path);
                self.restart.schedule(()).await;
            }
            Err(err) => error!("Failed to mirror {}: {}", display_name(attrs), err),
        }
    }

    async fn unmirror(&mut self, attrs: &Attributes) {
        match self.files.remove(attrs).await {
            Ok((path, Removal::Deleted)) => {
                self.tracked.remove(&path);
                self.restart.schedule(()).await;
            }
            Ok((path, Removal::AlreadyAbsent)) => {
                self.tracked.remove(&path);
            }
            Err(err) => error!("Failed to remove mirror of {}: {}", display_name(attrs), err),
        }
    }

    /// Removes every mirrored file and restarts the dependent container
    /// right away, cancelling any pending debounced restart.
    pub async fn drain(&mut self) {
        self.enter(Phase::Draining);
        info!("Draining {} tracked files", self.tracked().count());

        let mut paths = std::mem::take(&mut self.tracked);
        match self
            .runtime
            .list_containers(&ContainerFilter {
                status: None,
                label: self.label.clone(),
            })
            .await
        {
            Ok(containers) => paths.extend(
                containers
                    .iter()
                    .map(|container| self.files.resolve_filename(&container.attributes())),
            ),
            Err(err) => warn!("Could not list containers while draining: {}", err),
        }

        for path in &paths {
            if let Err(err) = self.files.remove_path(path).await {
                error!("Failed to remove mirror file: {}", err);
            }
        }

        self.restart.run_now(()).await;
        self.enter(Phase::Terminated);
    }
}
