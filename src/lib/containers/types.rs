use std::{collections::HashMap, fmt, str::FromStr};

use async_trait::async_trait;
use bollard::Docker;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lib::template::types::Attributes;

/// Lifecycle transitions the mirror reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Start,
    Unpause,
    Pause,
    Die,
}

impl EventAction {
    pub const ALL: [EventAction; 4] = [
        EventAction::Start,
        EventAction::Unpause,
        EventAction::Pause,
        EventAction::Die,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Start => "start",
            EventAction::Unpause => "unpause",
            EventAction::Pause => "pause",
            EventAction::Die => "die",
        }
    }

    /// Whether the container is running afterwards.
    pub fn is_active(&self) -> bool {
        matches!(self, EventAction::Start | EventAction::Unpause)
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(EventAction::Start),
            "unpause" => Ok(EventAction::Unpause),
            "pause" => Ok(EventAction::Pause),
            "die" => Ok(EventAction::Die),
            other => Err(RuntimeError::UnknownAction(other.to_string())),
        }
    }
}

/// One record from the container event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEvent {
    pub action: String,
    /// Actor attributes: container `name`, `image`, and its labels.
    pub attributes: Attributes,
}

impl ContainerEvent {
    /// `None` for actions outside [`EventAction::ALL`].
    pub fn kind(&self) -> Option<EventAction> {
        self.action.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
    pub image_tag: Option<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFilter {
    /// `None` matches containers in every state.
    pub status: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub actions: Vec<EventAction>,
    pub label: String,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Docker API error: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Unknown container event action: {0}")]
    UnknownAction(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

pub type EventStream = BoxStream<'static, RuntimeResult<ContainerEvent>>;

/// The slice of a container engine the mirror needs.
#[async_trait]
pub trait ContainerRuntime: Send + Sync + 'static {
    async fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> RuntimeResult<Vec<ContainerHandle>>;

    /// `Ok(None)` when the engine does not know `id`.
    async fn find_container(&self, id: &str) -> RuntimeResult<Option<ContainerHandle>>;

    async fn events(&self, filter: &EventFilter) -> RuntimeResult<EventStream>;

    async fn restart_container(&self, id: &str) -> RuntimeResult<()>;
}

#[derive(Debug, Clone)]
pub struct DockerClient {
    pub client: Docker,
}
