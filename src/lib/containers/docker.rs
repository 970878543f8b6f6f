use std::collections::HashMap;

use async_trait::async_trait;
use bollard::{
    Docker,
    container::{InspectContainerOptions, ListContainersOptions, RestartContainerOptions},
    errors::Error as DockerError,
    models::{ContainerInspectResponse, ContainerSummary, EventMessage},
    system::EventsOptions,
};
use futures_util::stream::StreamExt;
use tracing::{debug, info};

use super::types::{
    ContainerEvent, ContainerFilter, ContainerHandle, ContainerRuntime, DockerClient,
    EventFilter, EventStream, RuntimeResult,
};
use crate::lib::template::types::Attributes;

impl ContainerHandle {
    /// Attribute mapping for templating: `name`, `image`, then labels on top.
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), self.name.clone());
        if let Some(tag) = &self.image_tag {
            attrs.insert("image".to_string(), tag.clone());
        }
        attrs.extend(self.labels.clone());
        attrs
    }
}

impl From<EventMessage> for ContainerEvent {
    fn from(message: EventMessage) -> Self {
        ContainerEvent {
            action: message.action.unwrap_or_default(),
            attributes: message
                .actor
                .and_then(|actor| actor.attributes)
                .unwrap_or_default(),
        }
    }
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn container_name(raw: &str) -> String {
    raw.trim_start_matches('/').to_string()
}

impl DockerClient {
    pub fn new() -> RuntimeResult<Self> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(DockerClient { client })
    }

    /// First repo tag of `image_id`, if the image still exists and has one.
    async fn primary_tag(&self, image_id: &str) -> RuntimeResult<Option<String>> {
        match self.client.inspect_image(image_id).await {
            Ok(image) => Ok(image.repo_tags.and_then(|tags| tags.into_iter().next())),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn handle_from_summary(
        &self,
        summary: ContainerSummary,
    ) -> RuntimeResult<ContainerHandle> {
        let tag = match &summary.image_id {
            Some(image_id) => self.primary_tag(image_id).await?,
            None => None,
        };

        Ok(ContainerHandle {
            id: summary.id.unwrap_or_default(),
            name: summary
                .names
                .and_then(|names| names.into_iter().next())
                .map(|name| container_name(&name))
                .unwrap_or_default(),
            image_tag: tag.or(summary.image),
            labels: summary.labels.unwrap_or_default(),
        })
    }

    async fn handle_from_inspect(
        &self,
        inspect: ContainerInspectResponse,
    ) -> RuntimeResult<ContainerHandle> {
        let tag = match &inspect.image {
            Some(image_id) => self.primary_tag(image_id).await?,
            None => None,
        };
        let config = inspect.config.unwrap_or_default();

        Ok(ContainerHandle {
            id: inspect.id.unwrap_or_default(),
            name: inspect
                .name
                .as_deref()
                .map(container_name)
                .unwrap_or_default(),
            image_tag: tag.or(config.image),
            labels: config.labels.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ContainerRuntime for DockerClient {
    async fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> RuntimeResult<Vec<ContainerHandle>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![filter.label.clone()]);
        if let Some(status) = &filter.status {
            filters.insert("status".to_string(), vec![status.clone()]);
        }

        let options = ListContainersOptions {
            all: filter.status.is_none(),
            filters,
            ..Default::default()
        };

        let summaries = self.client.list_containers(Some(options)).await?;
        debug!("Docker listed {} containers for {:?}", summaries.len(), filter);

        let mut handles = Vec::with_capacity(summaries.len());
        for summary in summaries {
            handles.push(self.handle_from_summary(summary).await?);
        }
        Ok(handles)
    }

    async fn find_container(&self, id: &str) -> RuntimeResult<Option<ContainerHandle>> {
        match self
            .client
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => Ok(Some(self.handle_from_inspect(inspect).await?)),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn events(&self, filter: &EventFilter) -> RuntimeResult<EventStream> {
        let mut filters = HashMap::new();
        filters.insert("type".to_string(), vec!["container".to_string()]);
        filters.insert(
            "event".to_string(),
            filter
                .actions
                .iter()
                .map(|action| action.as_str().to_string())
                .collect(),
        );
        filters.insert("label".to_string(), vec![filter.label.clone()]);

        let options = EventsOptions {
            filters,
            ..Default::default()
        };

        info!("Subscribing to Docker events for label {}", filter.label);
        let stream = self
            .client
            .events(Some(options))
            .map(|message| -> RuntimeResult<ContainerEvent> { Ok(message?.into()) });

        Ok(stream.boxed())
    }

    async fn restart_container(&self, id: &str) -> RuntimeResult<()> {
        info!("Restarting container: {}", id);
        self.client
            .restart_container(id, None::<RestartContainerOptions>)
            .await?;
        Ok(())
    }
}
