//! Attach a controller to every carousel declared on a page.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{CarouselOptions, PageConfig};
use crate::container::{Container, DomEvent};
use crate::error::Error;
use crate::events::CarouselChange;
use crate::tasks::controller::{self, CarouselHandle};

/// Independent controllers for one page, addressed by carousel id.
#[derive(Debug)]
pub struct Page {
    handles: BTreeMap<String, CarouselHandle>,
    tasks: JoinSet<Result<()>>,
    cancel: CancellationToken,
}

impl Page {
    /// Build each container, resolve its options from its data attributes
    /// and spawn its controller. All controllers report to `changes`.
    pub fn attach(
        config: &PageConfig,
        changes: Sender<CarouselChange>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let mut handles = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for carousel in &config.carousels {
            let container = Container::new(carousel.id.clone(), carousel.layout)
                .with_context(|| format!("failed to attach carousel {:?}", carousel.id))?
                .with_dataset(carousel.data.clone());
            let options = CarouselOptions::from_dataset(container.dataset()).validated()?;
            let (handle, inputs) = controller::channel(&carousel.id);
            tasks.spawn({
                let changes = changes.clone();
                let cancel = cancel.child_token();
                let id = carousel.id.clone();
                async move {
                    controller::run(container, options, inputs, changes, cancel)
                        .await
                        .with_context(|| format!("carousel {id:?} failed"))
                }
            });
            handles.insert(carousel.id.clone(), handle);
        }

        info!(carousels = handles.len(), "page attached");
        Ok(Self {
            handles,
            tasks,
            cancel,
        })
    }

    pub fn carousel(&self, id: &str) -> Result<&CarouselHandle, Error> {
        self.handles
            .get(id)
            .ok_or_else(|| Error::UnknownCarousel(id.to_owned()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    pub async fn dispatch(&self, id: &str, event: DomEvent) -> Result<(), Error> {
        self.carousel(id)?.dispatch(event).await
    }

    /// Destroy every controller and wait for all of them to finish.
    /// Returns the detached containers by id.
    pub async fn teardown(mut self) -> BTreeMap<String, Container> {
        let mut detached = BTreeMap::new();
        for (id, handle) in std::mem::take(&mut self.handles) {
            match handle.destroy().await {
                Ok(container) => {
                    detached.insert(id, container);
                }
                Err(err) => debug!(carousel = id.as_str(), "already stopped: {err}"),
            }
        }
        self.cancel.cancel();

        while let Some(res) = self.tasks.join_next().await {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("carousel task error: {e:?}"),
                Err(e) => error!("join error: {e}"),
            }
        }
        info!(carousels = detached.len(), "page torn down");
        detached
    }
}
