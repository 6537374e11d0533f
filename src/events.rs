use serde::Serialize;
use tokio::sync::oneshot;

use crate::carousel::Phase;
use crate::container::{Container, DomEvent};

/// Emitted by a controller after every display update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CarouselChange {
    pub carousel: String,
    pub current_index: usize,
}

/// Point-in-time view of a controller and its container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CarouselSnapshot {
    pub current_index: usize,
    pub slide_count: usize,
    pub phase: Phase,
    pub autoplay_running: bool,
    pub focused: bool,
    pub track_transform: String,
    pub indicators: Vec<bool>,
    pub listeners: usize,
}

/// Programmatic requests to a running controller.
#[derive(Debug)]
pub enum ControlCommand {
    Advance,
    Retreat,
    JumpTo(usize),
    /// Acknowledged once the new timer is armed.
    StartAutoplay(oneshot::Sender<()>),
    /// Acknowledged once the timer is dropped.
    StopAutoplay(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<CarouselSnapshot>),
    Destroy(oneshot::Sender<Container>),
}

/// Everything a controller consumes from its host.
#[derive(Debug)]
pub enum ControllerInput {
    Dom(DomEvent),
    Control(ControlCommand),
}
