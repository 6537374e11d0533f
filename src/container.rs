//! Host-side model of a carousel container.
//!
//! The container stands in for the page markup the controller is attached
//! to: a slide track, the slides, optional indicator dots and optional
//! prev/next controls. It also holds what the controller renders into it
//! and the registry of handlers bound to its elements.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer};

use crate::error::Error;

/// Markup structure of a container, as found on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerLayout {
    #[serde(default = "ContainerLayout::default_track")]
    pub track: bool,
    pub slides: usize,
    #[serde(default)]
    pub indicators: usize,
    #[serde(default)]
    pub prev: bool,
    #[serde(default)]
    pub next: bool,
}

impl ContainerLayout {
    const fn default_track() -> bool {
        true
    }

    /// Layout with a track, `slides` slides, one dot per slide and both
    /// navigation controls.
    pub fn standard(slides: usize) -> Self {
        Self {
            track: true,
            slides,
            indicators: slides,
            prev: true,
            next: true,
        }
    }
}

/// An element inside the container that handlers can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    Container,
    Prev,
    Next,
    Indicator(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    FocusIn,
    FocusOut,
    TouchStart,
    TouchMove,
    TouchEnd,
    PointerEnter,
    PointerLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            _ => Self::Other,
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_name(&raw))
    }
}

/// An input event dispatched by the host page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomEvent {
    pub target: Target,
    pub kind: EventKind,
    pub key: Option<Key>,
    /// Horizontal client coordinate for touch events.
    pub x: Option<f64>,
}

impl DomEvent {
    pub fn new(target: Target, kind: EventKind) -> Self {
        Self {
            target,
            kind,
            key: None,
            x: None,
        }
    }

    pub fn click(target: Target) -> Self {
        Self::new(target, EventKind::Click)
    }

    pub fn key_down(key: Key) -> Self {
        Self {
            key: Some(key),
            ..Self::new(Target::Container, EventKind::KeyDown)
        }
    }

    pub fn touch(kind: EventKind, x: f64) -> Self {
        Self {
            x: Some(x),
            ..Self::new(Target::Container, kind)
        }
    }

    pub fn on_container(kind: EventKind) -> Self {
        Self::new(Target::Container, kind)
    }
}

/// Identity of a bound handler, assigned once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Binding {
    target: Target,
    kind: EventKind,
}

/// Registry of bound handlers. Removal goes through the id handed out by
/// [`Listeners::add`], never through a freshly built description.
#[derive(Debug, Default)]
pub struct Listeners {
    next_id: u64,
    bound: BTreeMap<ListenerId, Binding>,
    index: BTreeSet<Binding>,
}

impl Listeners {
    pub fn add(&mut self, target: Target, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let binding = Binding { target, kind };
        self.bound.insert(id, binding);
        self.index.insert(binding);
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.bound.remove(&id) {
            Some(binding) => {
                if !self.bound.values().any(|b| *b == binding) {
                    self.index.remove(&binding);
                }
                true
            }
            None => false,
        }
    }

    pub fn accepts(&self, target: Target, kind: EventKind) -> bool {
        self.index.contains(&Binding { target, kind })
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// A carousel container and everything rendered into it.
#[derive(Debug)]
pub struct Container {
    id: String,
    layout: ContainerLayout,
    dataset: BTreeMap<String, String>,
    tabindex: Option<i32>,
    track_offset_percent: usize,
    indicators: Vec<bool>,
    listeners: Listeners,
}

impl Container {
    pub fn new(id: impl Into<String>, layout: ContainerLayout) -> Result<Self, Error> {
        let id = id.into();
        if !layout.track {
            return Err(Error::MissingTrack(id));
        }
        if layout.slides == 0 {
            return Err(Error::NoSlides(id));
        }
        Ok(Self {
            id,
            layout,
            dataset: BTreeMap::new(),
            tabindex: None,
            track_offset_percent: 0,
            indicators: vec![false; layout.indicators],
            listeners: Listeners::default(),
        })
    }

    pub fn with_dataset(mut self, dataset: BTreeMap<String, String>) -> Self {
        self.dataset = dataset;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn layout(&self) -> ContainerLayout {
        self.layout
    }

    pub fn slide_count(&self) -> usize {
        self.layout.slides
    }

    pub fn dataset(&self) -> &BTreeMap<String, String> {
        &self.dataset
    }

    pub fn tabindex(&self) -> Option<i32> {
        self.tabindex
    }

    pub fn set_tabindex(&mut self, tabindex: i32) {
        self.tabindex = Some(tabindex);
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    /// Position the track on `index` and mark exactly that dot active.
    pub fn render(&mut self, index: usize) {
        self.track_offset_percent = index * 100;
        for (i, dot) in self.indicators.iter_mut().enumerate() {
            *dot = i == index;
        }
    }

    pub fn track_transform(&self) -> String {
        format!("translateX(-{}%)", self.track_offset_percent)
    }

    pub fn indicators(&self) -> &[bool] {
        &self.indicators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_track_and_empty_slides() {
        let no_track = ContainerLayout {
            track: false,
            ..ContainerLayout::standard(3)
        };
        assert!(matches!(
            Container::new("a", no_track),
            Err(Error::MissingTrack(id)) if id == "a"
        ));
        assert!(matches!(
            Container::new("b", ContainerLayout::standard(0)),
            Err(Error::NoSlides(_))
        ));
    }

    #[test]
    fn render_marks_single_indicator() {
        let mut c = Container::new("hero", ContainerLayout::standard(4)).unwrap();
        c.render(2);
        assert_eq!(c.indicators(), &[false, false, true, false]);
        assert_eq!(c.track_transform(), "translateX(-200%)");
        c.render(0);
        assert_eq!(c.indicators(), &[true, false, false, false]);
        assert_eq!(c.track_transform(), "translateX(-0%)");
    }

    #[test]
    fn listeners_are_revoked_by_id() {
        let mut listeners = Listeners::default();
        let a = listeners.add(Target::Prev, EventKind::Click);
        let b = listeners.add(Target::Prev, EventKind::Click);
        assert_ne!(a, b);
        assert!(listeners.accepts(Target::Prev, EventKind::Click));

        assert!(listeners.remove(a));
        assert!(!listeners.remove(a));
        assert!(listeners.accepts(Target::Prev, EventKind::Click));

        assert!(listeners.remove(b));
        assert!(!listeners.accepts(Target::Prev, EventKind::Click));
        assert!(listeners.is_empty());
    }
}
