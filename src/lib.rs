pub mod carousel;
pub mod config;
pub mod container;
pub mod error;
pub mod events;
pub mod gesture;
pub mod page;
pub mod script;
pub mod tasks {
    pub mod controller;
}

pub use carousel::{Carousel, Phase, SlideChange, TRANSITION_COOLDOWN};
pub use config::{CarouselOptions, PageConfig};
pub use container::{Container, ContainerLayout, DomEvent, EventKind, Key, Target};
pub use error::Error;
pub use events::{CarouselChange, CarouselSnapshot};
pub use page::Page;
pub use tasks::controller::CarouselHandle;
