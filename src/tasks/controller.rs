use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::carousel::{Carousel, SlideChange, TRANSITION_COOLDOWN};
use crate::config::CarouselOptions;
use crate::container::{Container, DomEvent, EventKind, Key, ListenerId, Target};
use crate::error::Error;
use crate::events::{CarouselChange, CarouselSnapshot, ControlCommand, ControllerInput};
use crate::gesture::{Swipe, SwipeTracker};

const INPUT_QUEUE: usize = 64;

/// Handlers bound on the container element itself.
const CONTAINER_EVENTS: [EventKind; 8] = [
    EventKind::KeyDown,
    EventKind::FocusIn,
    EventKind::FocusOut,
    EventKind::TouchStart,
    EventKind::TouchMove,
    EventKind::TouchEnd,
    EventKind::PointerEnter,
    EventKind::PointerLeave,
];

/// Cheap, cloneable front door to a running controller.
#[derive(Debug, Clone)]
pub struct CarouselHandle {
    id: Arc<str>,
    tx: Sender<ControllerInput>,
}

impl CarouselHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, input: ControllerInput) -> Result<(), Error> {
        self.tx.send(input).await.map_err(|_| Error::Detached)
    }

    async fn control(&self, cmd: ControlCommand) -> Result<(), Error> {
        self.send(ControllerInput::Control(cmd)).await
    }

    /// Forward a host event. Events without a bound handler are dropped.
    pub async fn dispatch(&self, event: DomEvent) -> Result<(), Error> {
        self.send(ControllerInput::Dom(event)).await
    }

    pub async fn advance(&self) -> Result<(), Error> {
        self.control(ControlCommand::Advance).await
    }

    pub async fn retreat(&self) -> Result<(), Error> {
        self.control(ControlCommand::Retreat).await
    }

    pub async fn jump_to(&self, index: usize) -> Result<(), Error> {
        self.control(ControlCommand::JumpTo(index)).await
    }

    pub async fn start_autoplay(&self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        self.control(ControlCommand::StartAutoplay(tx)).await?;
        rx.await.map_err(|_| Error::Detached)
    }

    /// Returns once the timer is gone; no automatic advance fires afterwards.
    pub async fn stop_autoplay(&self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        self.control(ControlCommand::StopAutoplay(tx)).await?;
        rx.await.map_err(|_| Error::Detached)
    }

    pub async fn snapshot(&self) -> Result<CarouselSnapshot, Error> {
        let (tx, rx) = oneshot::channel();
        self.control(ControlCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| Error::Detached)
    }

    /// Stop autoplay, unbind every handler and end the controller.
    /// Returns the detached container.
    pub async fn destroy(&self) -> Result<Container, Error> {
        let (tx, rx) = oneshot::channel();
        self.control(ControlCommand::Destroy(tx)).await?;
        rx.await.map_err(|_| Error::Detached)
    }
}

/// Create the input channel for a controller and the handle that feeds it.
pub fn channel(id: &str) -> (CarouselHandle, Receiver<ControllerInput>) {
    let (tx, rx) = mpsc::channel(INPUT_QUEUE);
    let handle = CarouselHandle {
        id: Arc::from(id),
        tx,
    };
    (handle, rx)
}

/// Spawn a controller for `container` on the current runtime.
pub fn spawn(
    container: Container,
    options: CarouselOptions,
    changes: Sender<CarouselChange>,
    cancel: CancellationToken,
) -> (CarouselHandle, JoinHandle<Result<()>>) {
    let (handle, inputs) = channel(container.id());
    let task = tokio::spawn(run(container, options, inputs, changes, cancel));
    (handle, task)
}

/// Drives one carousel until it is destroyed, cancelled, or every handle is dropped.
///
/// Rules:
/// - Host events and commands are applied in arrival order.
/// - An accepted operation renders, notifies, and holds the lock for
///   [`TRANSITION_COOLDOWN`]; the release is polled before input so a tick
///   landing on the same instant sees the lock already released.
/// - Autoplay fires `advance` every interval; stopping it drops the timer so
///   no pending tick can fire afterwards.
pub async fn run(
    container: Container,
    options: CarouselOptions,
    mut inputs: Receiver<ControllerInput>,
    changes: Sender<CarouselChange>,
    cancel: CancellationToken,
) -> Result<()> {
    let options = options.validated()?;
    let mut ctl = Controller::attach(container, options, changes);

    loop {
        select! {
            biased;

            _ = cancel.cancelled() => {
                ctl.detach();
                break;
            }

            _ = lock_released(&mut ctl.lock_release) => {
                ctl.lock_release = None;
                ctl.carousel.release_lock();
                trace!(carousel = ctl.container.id(), "transition lock released");
            }

            maybe_input = inputs.recv() => {
                match maybe_input {
                    Some(ControllerInput::Dom(event)) => ctl.on_dom_event(event),
                    Some(ControllerInput::Control(ControlCommand::Destroy(reply))) => {
                        ctl.detach();
                        if reply.send(ctl.container).is_err() {
                            debug!("destroy requester went away before the container was returned");
                        }
                        return Ok(());
                    }
                    Some(ControllerInput::Control(cmd)) => ctl.on_command(cmd),
                    None => {
                        // Every handle dropped; nobody can drive or destroy us any more.
                        ctl.detach();
                        break;
                    }
                }
            }

            _ = next_tick(&mut ctl.autoplay.timer) => {
                let change = ctl.carousel.advance();
                ctl.apply(change, "autoplay");
            }
        }
    }

    Ok(())
}

async fn lock_released(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

/// Owns at most one repeating timer.
#[derive(Debug)]
struct Autoplay {
    period: Duration,
    timer: Option<Interval>,
}

impl Autoplay {
    fn new(period: Duration) -> Self {
        Self {
            period,
            timer: None,
        }
    }

    fn start(&mut self) {
        // First firing is one full period out, like a browser interval.
        let mut timer = interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
    }

    fn stop(&mut self) {
        self.timer = None;
    }

    fn is_running(&self) -> bool {
        self.timer.is_some()
    }
}

struct Controller {
    container: Container,
    carousel: Carousel,
    options: CarouselOptions,
    autoplay: Autoplay,
    swipe: SwipeTracker,
    focused: bool,
    lock_release: Option<Pin<Box<Sleep>>>,
    bindings: Vec<ListenerId>,
    changes: Sender<CarouselChange>,
}

impl Controller {
    fn attach(
        mut container: Container,
        options: CarouselOptions,
        changes: Sender<CarouselChange>,
    ) -> Self {
        let carousel = Carousel::new(container.slide_count(), options.loop_slides);
        let bindings = bind_handlers(&mut container);
        container.set_tabindex(0);

        info!(
            carousel = container.id(),
            slides = carousel.slide_count(),
            indicators = container.layout().indicators,
            autoplay = options.autoplay,
            interval_ms = options.interval_ms,
            looping = options.loop_slides,
            "carousel attached"
        );

        let mut ctl = Self {
            container,
            carousel,
            options,
            autoplay: Autoplay::new(options.interval()),
            swipe: SwipeTracker::default(),
            focused: false,
            lock_release: None,
            bindings,
            changes,
        };
        if options.autoplay {
            ctl.autoplay.start();
        }
        ctl.render();
        ctl
    }

    fn on_dom_event(&mut self, event: DomEvent) {
        if !self.container.listeners().accepts(event.target, event.kind) {
            trace!(
                carousel = self.container.id(),
                target = ?event.target,
                kind = ?event.kind,
                "no handler bound; event dropped"
            );
            return;
        }

        match (event.target, event.kind) {
            (Target::Prev, EventKind::Click) => {
                let change = self.carousel.retreat();
                self.apply(change, "prev-control");
            }
            (Target::Next, EventKind::Click) => {
                let change = self.carousel.advance();
                self.apply(change, "next-control");
            }
            (Target::Indicator(index), EventKind::Click) => {
                let change = self.carousel.jump_to(index);
                self.apply(change, "indicator");
            }
            (Target::Container, EventKind::KeyDown) => {
                if !self.focused {
                    return;
                }
                match event.key {
                    Some(Key::ArrowLeft) => {
                        let change = self.carousel.retreat();
                        self.apply(change, "keyboard");
                    }
                    Some(Key::ArrowRight) => {
                        let change = self.carousel.advance();
                        self.apply(change, "keyboard");
                    }
                    Some(Key::Other) | None => {}
                }
            }
            (Target::Container, EventKind::FocusIn) => self.focused = true,
            (Target::Container, EventKind::FocusOut) => self.focused = false,
            (Target::Container, EventKind::TouchStart) => {
                if let Some(x) = event.x {
                    self.swipe.start(x);
                }
            }
            (Target::Container, EventKind::TouchMove) => {
                if let Some(x) = event.x {
                    self.swipe.sample(x);
                }
            }
            (Target::Container, EventKind::TouchEnd) => match self.swipe.end() {
                Some(Swipe::Next) => {
                    let change = self.carousel.advance();
                    self.apply(change, "swipe");
                }
                Some(Swipe::Previous) => {
                    let change = self.carousel.retreat();
                    self.apply(change, "swipe");
                }
                None => {}
            },
            (Target::Container, EventKind::PointerEnter) => {
                if self.options.autoplay {
                    self.autoplay.stop();
                    debug!(
                        carousel = self.container.id(),
                        "autoplay paused on hover"
                    );
                }
            }
            (Target::Container, EventKind::PointerLeave) => {
                if self.options.autoplay {
                    self.autoplay.start();
                    debug!(
                        carousel = self.container.id(),
                        "autoplay resumed"
                    );
                }
            }
            (target, kind) => {
                trace!(?target, ?kind, "bound event has no carousel action");
            }
        }
    }

    fn on_command(&mut self, cmd: ControlCommand) {
        match cmd {
            ControlCommand::Advance => {
                let change = self.carousel.advance();
                self.apply(change, "api");
            }
            ControlCommand::Retreat => {
                let change = self.carousel.retreat();
                self.apply(change, "api");
            }
            ControlCommand::JumpTo(index) => {
                let change = self.carousel.jump_to(index);
                self.apply(change, "api");
            }
            ControlCommand::StartAutoplay(ack) => {
                self.autoplay.start();
                if ack.send(()).is_err() {
                    debug!(
                        carousel = self.container.id(),
                        "start-autoplay requester went away"
                    );
                }
            }
            ControlCommand::StopAutoplay(ack) => {
                self.autoplay.stop();
                if ack.send(()).is_err() {
                    debug!(
                        carousel = self.container.id(),
                        "stop-autoplay requester went away"
                    );
                }
            }
            ControlCommand::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    debug!(
                        carousel = self.container.id(),
                        "snapshot requester went away"
                    );
                }
            }
            ControlCommand::Destroy(_) => {
                // Handled by the run loop, which owns the container hand-off.
            }
        }
    }

    fn apply(&mut self, change: Option<SlideChange>, source: &'static str) {
        let Some(SlideChange { from, to }) = change else {
            trace!(
                carousel = self.container.id(),
                source,
                locked = self.carousel.is_locked(),
                "operation rejected"
            );
            return;
        };
        self.lock_release = Some(Box::pin(sleep(TRANSITION_COOLDOWN)));
        debug!(carousel = self.container.id(), from, to, source, "slide changed");
        self.render();
    }

    /// Display update: position the track, sync the dots, notify listeners.
    fn render(&mut self) {
        let index = self.carousel.current();
        self.container.render(index);
        let change = CarouselChange {
            carousel: self.container.id().to_owned(),
            current_index: index,
        };
        match self.changes.try_send(change) {
            Ok(()) => {}
            Err(TrySendError::Full(change)) => {
                warn!(
                    carousel = change.carousel.as_str(),
                    index = change.current_index,
                    "change listener is lagging; notification dropped"
                );
            }
            Err(TrySendError::Closed(_)) => {
                trace!(carousel = self.container.id(), "no change listener attached");
            }
        }
    }

    fn snapshot(&self) -> CarouselSnapshot {
        CarouselSnapshot {
            current_index: self.carousel.current(),
            slide_count: self.carousel.slide_count(),
            phase: self.carousel.phase(),
            autoplay_running: self.autoplay.is_running(),
            focused: self.focused,
            track_transform: self.container.track_transform(),
            indicators: self.container.indicators().to_vec(),
            listeners: self.container.listeners().len(),
        }
    }

    /// Release the timer and every handler this controller bound.
    fn detach(&mut self) {
        self.autoplay.stop();
        self.lock_release = None;
        let listeners = self.container.listeners_mut();
        for id in self.bindings.drain(..) {
            if !listeners.remove(id) {
                warn!(?id, "handler was already unbound");
            }
        }
        info!(
            carousel = self.container.id(),
            index = self.carousel.current(),
            "carousel detached"
        );
    }
}

fn bind_handlers(container: &mut Container) -> Vec<ListenerId> {
    let layout = container.layout();
    let listeners = container.listeners_mut();
    let mut ids = Vec::new();
    if layout.prev {
        ids.push(listeners.add(Target::Prev, EventKind::Click));
    }
    if layout.next {
        ids.push(listeners.add(Target::Next, EventKind::Click));
    }
    for index in 0..layout.indicators {
        ids.push(listeners.add(Target::Indicator(index), EventKind::Click));
    }
    for kind in CONTAINER_EVENTS {
        ids.push(listeners.add(Target::Container, kind));
    }
    ids
}
