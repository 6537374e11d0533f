//! Timestamped input scripts replayed against a live [`Page`].

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use crate::container::{DomEvent, EventKind, Key, Target};
use crate::page::Page;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Script {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    /// Offset from the start of the replay.
    pub at_ms: u64,
    pub carousel: String,
    #[serde(flatten)]
    pub action: Action,
}

/// What the host does at a step: a page event or a direct API call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Action {
    Click { target: Target },
    KeyDown { key: Key },
    FocusIn,
    FocusOut,
    TouchStart { x: f64 },
    TouchMove { x: f64 },
    TouchEnd,
    PointerEnter,
    PointerLeave,
    Advance,
    Retreat,
    JumpTo { index: usize },
    StartAutoplay,
    StopAutoplay,
    Destroy,
}

impl Action {
    /// The host event this action stands for, if it is one.
    pub fn dom_event(&self) -> Option<DomEvent> {
        let event = match *self {
            Self::Click { target } => DomEvent::click(target),
            Self::KeyDown { key } => DomEvent::key_down(key),
            Self::FocusIn => DomEvent::on_container(EventKind::FocusIn),
            Self::FocusOut => DomEvent::on_container(EventKind::FocusOut),
            Self::TouchStart { x } => DomEvent::touch(EventKind::TouchStart, x),
            Self::TouchMove { x } => DomEvent::touch(EventKind::TouchMove, x),
            Self::TouchEnd => DomEvent::on_container(EventKind::TouchEnd),
            Self::PointerEnter => DomEvent::on_container(EventKind::PointerEnter),
            Self::PointerLeave => DomEvent::on_container(EventKind::PointerLeave),
            Self::Advance
            | Self::Retreat
            | Self::JumpTo { .. }
            | Self::StartAutoplay
            | Self::StopAutoplay
            | Self::Destroy => return None,
        };
        Some(event)
    }
}

impl Script {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut script: Self = serde_yaml::from_str(yaml).context("failed to parse script YAML")?;
        script.steps.sort_by_key(|step| step.at_ms);
        Ok(script)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_yaml_str(&s)
    }

    /// Time of the last step.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.steps.last().map_or(0, |s| s.at_ms))
    }

    /// Play every step at its offset from now. A step aimed at an unknown or
    /// already destroyed carousel is logged and skipped.
    pub async fn replay(&self, page: &Page) -> Result<()> {
        let start = Instant::now();
        for step in &self.steps {
            sleep_until(start + Duration::from_millis(step.at_ms)).await;
            if let Err(err) = perform(page, step).await {
                warn!(
                    at_ms = step.at_ms,
                    carousel = step.carousel.as_str(),
                    action = ?step.action,
                    "script step skipped: {err}"
                );
            }
        }
        Ok(())
    }
}

async fn perform(page: &Page, step: &Step) -> Result<(), crate::error::Error> {
    let handle = page.carousel(&step.carousel)?;
    if let Some(event) = step.action.dom_event() {
        return handle.dispatch(event).await;
    }
    match step.action {
        Action::Advance => handle.advance().await,
        Action::Retreat => handle.retreat().await,
        Action::JumpTo { index } => handle.jump_to(index).await,
        Action::StartAutoplay => handle.start_autoplay().await,
        Action::StopAutoplay => handle.stop_autoplay().await,
        Action::Destroy => {
            let container = handle.destroy().await?;
            info!(
                carousel = container.id(),
                listeners = container.listeners().len(),
                "carousel destroyed by script"
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_orders_steps() {
        let yaml = r#"
steps:
  - at-ms: 900
    carousel: hero
    event: touch-end
  - at-ms: 0
    carousel: hero
    event: click
    target: next
  - at-ms: 100
    carousel: hero
    event: click
    target:
      indicator: 2
  - at-ms: 200
    carousel: hero
    event: key-down
    key: ArrowLeft
  - at-ms: 300
    carousel: hero
    event: touch-start
    x: 300
  - at-ms: 400
    carousel: hero
    event: jump-to
    index: 1
"#;
        let script = Script::from_yaml_str(yaml).unwrap();
        let times: Vec<u64> = script.steps.iter().map(|s| s.at_ms).collect();
        assert_eq!(times, vec![0, 100, 200, 300, 400, 900]);
        assert_eq!(
            script.steps[1].action,
            Action::Click {
                target: Target::Indicator(2)
            }
        );
        assert_eq!(
            script.steps[2].action.dom_event(),
            Some(DomEvent::key_down(Key::ArrowLeft))
        );
        assert_eq!(script.steps[4].action, Action::JumpTo { index: 1 });
        assert!(script.steps[4].action.dom_event().is_none());
        assert_eq!(script.duration(), Duration::from_millis(900));
    }

    #[test]
    fn unknown_keys_map_to_other() {
        let yaml = r#"
steps:
  - at-ms: 0
    carousel: c
    event: key-down
    key: Enter
"#;
        let script = Script::from_yaml_str(yaml).unwrap();
        assert_eq!(script.steps[0].action, Action::KeyDown { key: Key::Other });
    }
}
