use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tracing::warn;

use crate::container::ContainerLayout;

/// Per-carousel behavior. Every field is independently overridable; an
/// omitted field keeps its default, an explicit `false` stays `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CarouselOptions {
    /// Advance automatically on a timer.
    pub autoplay: bool,
    /// Delay between automatic advances, in ms.
    pub interval_ms: u64,
    /// Wrap around at either end instead of clamping.
    #[serde(rename = "loop")]
    pub loop_slides: bool,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            interval_ms: Self::DEFAULT_INTERVAL_MS,
            loop_slides: true,
        }
    }
}

impl CarouselOptions {
    pub const DEFAULT_INTERVAL_MS: u64 = 5000;

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validated(self) -> Result<Self> {
        ensure!(self.interval_ms > 0, "interval-ms must be positive");
        Ok(self)
    }

    /// Resolve options from a container's `data-*` attributes.
    ///
    /// `autoplay` and `loop` are on unless the attribute is exactly `"false"`.
    /// `interval` falls back to the default when absent, unparsable or zero.
    pub fn from_dataset(dataset: &BTreeMap<String, String>) -> Self {
        let autoplay = dataset.get("autoplay").map(String::as_str) != Some("false");
        let loop_slides = dataset.get("loop").map(String::as_str) != Some("false");
        let interval_ms = match dataset.get("interval") {
            None => Self::DEFAULT_INTERVAL_MS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                Ok(_) | Err(_) => {
                    warn!(
                        interval = raw.as_str(),
                        fallback_ms = Self::DEFAULT_INTERVAL_MS,
                        "ignoring invalid carousel interval attribute"
                    );
                    Self::DEFAULT_INTERVAL_MS
                }
            },
        };
        Self {
            autoplay,
            interval_ms,
            loop_slides,
        }
    }
}

/// One carousel container declared on a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CarouselConfig {
    pub id: String,
    #[serde(flatten)]
    pub layout: ContainerLayout,
    /// Raw `data-*` attributes on the container, without the `data-` prefix.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PageConfig {
    pub carousels: Vec<CarouselConfig>,
}

impl PageConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse page YAML")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read page config {}", path.display()))?;
        Self::from_yaml_str(&s)
    }

    pub fn validated(self) -> Result<Self> {
        let mut seen = HashSet::new();
        for carousel in &self.carousels {
            ensure!(!carousel.id.is_empty(), "carousel id must not be empty");
            ensure!(
                seen.insert(carousel.id.as_str()),
                "duplicate carousel id {:?}",
                carousel.id
            );
            ensure!(
                carousel.layout.track,
                "carousel {:?} has no slide track",
                carousel.id
            );
            ensure!(
                carousel.layout.slides > 0,
                "carousel {:?} must have at least one slide",
                carousel.id
            );
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_dataset_uses_defaults() {
        assert_eq!(
            CarouselOptions::from_dataset(&BTreeMap::new()),
            CarouselOptions::default()
        );
    }

    #[test]
    fn only_literal_false_disables_flags() {
        let opts =
            CarouselOptions::from_dataset(&dataset(&[("autoplay", "false"), ("loop", "no")]));
        assert!(!opts.autoplay);
        assert!(opts.loop_slides);

        let opts =
            CarouselOptions::from_dataset(&dataset(&[("autoplay", "FALSE"), ("loop", "false")]));
        assert!(opts.autoplay);
        assert!(!opts.loop_slides);
    }

    #[test]
    fn bad_interval_falls_back() {
        for raw in ["abc", "0", "-5", ""] {
            let opts = CarouselOptions::from_dataset(&dataset(&[("interval", raw)]));
            assert_eq!(
                opts.interval_ms,
                CarouselOptions::DEFAULT_INTERVAL_MS,
                "{raw:?}"
            );
        }
        let opts = CarouselOptions::from_dataset(&dataset(&[("interval", " 3000 ")]));
        assert_eq!(opts.interval(), Duration::from_secs(3));
    }

    #[test]
    fn zero_interval_rejected() {
        let opts = CarouselOptions {
            interval_ms: 0,
            ..CarouselOptions::default()
        };
        assert!(opts.validated().is_err());
    }
}
