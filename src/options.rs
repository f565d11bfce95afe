use std::time::Duration;

use serde::Deserialize;

use crate::error::LandingError;

pub const OPTIONS_ELEMENT_SELECTOR: &str = "#landing-options";

const DEFAULT_NOTIFICATION_LIFETIME_MS: u64 = 4_000;
const DEFAULT_NOTIFICATION_FADE_MS: u64 = 300;
const DEFAULT_SUBMIT_DELAY_MS: u64 = 1_000;
const DEFAULT_ANCHOR_OFFSET_PX: f64 = 80.0;
const DEFAULT_SECTION_OFFSET_PX: f64 = 100.0;
const DEFAULT_CAROUSEL_STEP_PX: f64 = 350.0;
const DEFAULT_CAROUSEL_EDGE_PX: f64 = 10.0;
const DEFAULT_METRICS_DURATION_MS: u64 = 1_500;
const DEFAULT_METRICS_TICK_MS: u64 = 16;

const NOTIFICATION_LIFETIME_MS_BOUNDS: (u64, u64) = (500, 60_000);
const NOTIFICATION_FADE_MS_BOUNDS: (u64, u64) = (0, 5_000);
const SUBMIT_DELAY_MS_BOUNDS: (u64, u64) = (0, 30_000);
const METRICS_DURATION_MS_BOUNDS: (u64, u64) = (16, 60_000);
const METRICS_TICK_MS_BOUNDS: (u64, u64) = (1, 1_000);

/// Timings and offsets used by the page components.
///
/// Every field falls back to its default, so a page may override a single
/// value from its `#landing-options` JSON block.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PageOptions {
    pub notification_lifetime_ms: u64,
    pub notification_fade_ms: u64,
    pub submit_delay_ms: u64,
    pub anchor_offset_px: f64,
    pub section_offset_px: f64,
    pub carousel_step_px: f64,
    pub carousel_edge_px: f64,
    pub metrics_duration_ms: u64,
    pub metrics_tick_ms: u64,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            notification_lifetime_ms: DEFAULT_NOTIFICATION_LIFETIME_MS,
            notification_fade_ms: DEFAULT_NOTIFICATION_FADE_MS,
            submit_delay_ms: DEFAULT_SUBMIT_DELAY_MS,
            anchor_offset_px: DEFAULT_ANCHOR_OFFSET_PX,
            section_offset_px: DEFAULT_SECTION_OFFSET_PX,
            carousel_step_px: DEFAULT_CAROUSEL_STEP_PX,
            carousel_edge_px: DEFAULT_CAROUSEL_EDGE_PX,
            metrics_duration_ms: DEFAULT_METRICS_DURATION_MS,
            metrics_tick_ms: DEFAULT_METRICS_TICK_MS,
        }
    }
}

impl PageOptions {
    pub fn from_json(raw: &str) -> Result<Self, LandingError> {
        let parsed: Self = serde_json::from_str(raw)?;
        Ok(parsed.clamped())
    }

    /// Parses an optional JSON block, falling back to defaults when it is
    /// absent, blank or malformed.
    pub fn from_json_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::default();
        };

        match Self::from_json(raw) {
            Ok(options) => options,
            Err(error) => {
                log::warn!("{error}; using default page options");
                Self::default()
            }
        }
    }

    fn clamped(self) -> Self {
        let defaults = Self::default();
        Self {
            notification_lifetime_ms: clamp_u64(
                self.notification_lifetime_ms,
                NOTIFICATION_LIFETIME_MS_BOUNDS,
            ),
            notification_fade_ms: clamp_u64(self.notification_fade_ms, NOTIFICATION_FADE_MS_BOUNDS),
            submit_delay_ms: clamp_u64(self.submit_delay_ms, SUBMIT_DELAY_MS_BOUNDS),
            anchor_offset_px: finite_or(self.anchor_offset_px, defaults.anchor_offset_px),
            section_offset_px: finite_or(self.section_offset_px, defaults.section_offset_px),
            carousel_step_px: finite_or(self.carousel_step_px, defaults.carousel_step_px).abs(),
            carousel_edge_px: finite_or(self.carousel_edge_px, defaults.carousel_edge_px).abs(),
            metrics_duration_ms: clamp_u64(self.metrics_duration_ms, METRICS_DURATION_MS_BOUNDS),
            metrics_tick_ms: clamp_u64(self.metrics_tick_ms, METRICS_TICK_MS_BOUNDS),
        }
    }

    pub fn notification_lifetime(&self) -> Duration {
        Duration::from_millis(self.notification_lifetime_ms)
    }

    pub fn notification_fade(&self) -> Duration {
        Duration::from_millis(self.notification_fade_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn metrics_tick(&self) -> Duration {
        Duration::from_millis(self.metrics_tick_ms)
    }
}

fn clamp_u64(value: u64, bounds: (u64, u64)) -> u64 {
    value.clamp(bounds.0, bounds.1)
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}
