use log::warn;
use serde::{Deserialize, Serialize};

use tracearc_core::{RadiusPolicy, SmoothOptions, TransitionOptions};

/// Engine options recognized from the host's settings store.
///
/// Unknown keys in stored JSON are ignored and missing keys fall back to
/// their defaults, so configs survive version skew in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeautifyConfig {
    /// Corner radius = widest adjacent trace width × this ratio.
    pub corner_radius_ratio: f64,
    /// Accept arcs whose tangent length was clamped by the leg rule.
    pub force_arc: bool,
    /// Merge same-direction corner pairs joined by a short stub into a
    /// single arc.
    pub merge_transition_segments: bool,
    /// Run the design check feedback loop after the optimistic pass.
    pub enable_drc: bool,
    /// Additional check cycles allowed after the first one.
    pub drc_retry_count: u32,
    /// Ideal taper length = width delta × this ratio.
    pub width_transition_ratio: f64,
    /// Upper bound on taper sub-segments per junction.
    pub width_transition_segments: usize,
    /// Taper length split: 0 puts everything on the narrow side, 100
    /// entirely on the wide side.
    pub width_transition_balance: u8,
}

impl Default for BeautifyConfig {
    fn default() -> Self {
        Self {
            corner_radius_ratio: 2.0,
            force_arc: false,
            merge_transition_segments: true,
            enable_drc: true,
            drc_retry_count: 4,
            width_transition_ratio: 3.0,
            width_transition_segments: 16,
            width_transition_balance: 50,
        }
    }
}

impl BeautifyConfig {
    /// Clamp out-of-range values instead of rejecting the config; hosts
    /// routinely hand over stale or hand-edited settings.
    pub fn sanitized(mut self) -> Self {
        if self.width_transition_balance > 100 {
            warn!(
                "width_transition_balance {} clamped to 100",
                self.width_transition_balance
            );
            self.width_transition_balance = 100;
        }
        if self.corner_radius_ratio < 0.0 {
            warn!("negative corner_radius_ratio clamped to 0");
            self.corner_radius_ratio = 0.0;
        }
        if self.width_transition_ratio < 0.0 {
            warn!("negative width_transition_ratio clamped to 0");
            self.width_transition_ratio = 0.0;
        }
        self
    }

    pub fn radius_policy(&self) -> RadiusPolicy {
        RadiusPolicy::WidthRatio(self.corner_radius_ratio)
    }

    pub fn smooth_options(&self) -> SmoothOptions {
        SmoothOptions {
            policy: self.radius_policy(),
            force_arc: self.force_arc,
            merge_u_turns: self.merge_transition_segments,
        }
    }

    pub fn transition_options(&self) -> TransitionOptions {
        TransitionOptions {
            length_ratio: self.width_transition_ratio,
            max_segments: self.width_transition_segments,
            balance: self.width_transition_balance,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
