use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::primitives::{BoardConfig, HoleSpec, PadSpec};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// What the engine does after a routing gesture completes a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Stay armed with no anchor so the next two clicks route another trace.
    #[default]
    StayArmed,
    /// Leave routing mode after every trace.
    DisarmAfterTrace,
}

/// Editor-wide settings. Every field has a default, so a partial JSON file
/// only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub board: BoardConfig,
    /// Grid pitch all placements snap to (mm).
    pub grid_pitch: f64,
    /// Elevation of the top copper layer above the board's top face (mm).
    pub top_layer_height: f64,
    /// Extra lift of traces above the top layer, keeps them from z-fighting pads.
    pub trace_layer_offset: f64,
    pub trace_width: f64,
    pub pad: PadSpec,
    pub hole: HoleSpec,
    pub routing_policy: RoutingPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            grid_pitch: 1.25,
            top_layer_height: 0.035,
            trace_layer_offset: 0.002,
            trace_width: 0.55,
            pad: PadSpec::default(),
            hole: HoleSpec::default(),
            routing_policy: RoutingPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn trace_layer_height(&self) -> f64 {
        self.top_layer_height + self.trace_layer_offset
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("board.width", self.board.width),
            ("board.height", self.board.height),
            ("board.thickness", self.board.thickness),
            ("grid_pitch", self.grid_pitch),
            ("trace_width", self.trace_width),
            ("pad.width", self.pad.width),
            ("pad.depth", self.pad.depth),
            ("pad.thickness", self.pad.thickness),
            ("hole.drill_radius", self.hole.drill_radius),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        let non_negative = [
            ("hole.ring_width", self.hole.ring_width),
            ("top_layer_height", self.top_layer_height),
            ("trace_layer_offset", self.trace_layer_offset),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and validate a config file.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
