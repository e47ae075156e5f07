use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisWeights {
    pub sleep: f64,
    pub stress: f64,
    pub workload: f64,
    pub mood: f64,
    pub hydration: f64,
}

impl Default for AxisWeights {
    fn default() -> Self {
        Self {
            sleep: 0.30,
            stress: 0.25,
            workload: 0.20,
            mood: 0.15,
            hydration: 0.10,
        }
    }
}

impl AxisWeights {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Sleep => self.sleep,
            Axis::Stress => self.stress,
            Axis::Workload => self.workload,
            Axis::Mood => self.mood,
            Axis::Hydration => self.hydration,
        }
    }

    pub fn total(&self) -> f64 {
        Axis::ALL.iter().map(|axis| self.get(*axis)).sum()
    }
}

/// Raw values imputed for a missing field when the user has no history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralDefaults {
    pub mood: f64,
    pub sleep_hours: f64,
    pub stress_level: f64,
    pub workload_hours: f64,
    pub water_liters: f64,
}

impl Default for NeutralDefaults {
    fn default() -> Self {
        Self {
            mood: 5.0,
            sleep_hours: 5.0,
            stress_level: 5.0,
            workload_hours: 6.0,
            water_liters: 1.0,
        }
    }
}

impl NeutralDefaults {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Sleep => self.sleep_hours,
            Axis::Stress => self.stress_level,
            Axis::Workload => self.workload_hours,
            Axis::Mood => self.mood,
            Axis::Hydration => self.water_liters,
        }
    }
}

/// Longest window, span or horizon accepted from configuration.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Every tunable constant of the engine. None of these carry clinical meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: AxisWeights,
    /// Calendar days before the check-in that feed the smoothing average.
    pub trailing_window_days: u32,
    /// Weight of the past in the blend, in [0,1).
    pub smoothing_factor: f64,
    pub sleep_ceiling_hours: f64,
    pub hydration_target_liters: f64,
    pub workload_ceiling_hours: f64,
    pub imputation_window_days: u32,
    pub neutral_defaults: NeutralDefaults,
    /// A 3-day MRI delta at or below this bumps Moderate/High up one level.
    pub decline_threshold: f64,
    pub decline_span_days: u32,
    pub forecast_window: usize,
    pub forecast_min_history: usize,
    pub forecast_horizon_days: u32,
    pub forecast_band_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: AxisWeights::default(),
            trailing_window_days: 7,
            smoothing_factor: 0.3,
            sleep_ceiling_hours: 8.0,
            hydration_target_liters: 2.0,
            workload_ceiling_hours: 12.0,
            imputation_window_days: 7,
            neutral_defaults: NeutralDefaults::default(),
            decline_threshold: -10.0,
            decline_span_days: 3,
            forecast_window: 7,
            forecast_min_history: 3,
            forecast_horizon_days: 7,
            forecast_band_scale: 15.0,
        }
    }
}

impl EngineConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&text)
            .with_context(|| format!("invalid config JSON in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(EngineError::validation(
                "weights",
                format!("must sum to 1.0, got {:.4}", self.weights.total()),
            ));
        }
        if Axis::ALL.iter().any(|axis| self.weights.get(*axis) < 0.0) {
            return Err(EngineError::validation("weights", "must be non-negative"));
        }
        if !(0.0..1.0).contains(&self.smoothing_factor) {
            return Err(EngineError::validation(
                "smoothing_factor",
                "must be in [0, 1)",
            ));
        }
        let windows = [
            ("trailing_window_days", self.trailing_window_days, 1),
            ("imputation_window_days", self.imputation_window_days, 1),
            ("decline_span_days", self.decline_span_days, 2),
            ("forecast_horizon_days", self.forecast_horizon_days, 1),
        ];
        for (field, days, min) in windows {
            if !(min..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(EngineError::validation(
                    field,
                    format!("must be between {min} and {MAX_WINDOW_DAYS} days"),
                ));
            }
        }
        if !(self.decline_threshold.is_finite() && self.decline_threshold < 0.0) {
            return Err(EngineError::validation(
                "decline_threshold",
                "must be a negative number of points",
            ));
        }
        if self.forecast_min_history < 2 || self.forecast_window < self.forecast_min_history {
            return Err(EngineError::validation(
                "forecast_window",
                "needs at least two points and must cover the minimum history",
            ));
        }
        let ceilings = [
            ("sleep_ceiling_hours", self.sleep_ceiling_hours),
            ("hydration_target_liters", self.hydration_target_liters),
            ("workload_ceiling_hours", self.workload_ceiling_hours),
            ("forecast_band_scale", self.forecast_band_scale),
        ];
        for (field, value) in ceilings {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::validation(field, "must be positive"));
            }
        }
        Ok(())
    }
}
