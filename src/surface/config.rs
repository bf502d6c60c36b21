//! Surface configuration: venue geometry, gesture thresholds, throttling policy, the
//! floor-plan deck and the fader patch.
//!
//! Every field has a default, so a configuration file only needs to name what differs from
//! the measured main hall.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use crate::surface::constants::{
    FADER_INTERVAL_MS, HALL_HEIGHT_M, HALL_WIDTH_M, MARGIN_RATIO, OUTBOUND_CAPACITY,
    PAGING_BAND_RATIO, SOURCE_INTERVAL_MS, SOURCE_MIN_DELTA_M, SPEAKER_HIT_RADIUS_PX,
    SWIPE_THRESHOLD_PX, TAP_SLOP_PX,
};
use crate::surface::errors::ConfigError;
use crate::surface::fader_map::{FaderMapping, default_fader_channels};
use crate::surface::floor_plan::{FloorPlan, default_floor_plans};

/// Physical hall size in meters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HallConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for HallConfig {
    fn default() -> Self {
        Self {
            width: HALL_WIDTH_M,
            height: HALL_HEIGHT_M,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub hall: HallConfig,
    pub margin_ratio: f64,
    pub paging_band_ratio: f64,
    pub swipe_threshold_px: f64,
    pub tap_slop_px: f64,
    pub speaker_hit_radius_px: f64,
    pub source_interval_ms: u64,
    pub source_min_delta_m: Option<f64>,
    pub fader_interval_ms: u64,
    pub fader_min_delta: Option<f64>,
    /// Distance at which a speaker's panning gain reaches zero; the hall diagonal if unset.
    pub max_pan_distance_m: Option<f64>,
    pub outbound_capacity: usize,
    pub floor_plans: Vec<FloorPlan>,
    pub fader_map: HashMap<String, u32>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            hall: HallConfig::default(),
            margin_ratio: MARGIN_RATIO,
            paging_band_ratio: PAGING_BAND_RATIO,
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
            tap_slop_px: TAP_SLOP_PX,
            speaker_hit_radius_px: SPEAKER_HIT_RADIUS_PX,
            source_interval_ms: SOURCE_INTERVAL_MS,
            source_min_delta_m: Some(SOURCE_MIN_DELTA_M),
            fader_interval_ms: FADER_INTERVAL_MS,
            fader_min_delta: None,
            max_pan_distance_m: None,
            outbound_capacity: OUTBOUND_CAPACITY,
            floor_plans: default_floor_plans(),
            fader_map: default_fader_channels(),
        }
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..0.5).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRatio { name, value })
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

impl SurfaceConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded surface configuration from {} ({} floor plans)",
            path.display(),
            config.floor_plans.len()
        );
        Ok(config)
    }

    /// Checks the invariants the rest of the surface relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let HallConfig { width, height } = self.hall;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ConfigError::InvalidHall { width, height });
        }

        check_ratio("margin_ratio", self.margin_ratio)?;
        check_ratio("paging_band_ratio", self.paging_band_ratio)?;
        check_threshold("swipe_threshold_px", self.swipe_threshold_px)?;
        check_threshold("tap_slop_px", self.tap_slop_px)?;
        check_threshold("speaker_hit_radius_px", self.speaker_hit_radius_px)?;
        if let Some(delta) = self.source_min_delta_m {
            check_threshold("source_min_delta_m", delta)?;
        }
        if let Some(delta) = self.fader_min_delta {
            check_threshold("fader_min_delta", delta)?;
        }
        if let Some(distance) = self.max_pan_distance_m {
            check_threshold("max_pan_distance_m", distance)?;
        }

        if self.floor_plans.is_empty() {
            return Err(ConfigError::EmptyDeck);
        }

        for plan in &self.floor_plans {
            if plan.speakers.is_empty() {
                return Err(ConfigError::EmptyFloorPlan {
                    label: plan.label.clone(),
                });
            }

            let mut seen = HashSet::new();
            for id in plan.ids() {
                if !seen.insert(id) {
                    return Err(ConfigError::DuplicateSpeaker {
                        label: plan.label.clone(),
                        id: id.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn fader_mapping(&self) -> FaderMapping {
        FaderMapping::new(self.fader_map.clone())
    }

    pub fn source_interval(&self) -> Duration {
        Duration::from_millis(self.source_interval_ms)
    }

    pub fn fader_interval(&self) -> Duration {
        Duration::from_millis(self.fader_interval_ms)
    }

    pub fn max_pan_distance(&self) -> f64 {
        self.max_pan_distance_m
            .unwrap_or_else(|| self.hall.width.hypot(self.hall.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = SurfaceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fader_mapping().resolve("nexo5"), Some(20));
        assert_eq!(config.source_interval(), Duration::from_millis(50));
        assert!((config.max_pan_distance() - 15.1f64.hypot(19.4)).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SurfaceConfig::from_json_str(r#"{"swipe_threshold_px": 80}"#).unwrap();
        assert_eq!(config.swipe_threshold_px, 80.0);
        assert_eq!(config.margin_ratio, MARGIN_RATIO);
        assert_eq!(config.floor_plans.len(), 1);
    }

    #[test]
    fn test_json_deck_and_patch() {
        let json = r#"{
            "hall": {"width": 10.0, "height": 8.0},
            "source_min_delta_m": null,
            "floor_plans": [
                {"label": "Left", "speakers": [{"id": "l1", "x": 1.0, "y": 1.0, "type": "B"}]},
                {"label": "Right", "speakers": [{"id": "r1", "x": 9.0, "y": 1.0}]}
            ],
            "fader_map": {"l1": 1, "r1": 2}
        }"#;
        let config = SurfaceConfig::from_json_str(json).unwrap();

        assert_eq!(config.hall, HallConfig { width: 10.0, height: 8.0 });
        assert_eq!(config.source_min_delta_m, None);
        assert_eq!(config.floor_plans[1].label, "Right");
        assert_eq!(config.fader_mapping().resolve("r1"), Some(2));
        assert_eq!(config.fader_mapping().resolve("nexo1"), None);
    }

    #[test]
    fn test_validation_errors() {
        let err = SurfaceConfig::from_json_str(r#"{"floor_plans": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDeck));

        let err =
            SurfaceConfig::from_json_str(r#"{"floor_plans": [{"label": "x", "speakers": []}]}"#)
                .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFloorPlan { .. }));

        let json = r#"{"floor_plans": [{"label": "x", "speakers": [
            {"id": "a", "x": 0.0, "y": 0.0}, {"id": "a", "x": 1.0, "y": 1.0}]}]}"#;
        let err = SurfaceConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSpeaker { ref id, .. } if id == "a"));

        let err = SurfaceConfig::from_json_str(r#"{"hall": {"width": -1, "height": 5}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHall { .. }));

        let err = SurfaceConfig::from_json_str(r#"{"margin_ratio": 0.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRatio { name: "margin_ratio", .. }));

        let err = SurfaceConfig::from_json_str(r#"{"tap_slop_px": -2}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));

        let err = SurfaceConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_from_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("surface.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"fader_interval_ms": 20}"#).unwrap();

        let config = SurfaceConfig::from_path(&path).unwrap();
        assert_eq!(config.fader_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_from_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.json");

        let result = SurfaceConfig::from_path(&path);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
