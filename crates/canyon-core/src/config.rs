//! Scenario configuration.
//!
//! A scenario is a JSON document; every section falls back to its defaults
//! when omitted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use canyon_logic::config::{SquadTuning, TuningError};
use canyon_logic::coordinator::CoordinatorConfig;
use canyon_logic::cover::ClusterDetector;
use canyon_logic::exposure::ExposureConfig;
use canyon_logic::finish::FinishZone;
use canyon_logic::geometry::Vec2;
use canyon_logic::grid::{GridConfig, Obstacle};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error("squad {0:?} has no soldiers")]
    EmptySquad(String),
    #[error("cover scatter area is empty or inverted")]
    InvalidScatter,
    #[error("finish zone radius must be positive, got {0}")]
    InvalidFinishZone(f32),
}

/// Covers scattered uniformly inside an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverScatter {
    pub count: usize,
    pub min: Vec2,
    pub max: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverLayout {
    /// Hand-placed covers, spawned first and in this order.
    pub positions: Vec<Vec2>,
    pub scatter: Option<CoverScatter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadSpec {
    pub name: String,
    pub size: usize,
    /// Centre the members are spawned around.
    pub spawn: Vec2,
    /// Max offset of a member from `spawn` on each axis.
    pub spread: f32,
    pub tuning: SquadTuning,
    /// Ordered to move here as soon as the engine is built.
    pub destination: Option<Vec2>,
}

impl Default for SquadSpec {
    fn default() -> Self {
        Self {
            name: String::from("Alpha"),
            size: 4,
            spawn: Vec2::new(0.0, -45.0),
            spread: 2.0,
            tuning: SquadTuning::default(),
            destination: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub grid: GridConfig,
    pub obstacles: Vec<Obstacle>,
    pub detector: ClusterDetector,
    pub coordinator: CoordinatorConfig,
    pub exposure: ExposureConfig,
    pub finish_zone: Option<FinishZone>,
    pub covers: CoverLayout,
    pub squads: Vec<SquadSpec>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            grid: GridConfig::default(),
            obstacles: Vec::new(),
            detector: ClusterDetector::default(),
            coordinator: CoordinatorConfig::default(),
            exposure: ExposureConfig::default(),
            finish_zone: None,
            covers: CoverLayout::default(),
            squads: vec![SquadSpec::default()],
        }
    }
}

impl SimConfig {
    /// Parse and validate a scenario.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.coordinator.validate()?;
        self.exposure.validate()?;
        for squad in &self.squads {
            if squad.size == 0 {
                return Err(ConfigError::EmptySquad(squad.name.clone()));
            }
            squad.tuning.validate()?;
        }
        if let Some(scatter) = &self.covers.scatter {
            if scatter.count > 0 && (scatter.max.x < scatter.min.x || scatter.max.y < scatter.min.y)
            {
                return Err(ConfigError::InvalidScatter);
            }
        }
        if let Some(zone) = &self.finish_zone {
            if !(zone.radius.is_finite() && zone.radius > 0.0) {
                return Err(ConfigError::InvalidFinishZone(zone.radius));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SimConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_squad_tuning() {
        let json = r#"{
            "squads": [{ "name": "Bravo", "size": 3, "tuning": { "max_speed": 4.0 } }]
        }"#;
        let config = SimConfig::from_json_str(json).unwrap();
        let squad = &config.squads[0];
        assert_eq!(squad.size, 3);
        assert_eq!(squad.tuning.max_speed, 4.0);
        assert_eq!(squad.tuning.max_force, SquadTuning::default().max_force);
    }

    #[test]
    fn test_obstacles_parse() {
        let json = r#"{
            "obstacles": [
                { "shape": "circle", "center": { "x": 0.0, "y": 10.0 }, "radius": 2.0 },
                { "shape": "rect", "min": { "x": -5.0, "y": 0.0 }, "max": { "x": 5.0, "y": 1.0 } }
            ]
        }"#;
        let config = SimConfig::from_json_str(json).unwrap();
        assert_eq!(config.obstacles.len(), 2);
    }

    #[test]
    fn test_rejects_empty_squad() {
        let json = r#"{ "squads": [{ "name": "Ghost", "size": 0 }] }"#;
        assert!(matches!(
            SimConfig::from_json_str(json),
            Err(ConfigError::EmptySquad(name)) if name == "Ghost"
        ));
    }

    #[test]
    fn test_rejects_bad_tuning() {
        let json = r#"{ "exposure": { "max_exposure_time": -1.0 } }"#;
        assert!(matches!(
            SimConfig::from_json_str(json),
            Err(ConfigError::Tuning(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            SimConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = SimConfig::from_json_file("/nonexistent/scenario.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
