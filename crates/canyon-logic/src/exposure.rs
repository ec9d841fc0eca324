//! Exposure timer: time spent outside cover.
//!
//! A soldier out of cover for `max_exposure_time` seconds falls. Reaching
//! cover resets the clock.

use serde::{Deserialize, Serialize};

use crate::config::{positive, TuningError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    pub enabled: bool,
    pub max_exposure_time: f32,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_exposure_time: 15.0,
        }
    }
}

impl ExposureConfig {
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("max_exposure_time", self.max_exposure_time)
    }
}

/// Outcome of one exposure tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureEvent {
    Safe,
    Exposed,
    /// Reported exactly once, on the tick the limit is reached.
    Died,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureTimer {
    pub max_exposure_time: f32,
    exposure: f32,
    dead: bool,
}

impl ExposureTimer {
    pub fn new(max_exposure_time: f32) -> Self {
        Self {
            max_exposure_time,
            exposure: 0.0,
            dead: false,
        }
    }

    pub fn tick(&mut self, dt: f32, in_cover: bool) -> ExposureEvent {
        if self.dead {
            return ExposureEvent::Exposed;
        }
        if in_cover {
            self.exposure = 0.0;
            return ExposureEvent::Safe;
        }

        self.exposure += dt;
        if self.exposure >= self.max_exposure_time {
            self.dead = true;
            ExposureEvent::Died
        } else {
            ExposureEvent::Exposed
        }
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }
}
