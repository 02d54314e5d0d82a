use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Size;

/// Settings a [`Session`](crate::session::Session) is created with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Slowest flight speed in pixels per tick, at the start and end of a flight. Default: 1.0.
    pub min_speed: f64,
    /// Fastest flight speed in pixels per tick, at the midpoint. Default: 5.0.
    pub max_speed: f64,
    /// Seed for shuffles and flight start points. `None` seeds from the operating system.
    pub seed: Option<u64>,
    /// Drawing area the board is fitted into until the host calls
    /// [`resize`](crate::session::Session::resize). Default: 800 by 800.
    pub viewport: Size,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_speed: 1.0,
            max_speed: 5.0,
            seed: None,
            viewport: Size::new(800.0, 800.0),
        }
    }
}

impl SessionConfig {
    /// Check that flights can always finish and the board has room to be drawn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_speed.is_finite() || self.min_speed <= 0.0 {
            return Err(ConfigError::MinSpeed(self.min_speed));
        }
        if !self.max_speed.is_finite() || self.max_speed < self.min_speed {
            return Err(ConfigError::SpeedBounds { min: self.min_speed, max: self.max_speed });
        }
        let Size { width, height } = self.viewport;
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigError::EmptyViewport { width, height });
        }
        Ok(())
    }
}
