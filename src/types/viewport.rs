use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};

/// Camera state of the canvas. Versioned only through the state vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal pan
    pub x: f64,
    /// Vertical pan
    pub y: f64,
    /// Zoom factor, strictly positive
    pub zoom: f64,
}

impl Viewport {
    /// Construct a viewport.
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Viewport { x, y, zoom }
    }

    /// Coordinates must be finite and zoom finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(GraphError::InvalidEntity(format!(
                "viewport offset must be finite, got ({}, {})",
                self.x, self.y
            )));
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(GraphError::InvalidEntity(format!(
                "viewport zoom must be positive, got {}",
                self.zoom
            )));
        }
        Ok(())
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(0.0, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Viewport::default().validate().is_ok());
        assert!(Viewport::new(0.0, 0.0, 0.0).validate().is_err());
        assert!(Viewport::new(f64::NAN, 0.0, 1.0).validate().is_err());
        assert!(Viewport::new(0.0, 0.0, f64::INFINITY).validate().is_err());
    }
}
