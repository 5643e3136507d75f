//! Field and surface configuration.
//!
//! `FieldConfig` is read from JSON (in the browser: the canvas element's
//! `data-field` attribute). Missing keys fall back to the defaults of the
//! reference scene.

use serde::Deserialize;

use crate::error::{FieldError, Result};
use crate::geometry::QuadFieldDescriptor;

/// Particle field settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
    /// Number of quads. Signed so that bad input is reported, not wrapped.
    pub instance_count: i64,
    /// Side length of each quad in world units.
    pub quad_size: f32,
    /// Texture atlas columns (reserved, forwarded as a uniform).
    pub grid_cols: i32,
    /// Texture atlas rows (reserved, forwarded as a uniform).
    pub grid_rows: i32,
    /// Milliseconds per unit of shader time.
    pub time_divisor: f64,
    pub camera: CameraConfig,
    /// `log` level filter name for the browser console logger.
    pub log_level: String,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            instance_count: 1000,
            quad_size: 4.0,
            grid_cols: 16,
            grid_rows: 1,
            time_divisor: 6000.0,
            camera: CameraConfig::default(),
            log_level: "info".into(),
        }
    }
}

impl FieldConfig {
    /// Parse and validate a JSON config. Blank input yields the defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        let config: FieldConfig = if source.trim().is_empty() {
            FieldConfig::default()
        } else {
            serde_json::from_str(source)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        QuadFieldDescriptor::new(self.quad_size, self.instance_count)?;
        if !(self.time_divisor > 0.0) {
            return Err(FieldError::Config(format!(
                "timeDivisor must be positive, got {}",
                self.time_divisor
            )));
        }
        self.camera.validate()
    }

    /// Parsed log level, falling back to `Info` for unknown names.
    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

/// Perspective camera settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Offset along +Z from the origin.
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 35.0,
            near: 10.0,
            far: 2000.0,
            distance: 500.0,
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<()> {
        if !(self.fov_deg > 0.0 && self.fov_deg < 180.0) {
            return Err(FieldError::Config(format!(
                "camera fovDeg must be in (0, 180), got {}",
                self.fov_deg
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(FieldError::Config(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

/// Size of the draw target in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl SurfaceConfig {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Backing-store size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let ratio = if self.pixel_ratio > 0.0 { self.pixel_ratio } else { 1.0 };
        (
            (self.width as f64 * ratio).round() as u32,
            (self.height as f64 * ratio).round() as u32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
