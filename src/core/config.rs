//! Client configuration, loaded from RON.
//!
//! Lookup order for the file: the `AR_PATH_CONFIG` environment variable, then
//! `assets/config/ar_path.ron`. A missing file means defaults.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::ar_error::ArError;

pub const CONFIG_ENV_VAR: &str = "AR_PATH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "assets/config/ar_path.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArPathConfig {
    /// Offsets from the anchor, in order. x right, y up, -z forward.
    #[serde(default = "default_waypoints")]
    pub waypoints: Vec<(f32, f32, f32)>,
    #[serde(default)]
    pub tube: TubeSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub reticle: ReticleSettings,
}

#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct TubeSettings {
    pub tubular_segments: u32,
    pub radius: f32,
    pub radial_segments: u32,
    pub closed: bool,
}

#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct ReticleSettings {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
}

/// Ordered anchor-relative offsets shared by every placed path.
#[derive(Resource, Reflect, Debug, Clone, PartialEq)]
#[reflect(Resource)]
pub struct Waypoints(pub Vec<Vec3>);

impl Waypoints {
    pub fn iter(&self) -> std::slice::Iter<'_, Vec3> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Waypoints {
    fn default() -> Self {
        Waypoints::from(default_waypoints().as_slice())
    }
}

impl From<&[(f32, f32, f32)]> for Waypoints {
    fn from(points: &[(f32, f32, f32)]) -> Self {
        Waypoints(points.iter().map(|&(x, y, z)| Vec3::new(x, y, z)).collect())
    }
}

fn default_waypoints() -> Vec<(f32, f32, f32)> {
    vec![
        (0.0, 0.0, 0.0),
        (0.0, 0.0, -2.0),
        (1.0, 0.0, -2.0),
        (1.0, 0.0, -4.0),
    ]
}

impl Default for TubeSettings {
    fn default() -> Self {
        TubeSettings {
            tubular_segments: 20,
            radius: 0.1,
            radial_segments: 8,
            closed: false,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            fov_degrees: 70.0,
            near: 0.01,
            far: 20.0,
        }
    }
}

impl Default for ReticleSettings {
    fn default() -> Self {
        ReticleSettings {
            inner_radius: 0.15,
            outer_radius: 0.2,
            segments: 32,
        }
    }
}

impl Default for ArPathConfig {
    fn default() -> Self {
        ArPathConfig {
            waypoints: default_waypoints(),
            tube: TubeSettings::default(),
            camera: CameraSettings::default(),
            reticle: ReticleSettings::default(),
        }
    }
}

impl ArPathConfig {
    /// Parse and validate a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArError> {
        let file = File::open(path.as_ref())?;
        let config: ArPathConfig = ron::de::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_str(source: &str) -> Result<Self, ArError> {
        let config: ArPathConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Never fails: a missing file yields defaults silently, a broken one with a warning.
    pub fn load_or_default() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ArError> {
        if self.waypoints.len() < 2 {
            return Err(ArError::InvalidConfig(format!(
                "a path needs at least 2 waypoints, got {}",
                self.waypoints.len()
            )));
        }
        if self
            .waypoints
            .iter()
            .any(|&(x, y, z)| !(x.is_finite() && y.is_finite() && z.is_finite()))
        {
            return Err(ArError::InvalidConfig("waypoints must be finite".to_string()));
        }
        if !(self.tube.radius > 0.0) {
            return Err(ArError::InvalidConfig("tube radius must be positive".to_string()));
        }
        if self.tube.tubular_segments < 1 || self.tube.radial_segments < 3 {
            return Err(ArError::InvalidConfig(
                "tube needs at least 1 tubular and 3 radial segments".to_string(),
            ));
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return Err(ArError::InvalidConfig("camera clip planes must satisfy 0 < near < far".to_string()));
        }
        if !(self.reticle.inner_radius >= 0.0 && self.reticle.inner_radius < self.reticle.outer_radius) {
            return Err(ArError::InvalidConfig("reticle inner radius must be below the outer radius".to_string()));
        }
        Ok(())
    }

    pub fn waypoints(&self) -> Waypoints {
        Waypoints::from(self.waypoints.as_slice())
    }
}
