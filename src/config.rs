//! Terrain parameters. Every struct is an immutable value threaded through the sampling
//! functions; nothing here is global.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Global terrain shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// World-to-noise frequency of the base terrain.
    pub scale: f32,
    /// Height of the base terrain in world units.
    pub amplitude: f32,
    /// Depth of the river bed below the eroded surface.
    pub river_depth: f32,
    pub seed: u64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 0.005,
            amplitude: 50.0,
            river_depth: 8.0,
            seed: 42,
        }
    }
}

/// River channel and meander shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverParams {
    /// Nominal channel width; the local width varies by up to ±30%.
    pub width: f32,
    /// Horizontal extent of the bank slope beyond the water edge.
    pub bank_slope_distance: f32,
    /// Meander cycles per world unit along the river.
    pub meander_frequency: f32,
    /// Lateral meander excursion in world units.
    pub meander_amplitude: f32,
    /// Weight of the noise-driven chaotic meander component.
    pub meander_chaos: f32,
    /// Slow modulation of the overall meander size. 0 disables it.
    pub meander_scale_variation: f32,
}

impl Default for RiverParams {
    fn default() -> Self {
        Self {
            width: 20.0,
            bank_slope_distance: 80.0,
            meander_frequency: 0.008,
            meander_amplitude: 40.0,
            meander_chaos: 0.6,
            meander_scale_variation: 0.0,
        }
    }
}

/// Valley erosion around the river.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    pub strength: f32,
    /// Distance beyond the water edge over which erosion fades out.
    pub radius: f32,
    pub valley_flattening: f32,
    pub smoothing: f32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            strength: 0.8,
            radius: 120.0,
            valley_flattening: 0.7,
            smoothing: 0.6,
        }
    }
}

/// Plateaus, hills and surface roughness.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    pub flat_area_radius: f32,
    pub flat_area_strength: f32,
    /// Frequency of the noise that places flat areas.
    pub flat_area_frequency: f32,
    /// Exponent applied to the base terrain; above 1 sharpens peaks.
    pub hill_steepness: f32,
    pub roughness: f32,
    /// Displacement of the base terrain lookup in world units. 0 disables warping.
    pub domain_warp_strength: f32,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            flat_area_radius: 100.0,
            flat_area_strength: 0.8,
            flat_area_frequency: 0.002,
            hill_steepness: 1.2,
            roughness: 0.5,
            domain_warp_strength: 0.0,
        }
    }
}

/// Straight baseline of the river. `direction` need not be normalized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverPosition {
    pub start: Vec2,
    pub direction: Vec2,
}

impl Default for RiverPosition {
    fn default() -> Self {
        Self {
            start: Vec2::new(-256.0, 0.0),
            direction: Vec2::new(1.0, 0.1),
        }
    }
}

/// Terrain classification knobs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyParams {
    /// World-space offset of the 8 neighbors probed for river margins.
    pub margin_step: f32,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self { margin_step: 2.0 }
    }
}

/// Everything a height query depends on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub terrain: TerrainParams,
    pub river: RiverParams,
    pub erosion: ErosionParams,
    pub features: FeatureParams,
    pub river_position: RiverPosition,
    pub classify: ClassifyParams,
}

impl TerrainConfig {
    /// Load a config from JSON. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(Error::ConfigRead)?;
        let config = serde_json::from_str(&text).map_err(Error::ConfigParse)?;
        tracing::info!(path = %path.display(), "loaded terrain config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(Error::ConfigSerialize)?;
        std::fs::write(path, text).map_err(Error::ConfigWrite)?;
        tracing::debug!(path = %path.display(), "saved terrain config");
        Ok(())
    }
}

/// World-space window sampled by the bake pass, centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
    /// World units spanned by the image width.
    pub world_size: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            world_size: 512.0,
        }
    }
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// World units per pixel.
    pub fn pixel_size(&self) -> f32 {
        self.world_size / self.width.max(1) as f32
    }

    /// World-space position of pixel (x, y). Pixels share one spacing on both axes.
    #[inline]
    pub fn world_pos(&self, x: usize, y: usize) -> Vec2 {
        let px = self.pixel_size();
        Vec2::new(
            (x as f32 - self.width as f32 * 0.5) * px,
            (y as f32 - self.height as f32 * 0.5) * px,
        )
    }
}
