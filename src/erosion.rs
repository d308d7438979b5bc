use glam::Vec2;

use crate::config::{ErosionParams, TerrainParams};
use crate::noise::{NoiseConfig, fbm};

/// Coarse layer that sets the valley floor; shares the base terrain lattice.
const VALLEY_NOISE: NoiseConfig = NoiseConfig::new(3, 2.0, 0.5, 0);
const VALLEY_FREQUENCY: f32 = 0.3;
/// Height gained per world unit along the river.
const VALLEY_GRADE: f32 = 0.001;

const SMOOTHING_RADIUS: f32 = 2.0;
const SMOOTHING_RING: [Vec2; 4] = [
    Vec2::new(SMOOTHING_RADIUS, 0.0),
    Vec2::new(0.0, SMOOTHING_RADIUS),
    Vec2::new(-SMOOTHING_RADIUS, 0.0),
    Vec2::new(0.0, -SMOOTHING_RADIUS),
];

/// Pulls terrain near the river toward a gently sloping valley floor and smooths out
/// high-frequency relief in the eroded band.
#[derive(Clone, Debug)]
pub struct ErosionBlender {
    scale: f32,
    amplitude: f32,
    valley_flattening: f32,
    smoothing: f32,
    valley_noise: NoiseConfig,
}

impl ErosionBlender {
    pub fn new(terrain: &TerrainParams, erosion: &ErosionParams, base_seed: u32) -> Self {
        Self {
            scale: terrain.scale,
            amplitude: terrain.amplitude,
            valley_flattening: erosion.valley_flattening,
            smoothing: erosion.smoothing,
            valley_noise: VALLEY_NOISE.with_seed(base_seed),
        }
    }

    /// Target height of the valley floor: coarse terrain plus a slow grade along the river.
    pub fn valley_floor_height(&self, pos: Vec2, distance_along: f32) -> f32 {
        let coarse = fbm(
            pos * (self.scale * VALLEY_FREQUENCY),
            &self.valley_noise,
            true,
        );
        coarse * self.amplitude * 0.3 + distance_along * VALLEY_GRADE
    }

    /// Blend `base` toward the valley floor by `factor * valley_flattening`, then
    /// toward the local average of `base_height` on a 4-point ring.
    ///
    /// `base_height` must be the unsmoothed terrain function that produced `base`.
    pub fn apply_erosion(
        &self,
        base: f32,
        pos: Vec2,
        distance_along: f32,
        factor: f32,
        base_height: impl Fn(Vec2) -> f32,
    ) -> f32 {
        if factor <= 0.0 {
            return base;
        }

        let flatten = self.valley_flattening * factor;
        let floor = self.valley_floor_height(pos, distance_along);
        let flattened = base * (1.0 - flatten) + floor * flatten;

        let ring_sum: f32 = SMOOTHING_RING
            .iter()
            .map(|offset| base_height(pos + *offset))
            .sum();
        let averaged = (flattened + ring_sum) / (SMOOTHING_RING.len() + 1) as f32;

        let smooth = self.smoothing * factor;
        flattened * (1.0 - smooth) + averaged * smooth
    }
}
