//! Base terrain before any river influence: rotated fbm hills, detail layers and
//! flat-area plateaus.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::config::{FeatureParams, TerrainParams};
use crate::noise::{NoiseConfig, fbm, layer_seed, noise};

const SALT_BASE: u64 = 0xBA5E_E1EF_DEAD_CAFE;
const SALT_HILL: u64 = 0x4111_5EED_0000_0014;
const SALT_DETAIL: u64 = 0xE1E7_DE7A_1100_FACE;
const SALT_FLAT: u64 = 0xF1A7_A2EA_0000_0012;
const SALT_WARP_X: u64 = 0xDA12_BEEF_0000_CAFE;
const SALT_WARP_Y: u64 = 0xDA12_BEEF_0001_CAFE;

const BASE_NOISE: NoiseConfig = NoiseConfig::new(6, 2.0, 0.5, 0);
const HILL_NOISE: NoiseConfig = NoiseConfig::new(5, 2.2, 0.6, 0);

const DETAIL_FREQUENCY: f32 = 0.05;
const WARP_FREQUENCY: f32 = 0.003;

/// Flat areas only grow where the placement noise exceeds this.
const FLAT_THRESHOLD: f32 = 0.6;
const FLAT_RING_SAMPLES: usize = 8;
/// Fraction of the terrain amplitude kept inside a fully flat area.
const FLAT_COMPRESSION: f32 = 0.3;

const MIN_STEEPNESS: f32 = 1e-3;

#[derive(Clone, Debug)]
pub struct TerrainSynthesizer {
    scale: f32,
    amplitude: f32,
    hill_steepness: f32,
    roughness: f32,
    flat_area_strength: f32,
    flat_area_frequency: f32,
    warp_strength: f32,
    base_noise: NoiseConfig,
    hill_noise: NoiseConfig,
    detail_seed: u32,
    flat_seed: u32,
    warp_seeds: [u32; 2],
    flat_ring: [Vec2; FLAT_RING_SAMPLES],
}

impl TerrainSynthesizer {
    pub fn new(terrain: &TerrainParams, features: &FeatureParams) -> Self {
        let seed = terrain.seed;
        let ring_radius = features.flat_area_radius * 0.5;
        let flat_ring = std::array::from_fn(|i| {
            let angle = i as f32 / FLAT_RING_SAMPLES as f32 * TAU;
            Vec2::new(libm::cosf(angle), libm::sinf(angle)) * ring_radius
        });

        Self {
            scale: terrain.scale,
            amplitude: terrain.amplitude,
            hill_steepness: features.hill_steepness.max(MIN_STEEPNESS),
            roughness: features.roughness,
            flat_area_strength: features.flat_area_strength,
            flat_area_frequency: features.flat_area_frequency,
            warp_strength: features.domain_warp_strength,
            base_noise: BASE_NOISE.with_seed(layer_seed(seed, SALT_BASE)),
            hill_noise: HILL_NOISE.with_seed(layer_seed(seed, SALT_HILL)),
            detail_seed: layer_seed(seed, SALT_DETAIL),
            flat_seed: layer_seed(seed, SALT_FLAT),
            warp_seeds: [layer_seed(seed, SALT_WARP_X), layer_seed(seed, SALT_WARP_Y)],
            flat_ring,
        }
    }

    /// Lattice seed of the base terrain layer.
    pub fn base_seed(&self) -> u32 {
        self.base_noise.seed
    }

    /// Unsmoothed base terrain height at a world position.
    pub fn height(&self, pos: Vec2) -> f32 {
        let p = self.warp(pos);
        let s = p * self.scale;

        let base = shape_hills(fbm(s, &self.base_noise, true), self.hill_steepness);
        let hill = fbm(s * 2.0, &self.hill_noise, true) * 0.3 * self.roughness;
        let detail = noise(p * DETAIL_FREQUENCY, self.detail_seed) * 0.1 * self.roughness;
        let enhanced = (base + hill + detail) * self.amplitude;

        let m = self.flat_mask(p);
        enhanced * (1.0 - m) + enhanced * FLAT_COMPRESSION * m
    }

    /// Unshaped terrain sampled by erosion smoothing: the base fbm plus fixed-weight
    /// detail, at the unwarped position. No hill shaping, hill layer or flat areas.
    pub fn raw_height(&self, pos: Vec2) -> f32 {
        let base = fbm(pos * self.scale, &self.base_noise, true);
        let detail = noise(pos * DETAIL_FREQUENCY, self.detail_seed) * 0.1;
        (base + detail) * self.amplitude
    }

    /// Plateau weight in `[0, 1]`.
    ///
    /// Zero wherever the placement noise is at or below the threshold. Above it, the
    /// ring average of the placement noise fades out toward the noise peaks, which
    /// leaves soft-edged rings of flat ground around them.
    ///
    /// The mask steps from zero straight to the ring average where the placement noise
    /// crosses the threshold, so the final height steps there too. That step is
    /// intentional and is the only discontinuity of the height function.
    pub fn flat_mask(&self, pos: Vec2) -> f32 {
        let freq = self.flat_area_frequency;
        let center = noise(pos * freq, self.flat_seed);
        if center <= FLAT_THRESHOLD {
            return 0.0;
        }

        let total: f32 = self
            .flat_ring
            .iter()
            .map(|offset| noise((pos + *offset) * freq, self.flat_seed))
            .sum();
        let avg = total / FLAT_RING_SAMPLES as f32;

        let distance_factor = 1.0 - (center - FLAT_THRESHOLD) / (1.0 - FLAT_THRESHOLD);
        (avg * distance_factor * self.flat_area_strength).clamp(0.0, 1.0)
    }

    /// Domain-warped lookup position. Identity when warping is disabled.
    fn warp(&self, pos: Vec2) -> Vec2 {
        if self.warp_strength == 0.0 {
            return pos;
        }
        let q = pos * WARP_FREQUENCY;
        pos + Vec2::new(noise(q, self.warp_seeds[0]), noise(q, self.warp_seeds[1]))
            * self.warp_strength
    }
}

/// `sign(x) * |x|^k`: k above 1 sharpens peaks and widens valleys.
#[inline]
fn shape_hills(x: f32, k: f32) -> f32 {
    if x == 0.0 {
        return 0.0;
    }
    libm::powf(x.abs(), k).copysign(x)
}
