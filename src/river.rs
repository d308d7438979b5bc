//! Meandering river centerline and its cross-section profile.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;

use crate::config::{ErosionParams, RiverParams, RiverPosition, TerrainParams};
use crate::noise::{NoiseConfig, fbm, layer_seed, noise};

const SALT_CHAOS: u64 = 0xC4A0_5D1F_7E11_0006;
const SALT_ASYMMETRY: u64 = 0xA5F1_3E7E_0000_0004;
const SALT_SCALE: u64 = 0x5CA1_EBAD_F00D_0007;
const SALT_WIDTH: u64 = 0x3D7B_1D7E_0000_0009;

/// Chaotic meander component: a slow 3-octave fbm along the river.
const CHAOS_NOISE: NoiseConfig = NoiseConfig::new(3, 2.5, 0.4, 0);

/// Offset that decorrelates the asymmetry sample from anything else sampled on the
/// same lattice near the x-axis.
const ASYMMETRY_OFFSET: f32 = 1000.0;

/// Where a query point sits relative to the river.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiverPoint {
    /// Projection of the point onto the straight baseline.
    pub distance_along: f32,
    /// Meandering centerline point at `distance_along`.
    pub center: Vec2,
    /// Distance from the query point to `center`.
    pub distance: f32,
}

/// Parametric river centerline: distance along the baseline maps to a lateral offset.
///
/// The distance to the river is measured against the centerline point at the query's own
/// baseline projection, not the true nearest centerline point. Meander bends therefore
/// widen slightly on their outer side, and the rendered terrain depends on exactly that.
#[derive(Clone, Debug)]
pub struct RiverPath {
    start: Vec2,
    direction: Vec2,
    perpendicular: Vec2,
    frequency: f32,
    amplitude: f32,
    chaos: f32,
    scale_variation: f32,
    chaos_noise: NoiseConfig,
    asymmetry_seed: u32,
    scale_seed: u32,
}

impl RiverPath {
    pub fn new(position: &RiverPosition, river: &RiverParams, seed: u64) -> Self {
        // A zero direction collapses the baseline onto `start` instead of producing NaN.
        let direction = position.direction.normalize_or_zero();
        Self {
            start: position.start,
            direction,
            perpendicular: direction.perp(),
            frequency: river.meander_frequency,
            amplitude: river.meander_amplitude,
            chaos: river.meander_chaos,
            scale_variation: river.meander_scale_variation,
            chaos_noise: CHAOS_NOISE.with_seed(layer_seed(seed, SALT_CHAOS)),
            asymmetry_seed: layer_seed(seed, SALT_ASYMMETRY),
            scale_seed: layer_seed(seed, SALT_SCALE),
        }
    }

    /// Unit baseline direction, or zero for a degenerate baseline.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    #[inline]
    pub fn distance_along(&self, pos: Vec2) -> f32 {
        (pos - self.start).dot(self.direction)
    }

    /// Lateral offset of the centerline at `distance_along`.
    pub fn meander_offset(&self, distance_along: f32) -> f32 {
        let phase = distance_along * self.frequency;

        let primary = libm::sinf(phase * TAU);
        let secondary = libm::sinf(phase * 1.7 * TAU) * 0.4;
        let base = primary * 0.7 + secondary * 0.3;

        let chaos = fbm(
            Vec2::new(distance_along * 0.001, 0.0),
            &self.chaos_noise,
            false,
        );
        let chaotic = chaos * self.chaos * 0.5;

        let asymmetry = noise(
            Vec2::new(phase * 0.8, ASYMMETRY_OFFSET),
            self.asymmetry_seed,
        ) * 0.2;

        let scale = if self.scale_variation != 0.0 {
            1.0 + noise(Vec2::new(distance_along * 0.0003, 0.0), self.scale_seed)
                * self.scale_variation
        } else {
            1.0
        };

        (base + chaotic + asymmetry) * scale * self.amplitude
    }

    /// Centerline point for a given distance along the baseline.
    #[inline]
    pub fn center_at(&self, distance_along: f32) -> Vec2 {
        self.start
            + self.direction * distance_along
            + self.perpendicular * self.meander_offset(distance_along)
    }

    pub fn river_center(&self, pos: Vec2) -> Vec2 {
        self.center_at(self.distance_along(pos))
    }

    pub fn distance_to_river(&self, pos: Vec2) -> f32 {
        self.locate(pos).distance
    }

    /// Resolve baseline projection, centerline point and distance in one pass.
    pub fn locate(&self, pos: Vec2) -> RiverPoint {
        let distance_along = self.distance_along(pos);
        let center = self.center_at(distance_along);
        RiverPoint {
            distance_along,
            center,
            distance: pos.distance(center),
        }
    }
}

/// River cross-section: carve depth and erosion weight as functions of the distance to
/// the centerline.
#[derive(Clone, Debug)]
pub struct RiverProfile {
    base_width: f32,
    bank_slope_distance: f32,
    river_depth: f32,
    erosion_strength: f32,
    erosion_radius: f32,
    width_seed: u32,
}

impl RiverProfile {
    pub fn new(
        terrain: &TerrainParams,
        river: &RiverParams,
        erosion: &ErosionParams,
    ) -> Self {
        Self {
            base_width: river.width,
            bank_slope_distance: river.bank_slope_distance,
            river_depth: terrain.river_depth,
            erosion_strength: erosion.strength,
            erosion_radius: erosion.radius,
            width_seed: layer_seed(terrain.seed, SALT_WIDTH),
        }
    }

    pub fn river_depth(&self) -> f32 {
        self.river_depth
    }

    /// Local channel width, varying slowly by up to ±30% along the river.
    pub fn width_at(&self, distance_along: f32) -> f32 {
        let n = noise(Vec2::new(distance_along * 0.0005, 0.0), self.width_seed);
        (self.base_width * (1.0 + n * 0.3)).max(0.0)
    }

    /// Height offset carved into the terrain.
    ///
    /// Flat `-river_depth` bed up to the water edge, a blended bank slope that reaches
    /// exactly 0 at `width/2 + bank_slope_distance`, and 0 beyond.
    pub fn carve(&self, distance: f32, width: f32) -> f32 {
        let edge = width.max(0.0) * 0.5;
        if distance <= edge {
            return -self.river_depth;
        }
        let band = self.bank_slope_distance;
        if band <= 0.0 || distance >= edge + band {
            return 0.0;
        }

        let t = ((distance - edge) / band).clamp(0.0, 1.0);
        let cubic = 1.0 - t * t * t;
        let quarter_wave = libm::sinf((1.0 - t) * FRAC_PI_2);
        let raised_cosine = (1.0 + libm::cosf(t * PI)) * 0.5;
        let blend = cubic * 0.5 + quarter_wave * 0.3 + raised_cosine * 0.2;
        -self.river_depth * blend
    }

    /// Erosion weight: full strength in the channel, quadratic falloff over
    /// `erosion_radius` beyond the water edge.
    pub fn erosion_factor(&self, distance: f32, width: f32) -> f32 {
        let edge = width.max(0.0) * 0.5;
        if distance <= edge {
            return self.erosion_strength;
        }
        let radius = self.erosion_radius;
        if radius <= 0.0 || distance >= edge + radius {
            return 0.0;
        }
        let falloff = 1.0 - ((distance - edge) / radius).clamp(0.0, 1.0);
        self.erosion_strength * falloff * falloff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(depth: f32, width: f32, bank: f32) -> RiverProfile {
        RiverProfile::new(
            &TerrainParams {
                river_depth: depth,
                ..Default::default()
            },
            &RiverParams {
                width,
                bank_slope_distance: bank,
                ..Default::default()
            },
            &ErosionParams::default(),
        )
    }

    #[test]
    fn test_carve_reference_values() {
        let p = profile(5.0, 10.0, 4.0);
        assert_eq!(p.carve(0.0, 10.0), -5.0);
        assert_eq!(p.carve(5.0, 10.0), -5.0);
        assert!(p.carve(9.0, 10.0).abs() < 1e-5);
        assert_eq!(p.carve(20.0, 10.0), 0.0);
    }

    #[test]
    fn test_river_bed_is_flat() {
        let p = profile(8.0, 20.0, 80.0);
        for i in 0..=100 {
            let d = i as f32 * 0.1;
            assert_eq!(p.carve(d, 20.0), -8.0, "bed not flat at {d}");
        }
    }

    #[test]
    fn test_bank_is_monotonic_and_continuous() {
        let p = profile(8.0, 20.0, 80.0);
        let mut prev = p.carve(10.0, 20.0);
        for i in 1..=8000 {
            let d = 10.0 + i as f32 * 0.01;
            let c = p.carve(d, 20.0);
            assert!(c >= prev - 1e-5, "bank not monotonic at {d}");
            assert!((c - prev).abs() < 0.01, "bank jump at {d}: {prev} -> {c}");
            prev = c;
        }
        assert_eq!(p.carve(90.0, 20.0), 0.0);
    }

    #[test]
    fn test_bank_approaches_zero_at_outer_edge() {
        let p = profile(8.0, 20.0, 80.0);
        assert!(p.carve(89.999, 20.0).abs() < 1e-3);
        assert!((p.carve(10.001, 20.0) + 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_profile_is_finite() {
        let p = profile(5.0, 0.0, 0.0);
        assert_eq!(p.carve(0.0, 0.0), -5.0);
        assert_eq!(p.carve(0.5, 0.0), 0.0);
        assert_eq!(p.carve(1.0, -4.0), 0.0);
        assert!(p.erosion_factor(1.0, 0.0).is_finite());
    }

    #[test]
    fn test_erosion_factor_falloff() {
        let p = profile(5.0, 20.0, 80.0);
        let strength = ErosionParams::default().strength;
        let radius = ErosionParams::default().radius;
        assert_eq!(p.erosion_factor(0.0, 20.0), strength);
        assert_eq!(p.erosion_factor(10.0, 20.0), strength);
        let half = p.erosion_factor(10.0 + radius * 0.5, 20.0);
        assert!((half - strength * 0.25).abs() < 1e-5);
        assert_eq!(p.erosion_factor(10.0 + radius, 20.0), 0.0);
        assert_eq!(p.erosion_factor(1000.0, 20.0), 0.0);
    }

    #[test]
    fn test_width_varies_within_thirty_percent() {
        let p = profile(5.0, 20.0, 80.0);
        for i in 0..2000 {
            let w = p.width_at(i as f32 * 37.0 - 30000.0);
            assert!((14.0..=26.0).contains(&w), "width {w} out of range");
        }
    }

    #[test]
    fn test_center_lies_on_river() {
        let path = RiverPath::new(&RiverPosition::default(), &RiverParams::default(), 42);
        for i in 0..100 {
            let d = i as f32 * 13.0 - 400.0;
            let c = path.center_at(d);
            assert!((path.distance_along(c) - d).abs() < 1e-2);
        }
    }

    #[test]
    fn test_meander_bounded_by_amplitude() {
        let river = RiverParams::default();
        let path = RiverPath::new(&RiverPosition::default(), &river, 42);
        // 0.7 + 0.12 + 0.3 + 0.2
        let bound = river.meander_amplitude * (0.7 + 0.12 + river.meander_chaos * 0.5 + 0.2);
        for i in 0..5000 {
            let m = path.meander_offset(i as f32 * 0.9 - 2000.0);
            assert!(m.abs() <= bound + 1e-3, "meander {m} exceeds {bound}");
        }
    }

    #[test]
    fn test_zero_amplitude_is_straight() {
        let river = RiverParams {
            meander_amplitude: 0.0,
            ..Default::default()
        };
        let position = RiverPosition {
            start: Vec2::ZERO,
            direction: Vec2::new(2.0, 0.0),
        };
        let path = RiverPath::new(&position, &river, 1);
        let p = path.locate(Vec2::new(50.0, 7.0));
        assert_eq!(p.distance_along, 50.0);
        assert_eq!(p.center, Vec2::new(50.0, 0.0));
        assert_eq!(p.distance, 7.0);
    }

    #[test]
    fn test_zero_direction_does_not_produce_nan() {
        let position = RiverPosition {
            start: Vec2::new(3.0, 4.0),
            direction: Vec2::ZERO,
        };
        let path = RiverPath::new(&position, &RiverParams::default(), 1);
        let p = path.locate(Vec2::new(10.0, -2.0));
        assert_eq!(p.distance_along, 0.0);
        assert!(p.distance.is_finite());
        assert!(p.center.is_finite());
    }

    #[test]
    fn test_distance_measured_to_projected_center() {
        let path = RiverPath::new(&RiverPosition::default(), &RiverParams::default(), 42);
        for i in 0..300 {
            let p = Vec2::new(i as f32 * 3.3 - 500.0, (i % 17) as f32 * 9.0 - 80.0);
            let d = path.distance_to_river(p);
            assert_eq!(d, p.distance(path.river_center(p)));
            assert_eq!(d, path.locate(p).distance);
            assert_eq!(path.river_center(p), path.locate(p).center);
        }
    }

    #[test]
    fn test_distance_is_not_nearest_centerline_point() {
        let path = RiverPath::new(&RiverPosition::default(), &RiverParams::default(), 42);
        let nearest = |p: Vec2| {
            let along = path.distance_along(p);
            (0..=4000)
                .map(|k| p.distance(path.center_at(along - 200.0 + k as f32 * 0.1)))
                .fold(f32::INFINITY, f32::min)
        };

        // Offset across the baseline; on steep meander flanks the true nearest
        // centerline point lies well away from the baseline projection.
        let mut max_gap = 0.0f32;
        for i in 0..125 {
            let p = path.center_at(i as f32) + path.direction().perp() * 30.0;
            let gap = path.distance_to_river(p) - nearest(p);
            assert!(gap > -0.05, "brute-force search missed the projected center");
            max_gap = max_gap.max(gap);
        }
        assert!(max_gap > 5.0, "largest gap only {max_gap}");
    }
}
