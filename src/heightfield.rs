//! Final terrain height: base terrain, eroded toward the river valley, then carved.

use glam::{Vec2, Vec3};

use crate::config::TerrainConfig;
use crate::erosion::ErosionBlender;
use crate::normal::NormalEstimator;
use crate::river::{RiverPath, RiverPoint, RiverProfile};
use crate::terrain::TerrainSynthesizer;

/// Every intermediate of one height query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightSample {
    /// Final height.
    pub height: f32,
    /// Base terrain before erosion.
    pub base: f32,
    /// Base terrain after erosion blending, before carving.
    pub eroded: f32,
    /// Carve offset added last.
    pub carve: f32,
    pub erosion_factor: f32,
    pub river_width: f32,
    pub river: RiverPoint,
}

/// The complete height function of one terrain configuration.
///
/// Immutable after construction; share it freely across threads.
#[derive(Clone, Debug)]
pub struct HeightField {
    terrain: TerrainSynthesizer,
    path: RiverPath,
    profile: RiverProfile,
    erosion: ErosionBlender,
}

impl HeightField {
    pub fn new(config: &TerrainConfig) -> Self {
        let terrain = TerrainSynthesizer::new(&config.terrain, &config.features);
        let erosion = ErosionBlender::new(&config.terrain, &config.erosion, terrain.base_seed());
        Self {
            path: RiverPath::new(&config.river_position, &config.river, config.terrain.seed),
            profile: RiverProfile::new(&config.terrain, &config.river, &config.erosion),
            terrain,
            erosion,
        }
    }

    pub fn terrain(&self) -> &TerrainSynthesizer {
        &self.terrain
    }

    pub fn path(&self) -> &RiverPath {
        &self.path
    }

    pub fn profile(&self) -> &RiverProfile {
        &self.profile
    }

    pub fn generate_height(&self, pos: Vec2) -> f32 {
        self.sample(pos).height
    }

    /// Full height query.
    ///
    /// Carving is added after erosion and never passes through the erosion
    /// smoothing, so the river bed keeps its exact profile.
    pub fn sample(&self, pos: Vec2) -> HeightSample {
        let river = self.path.locate(pos);
        let river_width = self.profile.width_at(river.distance_along);
        let carve = self.profile.carve(river.distance, river_width);
        let erosion_factor = self.profile.erosion_factor(river.distance, river_width);

        let base = self.terrain.height(pos);
        let eroded = self.erosion.apply_erosion(
            base,
            pos,
            river.distance_along,
            erosion_factor,
            |p| self.terrain.raw_height(p),
        );

        HeightSample {
            height: eroded + carve,
            base,
            eroded,
            carve,
            erosion_factor,
            river_width,
            river,
        }
    }

    /// Carve offset alone, without any terrain.
    pub fn river_modification(&self, pos: Vec2) -> f32 {
        let river = self.path.locate(pos);
        let width = self.profile.width_at(river.distance_along);
        self.profile.carve(river.distance, width)
    }

    /// Surface normal of the final height function.
    pub fn normal(&self, pos: Vec2) -> Vec3 {
        NormalEstimator::default().normal(pos, |p| self.generate_height(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureParams, RiverPosition, TerrainParams};

    #[test]
    fn test_height_is_deterministic() {
        let field = HeightField::new(&TerrainConfig::default());
        let other = HeightField::new(&TerrainConfig::default());
        for i in 0..200 {
            let p = Vec2::new(i as f32 * 3.7 - 300.0, i as f32 * -1.3 + 50.0);
            let h = field.generate_height(p);
            assert_eq!(h.to_bits(), field.generate_height(p).to_bits());
            assert_eq!(h.to_bits(), other.generate_height(p).to_bits());
        }
    }

    #[test]
    fn test_carve_applied_after_erosion() {
        let field = HeightField::new(&TerrainConfig::default());
        let start = RiverPosition::default().start;
        for i in 0..50 {
            let s = field.sample(start + Vec2::new(i as f32 * 10.0, i as f32 * 0.5));
            assert_eq!(s.height, s.eroded + s.carve);
        }
    }

    #[test]
    fn test_erosion_ring_reads_raw_terrain() {
        let config = TerrainConfig {
            features: FeatureParams {
                domain_warp_strength: 25.0,
                flat_area_strength: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let field = HeightField::new(&config);
        let mut eroded = 0;
        for i in 0..100 {
            let along = i as f32 * 4.0;
            let pos = field.path().center_at(along) + field.path().direction().perp() * 30.0;
            let s = field.sample(pos);
            if s.erosion_factor <= 0.0 {
                continue;
            }
            eroded += 1;
            let expected = field.erosion.apply_erosion(
                s.base,
                pos,
                s.river.distance_along,
                s.erosion_factor,
                |p| field.terrain.raw_height(p),
            );
            assert_eq!(s.eroded.to_bits(), expected.to_bits());
        }
        assert!(eroded > 0);
    }

    #[test]
    fn test_river_center_is_carved_to_bed() {
        let config = TerrainConfig::default();
        let field = HeightField::new(&config);
        let center = field.path().center_at(100.0);
        let s = field.sample(center);
        assert!(s.river.distance < 1e-2);
        assert_eq!(s.carve, -config.terrain.river_depth);
        assert_eq!(field.river_modification(center), s.carve);
    }

    #[test]
    fn test_far_from_river_is_base_terrain() {
        let config = TerrainConfig::default();
        let field = HeightField::new(&config);
        // Default river runs near z = 0.1x; this point is far beyond bank and erosion bands.
        let p = Vec2::new(0.0, 900.0);
        let s = field.sample(p);
        assert_eq!(s.carve, 0.0);
        assert_eq!(s.erosion_factor, 0.0);
        assert_eq!(s.height, s.base);
    }

    #[test]
    fn test_zero_amplitude_leaves_only_river() {
        let config = TerrainConfig {
            terrain: TerrainParams {
                amplitude: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let field = HeightField::new(&config);
        let far = field.sample(Vec2::new(0.0, 900.0));
        assert_eq!(far.height, 0.0);
        let center = field.path().center_at(0.0);
        let near = field.sample(center);
        assert!(near.height.is_finite());
        assert!(near.height < 0.0);
    }

    #[test]
    fn test_normal_points_up() {
        let field = HeightField::new(&TerrainConfig::default());
        for i in 0..100 {
            let n = field.normal(Vec2::new(i as f32 * 5.0 - 250.0, i as f32 * 2.0 - 100.0));
            assert!(n.y > 0.0);
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }
}
