//! Discrete terrain categories and the river mask.

use glam::{Vec2, Vec3};
use serde::Serialize;

use crate::config::TerrainConfig;
use crate::heightfield::HeightField;
use crate::normal::NormalEstimator;

/// Fraction of the river depth below which terrain counts as river.
const RIVER_DEPTH_FRACTION: f32 = 0.5;
/// Fraction of the amplitude above which terrain counts as mountain.
const MOUNTAIN_FRACTION: f32 = 0.7;
/// `1 - normal.y` below this is flat.
const FLAT_SLOPE: f32 = 0.1;

pub const MASK_RIVER: f32 = 1.0;
pub const MASK_MARGIN: f32 = 0.5;
pub const MASK_NONE: f32 = 0.0;

/// Terrain category, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainClass {
    River,
    Mountain,
    Flat,
    Slope,
}

impl TerrainClass {
    pub const ALL: [TerrainClass; 4] = [Self::River, Self::Mountain, Self::Flat, Self::Slope];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::River => "river",
            Self::Mountain => "mountain",
            Self::Flat => "flat",
            Self::Slope => "slope",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Classification {
    pub class: TerrainClass,
    /// Below zero height. Independent of `class`; river cells are usually water too.
    pub water: bool,
    /// Not river itself, but next to a river cell.
    pub river_margin: bool,
    pub height: f32,
    pub normal: Vec3,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            class: TerrainClass::Slope,
            water: false,
            river_margin: false,
            height: 0.0,
            normal: Vec3::Y,
        }
    }
}

impl Classification {
    pub fn is_river(&self) -> bool {
        self.class == TerrainClass::River
    }

    /// 1.0 river, 0.5 margin, 0.0 otherwise.
    pub fn mask_value(&self) -> f32 {
        if self.is_river() {
            MASK_RIVER
        } else if self.river_margin {
            MASK_MARGIN
        } else {
            MASK_NONE
        }
    }
}

/// Classifies points of a [`HeightField`].
///
/// River margins probe 8 neighbors on a square ring of `margin_step`. River is the
/// top-priority class and is decided from height alone, so a neighbor probe is a full
/// height evaluation followed by the river test.
#[derive(Clone, Debug)]
pub struct Classifier {
    river_threshold: f32,
    mountain_threshold: f32,
    margin_offsets: [Vec2; 8],
    normals: NormalEstimator,
}

impl Classifier {
    pub fn new(config: &TerrainConfig) -> Self {
        let depth = config.terrain.river_depth;
        let amplitude = config.terrain.amplitude;
        Self {
            // Without a river bed or without relief the class can never occur.
            river_threshold: if depth > 0.0 {
                -depth * RIVER_DEPTH_FRACTION
            } else {
                f32::NEG_INFINITY
            },
            mountain_threshold: if amplitude > 0.0 {
                amplitude * MOUNTAIN_FRACTION
            } else {
                f32::INFINITY
            },
            margin_offsets: neighbor_offsets(config.classify.margin_step),
            normals: NormalEstimator::default(),
        }
    }

    #[inline]
    pub fn is_river_height(&self, height: f32) -> bool {
        height < self.river_threshold
    }

    /// Category and water flag from a resolved height and normal.
    pub fn classify_surface(&self, height: f32, normal: Vec3) -> (TerrainClass, bool) {
        let class = if self.is_river_height(height) {
            TerrainClass::River
        } else if height > self.mountain_threshold {
            TerrainClass::Mountain
        } else if 1.0 - normal.y < FLAT_SLOPE {
            TerrainClass::Flat
        } else {
            TerrainClass::Slope
        };
        (class, height < 0.0)
    }

    /// Full classification of one point, including the margin probe.
    pub fn classify(&self, field: &HeightField, pos: Vec2) -> Classification {
        self.classify_with_height(field, pos, field.generate_height(pos))
    }

    /// Same as [`classify`](Self::classify) for a caller that already holds the
    /// height at `pos`.
    pub fn classify_with_height(
        &self,
        field: &HeightField,
        pos: Vec2,
        height: f32,
    ) -> Classification {
        let normal = self
            .normals
            .normal(pos, |p| field.generate_height(p));
        let (class, water) = self.classify_surface(height, normal);
        let river_margin =
            class != TerrainClass::River && self.river_neighbors(field, pos).contains(&true);
        Classification {
            class,
            water,
            river_margin,
            height,
            normal,
        }
    }

    /// River test of all 8 neighbors as one fixed-size batch.
    pub fn river_neighbors(&self, field: &HeightField, pos: Vec2) -> [bool; 8] {
        let heights = self
            .margin_offsets
            .map(|offset| field.generate_height(pos + offset));
        heights.map(|h| self.is_river_height(h))
    }

    pub fn is_river_margin(&self, field: &HeightField, pos: Vec2) -> bool {
        self.classify(field, pos).river_margin
    }

    pub fn mask_value(&self, field: &HeightField, pos: Vec2) -> f32 {
        self.classify(field, pos).mask_value()
    }
}

/// 8-connected ring of offsets at `step`.
pub fn neighbor_offsets(step: f32) -> [Vec2; 8] {
    [
        Vec2::new(-step, -step),
        Vec2::new(0.0, -step),
        Vec2::new(step, -step),
        Vec2::new(-step, 0.0),
        Vec2::new(step, 0.0),
        Vec2::new(-step, step),
        Vec2::new(0.0, step),
        Vec2::new(step, step),
    ]
}
