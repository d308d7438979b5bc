use std::path::{Path, PathBuf};

use glam::Vec3;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use rayon::prelude::*;

use crate::TerrainMap;
use crate::classify::{Classification, TerrainClass};
use crate::config::TerrainConfig;
use crate::error::Result;
use crate::grid::Grid;

// Color palette, stops relative to terrain amplitude and river depth.
const WATER_DEEP: [u8; 4] = [18, 36, 70, 255];
const WATER_SHALLOW: [u8; 4] = [38, 78, 120, 255];
const BEACH_SAND: [u8; 4] = [210, 200, 160, 255];
const LAND_LOW: [u8; 4] = [70, 130, 62, 255];
const LAND_MID: [u8; 4] = [140, 180, 100, 255];
const LAND_HIGH: [u8; 4] = [190, 170, 120, 255];
const MOUNTAIN_LOW: [u8; 4] = [140, 120, 100, 255];
const MOUNTAIN_HIGH: [u8; 4] = [220, 220, 215, 255];
const SNOW: [u8; 4] = [245, 248, 250, 255];

// Classification palette
const CLASS_RIVER: [u8; 4] = [30, 80, 200, 255];
const CLASS_MARGIN: [u8; 4] = [200, 170, 90, 255];
const CLASS_MOUNTAIN: [u8; 4] = [150, 140, 135, 255];
const CLASS_FLAT: [u8; 4] = [110, 170, 80, 255];
const CLASS_SLOPE: [u8; 4] = [90, 120, 60, 255];
const WATER_TINT: [u8; 4] = [40, 90, 170, 255];

const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Direction toward the light for hillshading.
const SUN: Vec3 = Vec3::new(-0.45, 0.8, -0.4);

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
        255,
    ]
}

#[inline]
fn shade(c: [u8; 4], k: f32) -> [u8; 4] {
    [
        (c[0] as f32 * k).round().clamp(0.0, 255.0) as u8,
        (c[1] as f32 * k).round().clamp(0.0, 255.0) as u8,
        (c[2] as f32 * k).round().clamp(0.0, 255.0) as u8,
        c[3],
    ]
}

/// Fill an RGBA buffer row by row in parallel.
fn par_rgba(w: usize, h: usize, color: impl Fn(usize, usize) -> [u8; 4] + Sync) -> Vec<u8> {
    let mut rgba = vec![0u8; w * h * 4];
    if w == 0 {
        return rgba;
    }
    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            row[x * 4..x * 4 + 4].copy_from_slice(&color(x, y));
        }
    });
    rgba
}

/// Hillshaded color relief.
pub fn render_map(height: &Grid<f32>, cells: &Grid<Classification>, config: &TerrainConfig) -> Vec<u8> {
    let amplitude = config.terrain.amplitude.max(f32::EPSILON);
    let depth = config.terrain.river_depth.max(f32::EPSILON);
    let sun = SUN.normalize();

    par_rgba(height.w, height.h, |x, y| {
        let elev = height.get(x, y);
        let color = if elev < 0.0 {
            lerp_color(WATER_SHALLOW, WATER_DEEP, -elev / depth)
        } else {
            let t = elev / amplitude;
            if t < 0.02 {
                BEACH_SAND
            } else if t < 0.3 {
                lerp_color(LAND_LOW, LAND_MID, (t - 0.02) / 0.28)
            } else if t < 0.6 {
                lerp_color(LAND_MID, LAND_HIGH, (t - 0.3) / 0.3)
            } else if t < 0.9 {
                lerp_color(MOUNTAIN_LOW, MOUNTAIN_HIGH, (t - 0.6) / 0.3)
            } else {
                lerp_color(MOUNTAIN_HIGH, SNOW, (t - 0.9) / 0.3)
            }
        };
        let light = cells.get(x, y).normal.dot(sun).max(0.0);
        shade(color, 0.55 + 0.45 * light)
    })
}

/// Grayscale heightmap normalized to the baked min/max.
pub fn render_heightmap(height: &Grid<f32>) -> Vec<u8> {
    let (min_h, max_h) = height.min_max().unwrap_or((0.0, 0.0));
    let range = (max_h - min_h).max(f32::EPSILON);
    par_rgba(height.w, height.h, |x, y| {
        let t = (height.get(x, y) - min_h) / range;
        let v = (t * 255.0).clamp(0.0, 255.0) as u8;
        [v, v, v, 255]
    })
}

/// Single-channel river mask: 255 river, 128 margin, 0 elsewhere.
pub fn render_mask(mask: &Grid<f32>) -> Vec<u8> {
    mask.data
        .par_iter()
        .map(|m| (m * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect()
}

/// River carve preview: blue water by depth, brown banks, white where the river has no
/// influence.
pub fn render_river(carve: &Grid<f32>, river_depth: f32) -> Vec<u8> {
    let depth = river_depth.max(f32::EPSILON);
    par_rgba(carve.w, carve.h, |x, y| {
        let c = carve.get(x, y);
        if c < -0.1 {
            let i = ((-c / depth).clamp(0.0, 1.0) * 255.0) as u8;
            [0, i / 2, i, 255]
        } else if c < 0.0 {
            let i = ((-c * 10.0).clamp(0.0, 1.0) * 255.0) as u8;
            [i, i / 2, 0, 255]
        } else {
            WHITE
        }
    })
}

/// Terrain classes, water tinted, margins highlighted.
pub fn render_classes(cells: &Grid<Classification>) -> Vec<u8> {
    par_rgba(cells.w, cells.h, |x, y| {
        let cell = cells.get(x, y);
        let base = match cell.class {
            TerrainClass::River => CLASS_RIVER,
            _ if cell.river_margin => CLASS_MARGIN,
            TerrainClass::Mountain => CLASS_MOUNTAIN,
            TerrainClass::Flat => CLASS_FLAT,
            TerrainClass::Slope => CLASS_SLOPE,
        };
        if cell.water && !cell.is_river() {
            lerp_color(base, WATER_TINT, 0.5)
        } else {
            base
        }
    })
}

/// Normals packed as `n * 0.5 + 0.5`.
pub fn render_normals(cells: &Grid<Classification>) -> Vec<u8> {
    par_rgba(cells.w, cells.h, |x, y| {
        let n = cells.get(x, y).normal * 0.5 + Vec3::splat(0.5);
        let c = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        [c(n.x), c(n.y), c(n.z), 255]
    })
}

/// One exportable image.
pub struct Layer {
    pub name: &'static str,
    pub pixels: Vec<u8>,
    pub color: ExtendedColorType,
    pub w: usize,
    pub h: usize,
}

impl Layer {
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf).write_image(
            &self.pixels,
            self.w as u32,
            self.h as u32,
            self.color,
        )?;
        Ok(buf)
    }

    /// Write `<dir>/<name>.png`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.png", self.name));
        image::save_buffer(&path, &self.pixels, self.w as u32, self.h as u32, self.color)?;
        tracing::info!(path = %path.display(), "saved layer");
        Ok(path)
    }
}

/// All diagnostic layers of a bake, final map last.
pub fn layers(map: &TerrainMap, config: &TerrainConfig) -> Vec<Layer> {
    let (w, h) = (map.w(), map.h());
    let rgba = |name, pixels| Layer {
        name,
        pixels,
        color: ExtendedColorType::Rgba8,
        w,
        h,
    };
    vec![
        rgba("heightmap", render_heightmap(&map.height)),
        Layer {
            name: "river_mask",
            pixels: render_mask(&map.mask),
            color: ExtendedColorType::L8,
            w,
            h,
        },
        rgba("river", render_river(&map.carve, config.terrain.river_depth)),
        rgba("classes", render_classes(&map.cells)),
        rgba("normals", render_normals(&map.cells)),
        rgba("map", map.rgba.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_levels() {
        let mut mask = Grid::<f32>::new(3, 1);
        mask.set(0, 0, 1.0);
        mask.set(1, 0, 0.5);
        assert_eq!(render_mask(&mask), vec![255, 128, 0]);
    }

    #[test]
    fn test_heightmap_spans_full_range() {
        let mut height = Grid::<f32>::new(2, 1);
        height.set(0, 0, -10.0);
        height.set(1, 0, 30.0);
        let rgba = render_heightmap(&height);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_river_preview_colors() {
        let mut carve = Grid::<f32>::new(3, 1);
        carve.set(0, 0, -8.0);
        carve.set(1, 0, -0.05);
        let rgba = render_river(&carve, 8.0);
        assert_eq!(&rgba[0..4], &[0, 127, 255, 255]);
        assert_eq!(rgba[4], 127);
        assert_eq!(rgba[6], 0);
        assert_eq!(&rgba[8..12], &WHITE);
    }

    #[test]
    fn test_png_encoding_roundtrip_header() {
        let layer = Layer {
            name: "t",
            pixels: vec![0, 128, 255, 0],
            color: ExtendedColorType::L8,
            w: 2,
            h: 2,
        };
        let png = layer.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
