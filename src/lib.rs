pub mod classify;
pub mod config;
pub mod erosion;
pub mod error;
pub mod grid;
pub mod heightfield;
pub mod logging;
pub mod noise;
pub mod normal;
pub mod render;
pub mod river;
pub mod terrain;

use std::time::Instant;

pub use classify::{Classification, Classifier, TerrainClass};
pub use config::{
    ClassifyParams, ErosionParams, FeatureParams, RiverParams, RiverPosition, TerrainConfig,
    TerrainParams, Viewport,
};
pub use error::{Error, Result};
pub use heightfield::{HeightField, HeightSample};
pub use normal::NormalEstimator;

use grid::Grid;

/// Every per-pixel layer of one bake. All layers come from the same height function,
/// so geometry, classification and mask agree exactly.
pub struct TerrainMap {
    pub viewport: Viewport,
    pub height: Grid<f32>,
    /// Carve offset alone, for the river preview.
    pub carve: Grid<f32>,
    pub cells: Grid<Classification>,
    pub mask: Grid<f32>,
    pub rgba: Vec<u8>,
}

impl TerrainMap {
    pub fn w(&self) -> usize {
        self.viewport.width
    }

    pub fn h(&self) -> usize {
        self.viewport.height
    }
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Bake heights, classification and the river mask over `viewport`.
pub fn bake(config: &TerrainConfig, viewport: &Viewport) -> (TerrainMap, Vec<Timing>) {
    let mut timings = Vec::new();
    let total_start = Instant::now();
    let (w, h) = (viewport.width, viewport.height);

    let field = HeightField::new(config);
    let classifier = Classifier::new(config);

    // 1. Height + carve per pixel
    let t = Instant::now();
    let samples = Grid::par_from_fn(w, h, |x, y| {
        let s = field.sample(viewport.world_pos(x, y));
        (s.height, s.carve)
    });
    let height = samples.par_map(|(height, _)| height);
    let carve = samples.par_map(|(_, carve)| carve);
    timings.push(Timing {
        name: "height",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Classification with margin probes
    let t = Instant::now();
    let cells = Grid::par_from_fn(w, h, |x, y| {
        classifier.classify_with_height(&field, viewport.world_pos(x, y), height.get(x, y))
    });
    let mask = cells.par_map(|c| c.mask_value());
    timings.push(Timing {
        name: "classify",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let mut coverage = [0usize; TerrainClass::ALL.len()];
    for cell in &cells.data {
        coverage[cell.class.index() as usize] += 1;
    }
    for class in TerrainClass::ALL {
        tracing::debug!(
            class = class.name(),
            cells = coverage[class.index() as usize],
            "class coverage"
        );
    }

    // 3. Render
    let t = Instant::now();
    let rgba = render::render_map(&height, &cells, config);
    timings.push(Timing {
        name: "render",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    timings.push(Timing {
        name: "TOTAL",
        ms: total_ms,
    });
    for timing in &timings {
        tracing::debug!(stage = timing.name, ms = timing.ms, "bake stage finished");
    }

    let map = TerrainMap {
        viewport: *viewport,
        height,
        carve,
        cells,
        mask,
        rgba,
    };

    (map, timings)
}
