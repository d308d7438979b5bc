use std::path::{Path, PathBuf};

use rivergen::config::{TerrainConfig, Viewport};
use rivergen::error::{Error, Result};
use rivergen::render;

fn main() {
    rivergen::logging::init_logging(None);

    let args: Vec<String> = std::env::args().collect();

    let seed: Option<u64> = args.get(1).and_then(|s| s.parse().ok());
    let width: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1024);
    let height: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(1024);
    let out_dir: PathBuf = args
        .get(4)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));
    let config_path = args.get(5).map(PathBuf::from);

    if let Err(err) = run(seed, width, height, &out_dir, config_path.as_deref()) {
        tracing::error!(%err, "generation failed");
        std::process::exit(1);
    }
}

fn run(
    seed: Option<u64>,
    width: usize,
    height: usize,
    out_dir: &Path,
    config_path: Option<&Path>,
) -> Result<()> {
    std::fs::create_dir_all(out_dir).map_err(Error::OutputDir)?;

    let mut config = match config_path {
        Some(path) => TerrainConfig::load(path)?,
        None => TerrainConfig::default(),
    };
    if let Some(seed) = seed {
        config.terrain.seed = seed;
    }
    let viewport = Viewport::new(width, height);

    tracing::info!(
        width,
        height,
        seed = config.terrain.seed,
        world_size = viewport.world_size,
        "generating terrain"
    );

    let (map, timings) = rivergen::bake(&config, &viewport);

    for t in &timings {
        tracing::info!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    if let Some((lo, hi)) = map.height.min_max() {
        tracing::info!("height range: {:.2} to {:.2}", lo, hi);
    }

    for layer in render::layers(&map, &config) {
        layer.save(out_dir)?;
    }
    config.save(&out_dir.join("config.json"))?;

    tracing::info!("done");
    Ok(())
}
