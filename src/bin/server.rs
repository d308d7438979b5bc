use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use rivergen::config::{TerrainConfig, Viewport};
use rivergen::{Classifier, HeightField, TerrainClass, render};

const MAX_DIMENSION: usize = 4096;
const MAX_SAMPLE_POINTS: usize = 65_536;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

#[derive(Deserialize)]
struct GenerateRequest {
    seed: Option<u64>,
    width: Option<usize>,
    height: Option<usize>,
    world_size: Option<f32>,
    /// Full config; the slider fields below override it.
    config: Option<TerrainConfig>,
    // Terrain
    terrain_scale: Option<f32>,
    terrain_amplitude: Option<f32>,
    river_depth: Option<f32>,
    // River
    river_width: Option<f32>,
    bank_slope_distance: Option<f32>,
    meander_frequency: Option<f32>,
    meander_amplitude: Option<f32>,
    // Erosion
    erosion_strength: Option<f32>,
    erosion_radius: Option<f32>,
    valley_flattening: Option<f32>,
    erosion_smoothing: Option<f32>,
    // Features
    flat_area_radius: Option<f32>,
    flat_area_strength: Option<f32>,
    hill_steepness: Option<f32>,
    terrain_roughness: Option<f32>,
}

impl GenerateRequest {
    fn terrain_config(&self) -> TerrainConfig {
        let mut c = self.config.unwrap_or_default();
        let set = |slot: &mut f32, v: Option<f32>| {
            if let Some(v) = v {
                *slot = v;
            }
        };
        if let Some(seed) = self.seed {
            c.terrain.seed = seed;
        }
        set(&mut c.terrain.scale, self.terrain_scale);
        set(&mut c.terrain.amplitude, self.terrain_amplitude);
        set(&mut c.terrain.river_depth, self.river_depth);
        set(&mut c.river.width, self.river_width);
        set(&mut c.river.bank_slope_distance, self.bank_slope_distance);
        set(&mut c.river.meander_frequency, self.meander_frequency);
        set(&mut c.river.meander_amplitude, self.meander_amplitude);
        set(&mut c.erosion.strength, self.erosion_strength);
        set(&mut c.erosion.radius, self.erosion_radius);
        set(&mut c.erosion.valley_flattening, self.valley_flattening);
        set(&mut c.erosion.smoothing, self.erosion_smoothing);
        set(&mut c.features.flat_area_radius, self.flat_area_radius);
        set(&mut c.features.flat_area_strength, self.flat_area_strength);
        set(&mut c.features.hill_steepness, self.hill_steepness);
        set(&mut c.features.roughness, self.terrain_roughness);
        c
    }

    fn viewport(&self) -> Viewport {
        let defaults = Viewport::new(512, 512);
        Viewport {
            width: self.width.unwrap_or(defaults.width).clamp(1, MAX_DIMENSION),
            height: self.height.unwrap_or(defaults.height).clamp(1, MAX_DIMENSION),
            world_size: self.world_size.unwrap_or(defaults.world_size),
        }
    }
}

#[derive(Serialize)]
struct GenerateResponse {
    layers: Vec<LayerPayload>,
    timings: Vec<TimingEntry>,
    width: usize,
    height: usize,
}

#[derive(Serialize)]
struct LayerPayload {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Deserialize)]
struct SampleRequest {
    config: Option<TerrainConfig>,
    points: Vec<[f32; 2]>,
}

#[derive(Serialize)]
struct SampleResponse {
    samples: Vec<SamplePoint>,
}

#[derive(Serialize)]
struct SamplePoint {
    x: f32,
    z: f32,
    height: f32,
    normal: [f32; 3],
    class: TerrainClass,
    water: bool,
    river_margin: bool,
    mask: f32,
}

fn internal(err: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!(%err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

async fn generate_handler(Json(req): Json<GenerateRequest>) -> ApiResult<GenerateResponse> {
    let config = req.terrain_config();
    let viewport = req.viewport();
    tracing::info!(
        seed = config.terrain.seed,
        width = viewport.width,
        height = viewport.height,
        "generate request"
    );

    let response = tokio::task::spawn_blocking(move || -> rivergen::Result<GenerateResponse> {
        let (map, timings) = rivergen::bake(&config, &viewport);

        let layers = render::layers(&map, &config)
            .iter()
            .map(|layer| {
                let png = layer.encode_png()?;
                let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
                Ok(LayerPayload {
                    name: layer.name.to_string(),
                    data_url: format!("data:image/png;base64,{}", b64),
                })
            })
            .collect::<rivergen::Result<Vec<_>>>()?;

        let timings = timings
            .iter()
            .map(|t| TimingEntry {
                name: t.name.to_string(),
                ms: t.ms,
            })
            .collect();

        Ok(GenerateResponse {
            layers,
            timings,
            width: viewport.width,
            height: viewport.height,
        })
    })
    .await
    .map_err(internal)?
    .map_err(internal)?;

    Ok(Json(response))
}

async fn sample_handler(Json(req): Json<SampleRequest>) -> ApiResult<SampleResponse> {
    if req.points.len() > MAX_SAMPLE_POINTS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("at most {MAX_SAMPLE_POINTS} points per request"),
        ));
    }

    let config = req.config.unwrap_or_default();
    let samples = tokio::task::spawn_blocking(move || {
        use rayon::prelude::*;

        let field = HeightField::new(&config);
        let classifier = Classifier::new(&config);
        req.points
            .par_iter()
            .map(|&[x, z]| {
                let c = classifier.classify(&field, Vec2::new(x, z));
                SamplePoint {
                    x,
                    z,
                    height: c.height,
                    normal: c.normal.to_array(),
                    class: c.class,
                    water: c.water,
                    river_margin: c.river_margin,
                    mask: c.mask_value(),
                }
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(internal)?;

    Ok(Json(SampleResponse { samples }))
}

#[tokio::main]
async fn main() {
    rivergen::logging::init_logging(None);

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/sample", post(sample_handler))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, %err, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("rivergen server at http://{}", addr);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(%err, "server stopped");
    }
}
