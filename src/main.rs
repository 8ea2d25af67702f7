//! Terrastream - headless flythrough
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Terrain config JSON (default: built-in defaults)
//!   --ticks <N>       Number of ticks to simulate (default: 600)
//!   --speed <UNITS>   Viewer travel per tick (default: 8.0)
//!   --tick-ms <MS>    Sleep between ticks (default: 16)

use std::path::PathBuf;
use std::time::{Duration, Instant};

use glam::Vec2;

use terrastream::core::logging;
use terrastream::placement::{PlacementRule, PlacementTarget, ScaleMode};
use terrastream::render::HeadlessRenderer;
use terrastream::{ChunkEvent, StreamingManager, TerrainConfig};

fn main() -> terrastream::core::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let ticks = parse_usize_arg(&args, "--ticks").unwrap_or(600);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(8.0);
    let tick_ms = parse_usize_arg(&args, "--tick-ms").unwrap_or(16) as u64;

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => TerrainConfig::load_json(&PathBuf::from(path))?,
        None => demo_config(),
    };

    let mut manager = StreamingManager::new(config, HeadlessRenderer::new())?;
    let direction = Vec2::new(1.0, 0.35).normalize();
    let start = Instant::now();
    let mut shown = 0usize;
    let mut hidden = 0usize;
    let mut colliders = 0usize;

    for tick in 0..ticks {
        let viewer = direction * speed * tick as f32;
        manager.tick(viewer);

        for event in manager.events() {
            match event {
                ChunkEvent::VisibilityChanged { visible: true, .. } => shown += 1,
                ChunkEvent::VisibilityChanged { visible: false, .. } => hidden += 1,
                ChunkEvent::ColliderReady { coord, lod } => {
                    colliders += 1;
                    log::debug!("Collider ready for chunk {} at lod {}", coord, lod);
                }
            }
        }

        if tick % 60 == 0 {
            let stats = manager.stats();
            log::info!(
                "tick {:4} viewer ({:.0}, {:.0}): {} chunks, {} visible, {} jobs, {} objects ({} created), {} instances",
                tick,
                viewer.x,
                viewer.y,
                stats.chunks,
                stats.visible,
                stats.pending_jobs,
                stats.objects_in_use,
                stats.pooled_objects_created,
                stats.batched_instances
            );
        }

        std::thread::sleep(Duration::from_millis(tick_ms));
    }

    let stats = manager.stats();
    let render = manager.renderer().stats();
    log::info!(
        "Flythrough done in {:.1}s: {} shown / {} hidden, {} colliders, {} evicted, {} stale results",
        start.elapsed().as_secs_f32(),
        shown,
        hidden,
        colliders,
        stats.evicted,
        stats.stale_results
    );
    log::info!(
        "Renderer: {} created, {} destroyed, {} mesh swaps, {} live",
        render.created,
        render.destroyed,
        render.mesh_swaps,
        manager.renderer().len()
    );

    Ok(())
}

/// Defaults plus a forest and a grass layer
fn demo_config() -> TerrainConfig {
    let mut config = TerrainConfig::default();
    config.height_map.noise.seed = 12345;
    config.placement.rules = vec![
        PlacementRule {
            name: "trees".into(),
            density: 0.15,
            min_height: 0.45,
            max_height: 0.75,
            max_steepness: 25.0,
            height_weight: 0.4,
            noise_weight: 0.8,
            noise_scale: 0.05,
            scale: ScaleMode::Random { min: 1, max: 3 },
            target: PlacementTarget::Prefabs(vec![0, 1, 2]),
            ..Default::default()
        },
        PlacementRule {
            name: "grass".into(),
            density: 0.4,
            min_height: 0.4,
            max_height: 0.7,
            max_steepness: 35.0,
            height_weight: 0.2,
            noise_weight: 1.0,
            noise_scale: 0.1,
            scale: ScaleMode::Fixed(1.0),
            target: PlacementTarget::Instanced { mesh: 0, material: 0 },
            ..Default::default()
        },
    ];
    config
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
