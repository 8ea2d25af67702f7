//! Height map preview - renders one chunk's maps to PNG.
//!
//! Usage: cargo run --release --bin preview_map -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Terrain config JSON (default: built-in defaults)
//!   --seed <SEED>     Noise seed, overrides the config
//!   --size <INDEX>    Chunk size index into the supported sizes (default: config)
//!   --x <X>           Chunk grid x (default: 0)
//!   --z <Z>           Chunk grid z (default: 0)
//!   --falloff         Apply the radial falloff map
//!   --out <DIR>       Output directory (default: "preview")
//!
//! Output:
//!   <out>/height.png    grayscale heights
//!   <out>/colors.png    height bands coloured water to snow
//!   <out>/falloff.png   falloff map at the same resolution

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use terrastream::core::logging;
use terrastream::core::types::Result;
use terrastream::preview::{color_map_image, default_regions, falloff_image, height_map_image, save_png};
use terrastream::streaming::GridCoord;
use terrastream::terrain::generator::HeightMapGenerator;
use terrastream::TerrainConfig;

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Preview failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => TerrainConfig::load_json(&PathBuf::from(path))?,
        None => TerrainConfig::default(),
    };
    if let Some(seed) = parse_u64_arg(&args, "--seed") {
        config.height_map.noise.seed = seed;
    }
    if let Some(index) = parse_usize_arg(&args, "--size") {
        config.mesh.chunk_size_index = index;
    }
    if args.iter().any(|a| a == "--falloff") {
        config.height_map.use_falloff = true;
    }
    config.validate();

    let coord = GridCoord::new(
        parse_i32_arg(&args, "--x").unwrap_or(0),
        parse_i32_arg(&args, "--z").unwrap_or(0),
    );
    let out = PathBuf::from(parse_str_arg(&args, "--out").unwrap_or_else(|| "preview".to_string()));
    let vpl = config.mesh.vertices_per_line();

    println!("=== Terrastream Preview ===");
    println!("Chunk:  {}", coord);
    println!("Seed:   {}", config.height_map.noise.seed);
    println!("Grid:   {} x {}", vpl, vpl);
    println!("Output: {}", out.display());
    println!();

    let start = Instant::now();
    let generator = HeightMapGenerator::new(config.height_map.clone());
    let map = generator.generate(vpl, vpl, coord.sample_center(vpl));
    log::info!(
        "Generated {}x{} height map in {:.1}ms (range {:.2} to {:.2})",
        map.width(),
        map.height(),
        start.elapsed().as_secs_f32() * 1000.0,
        map.min_value(),
        map.max_value()
    );

    save_png(height_map_image(&map), &out.join("height.png"))?;
    save_png(color_map_image(&map, &default_regions()), &out.join("colors.png"))?;
    save_png(falloff_image(vpl, vpl, &config.height_map.falloff), &out.join("falloff.png"))?;

    println!("Done.");
    Ok(())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_i32_arg(args: &[String], flag: &str) -> Option<i32> {
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
