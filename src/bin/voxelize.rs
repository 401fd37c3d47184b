//! Voxelize a point file and print what a rotating display would show.
//!
//! Usage: cargo run --release --bin voxelize -- --input <FILE> [OPTIONS]
//!
//! Options:
//!   --input <FILE>     Point file (.xyz, .txt, .csv, .pts, .ply or .pcd; PLY/PCD ascii or binary)
//!   --config <JSON>    Load voxel parameters from a JSON config
//!   --scale-r <S>      Radial cell size (overrides config, default 0.01)
//!   --scale-z <S>      Vertical cell size (overrides config, default 0.01)
//!   --dtheta <DEG>     Slice width in degrees (overrides config, default 1.0)
//!   --sweep <DEG>      Phase step for the printed sweep (default: slice width)
//!   --save-config <JSON>  Write the effective config after the run

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use cylvox::core::CylVoxConfig;
use cylvox::loader::{FilePointSource, PointSource};
use cylvox::voxel::CylVoxBuilder;

fn main() -> ExitCode {
    cylvox::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(input) = parse_str_arg(&args, "--input") else {
        eprintln!("usage: voxelize --input <FILE> [--config <JSON>] [--scale-r S] [--scale-z S] [--dtheta DEG] [--sweep DEG]");
        return ExitCode::FAILURE;
    };

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => match CylVoxConfig::load_sync(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to read config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => CylVoxConfig::default(),
    };
    if let Some(s) = parse_f64_arg(&args, "--scale-r") {
        config.scale_r = s;
    }
    if let Some(s) = parse_f64_arg(&args, "--scale-z") {
        config.scale_z = s;
    }
    if let Some(d) = parse_f64_arg(&args, "--dtheta") {
        config.delta_theta_deg = d;
    }

    let builder = match CylVoxBuilder::new(config.clone()) {
        Ok(builder) => builder,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let input = PathBuf::from(input);
    let start = Instant::now();
    let points = match FilePointSource.load(&input) {
        Ok(points) => points,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let load_ms = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    let (grid, report) = builder.build(&points);
    let build_ms = start.elapsed().as_secs_f64() * 1000.0;

    println!("=== Cylvox ===");
    println!("Input:   {}", input.display());
    println!("Points:  {} ({} rejected: {} non-finite, {} out of range)",
        report.total_points, report.rejected(), report.non_finite, report.out_of_range);
    println!("Cells:   s_r={} s_z={} dtheta={} deg", config.scale_r, config.scale_z, config.delta_theta_deg);
    println!("Axis:    ({:.4}, {:.4}), z_min {:.4}", grid.centroid().x, grid.centroid().y, grid.z_min());
    println!("Grid:    {} voxels, {}/{} bins occupied", report.voxel_count, report.occupied_bins, grid.bin_count());

    let stats = grid.stats();
    if let (Some(ir), Some(iz)) = (stats.max_radius_index, stats.max_height_index) {
        println!("Extent:  {} rings x {} rows (largest slice {} cells)", ir + 1, iz + 1, stats.max_slice_len);
    }
    println!("Timing:  load {:.1}ms, build {:.1}ms", load_ms, build_ms);
    println!();

    let step = parse_f64_arg(&args, "--sweep").unwrap_or(config.delta_theta_deg);
    if !(step.is_finite() && step > 0.0) {
        log::error!("--sweep must be a positive number of degrees");
        return ExitCode::FAILURE;
    }

    println!("{:>10}  {:>6}  {:>8}", "phase", "bin", "cells");
    let mut phase = 0.0;
    while phase < 360.0 {
        match grid.resolve(phase) {
            Ok(frame) => println!("{:>10.3}  {:>6}  {:>8}", phase, frame.bin_index(), frame.len()),
            Err(e) => log::warn!("{}", e),
        }
        phase += step;
    }

    if let Some(path) = parse_str_arg(&args, "--save-config") {
        if let Err(e) = config.save_sync(Path::new(&path)) {
            log::error!("Failed to save config {}: {}", path, e);
            return ExitCode::FAILURE;
        }
        log::info!("Saved config to {}", path);
    }

    ExitCode::SUCCESS
}

fn parse_f64_arg(args: &[String], flag: &str) -> Option<f64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
