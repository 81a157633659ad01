//! Tephra CLI - Volcanic mass-flow inundation mapping

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tephra_algorithms::prelude::*;
use tephra_core::io::{read_geotiff, write_geotiff};
use tephra_core::Raster;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tephra")]
#[command(author, version, about = "Volcanic mass-flow inundation mapping", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Distal inundation zones from volumes and stream start points
    Distal {
        /// Input DEM file
        #[arg(long)]
        dem: PathBuf,
        /// Input D8 flow-direction raster (codes 1,2,4,8,16,32,64,128)
        #[arg(long)]
        flow_dir: PathBuf,
        /// Flow volumes in m³ as "v1,v2,..."
        #[arg(long, conflicts_with = "volumes_file")]
        volumes: Option<String>,
        /// Text file of flow volumes (comma or newline separated)
        #[arg(long)]
        volumes_file: Option<PathBuf>,
        /// Start points in map coordinates as "x,y;x,y;..."
        #[arg(long)]
        coords: Option<String>,
        /// Text file of start points in map coordinates, one "x, y" pair
        /// per line
        #[arg(long)]
        coords_file: Option<PathBuf>,
        /// Start points as grid cells "row,col;row,col;..."
        #[arg(long)]
        cells: Option<String>,
        /// Flow type selecting the area-volume coefficients
        #[arg(long, value_enum, default_value = "lahar")]
        flow: FlowArg,
        /// Output directory for per-run rasters and audit files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Base name for output files
        #[arg(short, long, default_value = "inundation")]
        name: String,
        /// Cap on stream cells traversed per run
        #[arg(long, default_value_t = 9_000_000)]
        max_stream_cells: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    /// Lahar (C = 0.05 / 200)
    Lahar,
    /// Debris flow (C = 0.1 / 20)
    DebrisFlow,
    /// Rock avalanche (C = 0.2 / 20)
    RockAvalanche,
}

impl From<FlowArg> for FlowKind {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::Lahar => FlowKind::Lahar,
            FlowArg::DebrisFlow => FlowKind::DebrisFlow,
            FlowArg::RockAvalanche => FlowKind::RockAvalanche,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading DEM...");
    let raster: Raster<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("DEM: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_flow_dir(path: &Path) -> Result<Raster<u8>> {
    let pb = spinner("Reading flow direction...");
    let raster: Raster<u8> =
        read_geotiff(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

/// Parse a list of numbers separated by commas, semicolons or whitespace.
/// Tolerates the loose formatting of hand-edited volume files.
fn parse_numbers(s: &str) -> Result<Vec<f64>> {
    s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<f64>()
                .with_context(|| format!("Invalid number: {tok}"))
        })
        .collect()
}

/// Parse start points given as "a,b" pairs separated by semicolons or
/// newlines, so inline arguments and one-pair-per-line files share one
/// format.
fn parse_pairs(s: &str) -> Result<Vec<(f64, f64)>> {
    s.split(|c: char| c == ';' || c == '\n' || c == '\r')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let parts: Vec<&str> = pair.trim().split(',').collect();
            if parts.len() != 2 {
                anyhow::bail!("Start point must be 'a,b', got: {}", pair);
            }
            let a: f64 = parts[0].trim().parse().context("Invalid coordinate")?;
            let b: f64 = parts[1].trim().parse().context("Invalid coordinate")?;
            Ok((a, b))
        })
        .collect()
}

fn collect_starts(
    coords: Option<&str>,
    coords_file: Option<&Path>,
    cells: Option<&str>,
) -> Result<Vec<StartPoint>> {
    let mut starts = Vec::new();
    if let Some(coords) = coords {
        for (x, y) in parse_pairs(coords)? {
            starts.push(StartPoint::Geographic { x, y });
        }
    }
    if let Some(path) = coords_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        for (x, y) in parse_pairs(&text)? {
            starts.push(StartPoint::Geographic { x, y });
        }
    }
    if let Some(cells) = cells {
        for (row, col) in parse_pairs(cells)? {
            if row < 0.0 || col < 0.0 || row.fract() != 0.0 || col.fract() != 0.0 {
                anyhow::bail!("Cell address must be non-negative integers, got: {row},{col}");
            }
            starts.push(StartPoint::Cell {
                row: row as usize,
                col: col as usize,
            });
        }
    }
    if starts.is_empty() {
        anyhow::bail!("No start points given; use --coords, --coords-file and/or --cells");
    }
    Ok(starts)
}

fn load_volumes(inline: Option<&str>, file: Option<&Path>) -> Result<Vec<f64>> {
    let text = match (inline, file) {
        (Some(s), None) => s.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("No volumes given; use --volumes or --volumes-file"),
        (Some(_), Some(_)) => unreachable!("clap rejects conflicting volume flags"),
    };
    let volumes = parse_numbers(&text)?;
    if volumes.is_empty() {
        anyhow::bail!("Volume list is empty");
    }
    Ok(volumes)
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_dem(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }

            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            let mut sum = 0.0;
            let mut valid = 0usize;
            for &v in raster.data() {
                if v.is_finite() && !raster.is_nodata(v) {
                    min = min.min(v);
                    max = max.max(v);
                    sum += v;
                    valid += 1;
                }
            }
            println!("\nStatistics:");
            if valid > 0 {
                println!("  Min: {:.4}", min);
                println!("  Max: {:.4}", max);
                println!("  Mean: {:.4}", sum / valid as f64);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                valid,
                100.0 * valid as f64 / raster.len() as f64
            );
        }

        // ── Distal inundation ────────────────────────────────────────
        Commands::Distal {
            dem,
            flow_dir,
            volumes,
            volumes_file,
            coords,
            coords_file,
            cells,
            flow,
            output_dir,
            name,
            max_stream_cells,
        } => {
            let dem = read_dem(&dem)?;
            let flow_dir = read_flow_dir(&flow_dir)?;

            let volumes = load_volumes(volumes.as_deref(), volumes_file.as_deref())?;
            let kind = FlowKind::from(flow);
            let scenarios =
                ScenarioList::from_volumes(&volumes, kind).context("Invalid volume list")?;
            info!("Flow type: {}", kind);
            info!(
                "Scenario targets (m²): cross-section {:?}, planimetric {:?}",
                scenarios.cross_section_targets(),
                scenarios.planimetric_targets()
            );

            let starts =
                collect_starts(coords.as_deref(), coords_file.as_deref(), cells.as_deref())?;
            let params = InundationParams {
                max_stream_cells,
                ..Default::default()
            };

            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;

            let start = Instant::now();
            let pb = spinner(&format!("Running {} inundation run(s)...", starts.len()));
            let outputs = distal_inundation(&dem, &flow_dir, &scenarios, &starts, &params)
                .context("Inundation run failed")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            for (i, output) in outputs.iter().enumerate() {
                let run_name = format!("{}_{:02}", name, i + 1);
                let tif_path = output_dir.join(format!("{run_name}.tif"));
                let pts_path = output_dir.join(format!("{run_name}.pts"));

                write_geotiff(&output.ownership, &tif_path)
                    .with_context(|| format!("Failed to write {}", tif_path.display()))?;
                std::fs::write(&pts_path, output.audit.render(&run_name))
                    .with_context(|| format!("Failed to write {}", pts_path.display()))?;

                info!(
                    "Run {} from cell {:?}: {} stream cells, stop: {}",
                    run_name, output.start_cell, output.audit.cells_traversed, output.audit.stop
                );
                println!("Zones saved to: {}", tif_path.display());
                println!("Audit saved to: {}", pts_path.display());
            }
            println!("  Processing time: {:.2?}", elapsed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_tolerates_loose_formatting() {
        let volumes = parse_numbers("1e6, 5e5;\n 2.5e5\t100000\n").unwrap();
        assert_eq!(volumes, vec![1.0e6, 5.0e5, 2.5e5, 1.0e5]);
        assert!(parse_numbers("1e6, abc").is_err());
    }

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs("500000.5, 4100200.25; 501000, 4100900;").unwrap();
        assert_eq!(
            pairs,
            vec![(500000.5, 4100200.25), (501000.0, 4100900.0)]
        );
        assert!(parse_pairs("500000").is_err());
    }

    #[test]
    fn test_parse_pairs_one_per_line() {
        // The file format: one "x, y" pair per line, blank lines allowed
        let pairs = parse_pairs("500000.5, 4100200.25\n501000, 4100900\r\n\n").unwrap();
        assert_eq!(
            pairs,
            vec![(500000.5, 4100200.25), (501000.0, 4100900.0)]
        );
    }

    #[test]
    fn test_collect_starts_mixes_coords_and_cells() {
        let starts = collect_starts(Some("10.5,20.5"), None, Some("3,4")).unwrap();
        assert_eq!(
            starts,
            vec![
                StartPoint::Geographic { x: 10.5, y: 20.5 },
                StartPoint::Cell { row: 3, col: 4 },
            ]
        );
        assert!(collect_starts(None, None, None).is_err());
        assert!(collect_starts(None, None, Some("3.5,4")).is_err());
    }

    #[test]
    fn test_collect_starts_from_coords_file() {
        let path = std::env::temp_dir().join("tephra_coords_file_test.txt");
        std::fs::write(&path, "500000.5, 4100200.25\n501000, 4100900\n").unwrap();

        let starts = collect_starts(None, Some(&path), None).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            starts,
            vec![
                StartPoint::Geographic {
                    x: 500000.5,
                    y: 4100200.25
                },
                StartPoint::Geographic {
                    x: 501000.0,
                    y: 4100900.0
                },
            ]
        );
        assert!(collect_starts(None, Some(Path::new("/nonexistent/pts.txt")), None).is_err());
    }
}
