//! coopaccess CLI - cooperative accessibility scoring and land cover change

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use coopaccess_algorithms::accessibility::{
    AccessibilityAnalysis, AccessibilityParams, AccessibilityReport, Feedback, ScoringMode,
    StyleParams, DEFAULT_MULTIPLIERS,
};
use coopaccess_algorithms::classification::ClassificationMode;
use coopaccess_algorithms::imagery::{change_detection, ChangeParams};
use coopaccess_core::io::{
    read_geojson, read_geotiff, write_geotiff, GeoJsonFileSink, GeoTiffOptions,
};
use coopaccess_core::{FeatureCollection, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "coopaccess")]
#[command(
    author,
    version,
    about = "Cooperative accessibility and land cover change analysis",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score cooperatives by proximity to roads and markets
    Accessibility {
        /// Cooperatives layer (GeoJSON points)
        cooperatives: PathBuf,
        /// Roads layer (GeoJSON lines)
        roads: PathBuf,
        /// Markets layer (GeoJSON points)
        markets: PathBuf,
        /// Output GeoJSON with the accessibility_score attribute
        output: PathBuf,
        /// Base road ring distance in layer units
        #[arg(long, default_value = "1000")]
        road_distance: f64,
        /// Base market ring distance in layer units
        #[arg(long, default_value = "2000")]
        market_distance: f64,
        /// Road weight in [0, 1]; markets get the remainder
        #[arg(short = 'w', long, default_value = "0.6")]
        road_weight: f64,
        /// Ring distance multipliers, ascending
        #[arg(long, value_delimiter = ',', default_value = "1,2,5")]
        multipliers: Vec<f64>,
        /// Segments per quarter circle of ring curves
        #[arg(long, default_value = "5")]
        segments: usize,
        /// Number of style classes
        #[arg(short, long, default_value = "5")]
        classes: usize,
        /// Class break method: jenks, quantile, equal
        #[arg(short, long, default_value = "jenks")]
        mode: String,
        /// Score against the nearest ring rather than the first in source order
        #[arg(long)]
        sort_by_distance: bool,
        /// Score features in parallel, checking for cancellation per chunk
        #[arg(long)]
        parallel: bool,
        /// Features per chunk in parallel scoring
        #[arg(long, default_value = "256")]
        chunk_size: usize,
        /// Write the graduated style and score summary as JSON
        #[arg(long)]
        style: Option<PathBuf>,
    },
    /// Binary change map between two classified rasters
    Change {
        /// Raster at the first date
        before: PathBuf,
        /// Raster at the second date
        after: PathBuf,
        /// Output change map (GeoTIFF, 1 = changed)
        output: PathBuf,
        /// Leave no-data cells out of the statistics
        #[arg(long)]
        ignore_nodata: bool,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Progress bar fed by the analysis
struct ProgressFeedback {
    bar: ProgressBar,
}

impl ProgressFeedback {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Feedback for ProgressFeedback {
    fn push_info(&self, message: &str) {
        self.bar.set_message(message.to_string());
        info!("{}", message);
    }

    fn set_progress(&self, percent: f64) {
        self.bar.set_position(percent.clamp(0.0, 100.0) as u64);
    }

    fn is_canceled(&self) -> bool {
        false
    }
}

fn read_layer(path: &Path, what: &str) -> Result<FeatureCollection> {
    let pb = spinner(&format!("Reading {}...", what));
    let layer = read_geojson(path)
        .with_context(|| format!("Failed to read {} layer: {}", what, path.display()))?;
    pb.finish_and_clear();
    info!("{}: {} features", what, layer.len());
    Ok(layer)
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_geotiff(path)
        .with_context(|| format!("Failed to read raster: {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_mode(s: &str) -> Result<ClassificationMode> {
    match s.to_lowercase().as_str() {
        "jenks" | "natural" => Ok(ClassificationMode::Jenks),
        "quantile" => Ok(ClassificationMode::Quantile),
        "equal" | "equal_interval" => Ok(ClassificationMode::EqualInterval),
        _ => bail!("Unknown classification mode: {}. Use: jenks, quantile, equal", s),
    }
}

fn warn_on_crs_mismatch(cooperatives: &FeatureCollection, others: &[(&str, &FeatureCollection)]) {
    let Some(crs) = &cooperatives.schema.crs else {
        return;
    };
    for (name, layer) in others {
        if let Some(other) = &layer.schema.crs {
            if !crs.is_equivalent(other) {
                warn!("{} layer is in {} but cooperatives are in {}", name, other, crs);
            }
        }
    }
}

fn print_report(report: &AccessibilityReport) {
    let summary = &report.summary;
    println!("\nScored features: {}", summary.count);
    if let (Some(min), Some(max), Some(mean)) = (summary.min, summary.max, summary.mean) {
        println!("  Min: {:.2}", min);
        println!("  Max: {:.2}", max);
        println!("  Mean: {:.2}", mean);
    }
    println!("  Outside all rings: {}", summary.zero_count);

    if let Some(style) = &report.style {
        println!("\nClasses ({}):", style.mode.name());
        for class in &style.classes {
            println!("  {:<20} size {:.1}  {}", class.label(), class.size, class.color.to_hex());
        }
    }
}

fn write_style(path: &Path, report: &AccessibilityReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create style file: {}", path.display()))?;
    let doc = serde_json::json!({
        "style": report.style,
        "summary": report.summary,
    });
    serde_json::to_writer_pretty(BufWriter::new(file), &doc).context("Failed to write style")?;
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Accessibility {
            cooperatives,
            roads,
            markets,
            output,
            road_distance,
            market_distance,
            road_weight,
            multipliers,
            segments,
            classes,
            mode,
            sort_by_distance,
            parallel,
            chunk_size,
            style,
        } => {
            let params = AccessibilityParams {
                road_distance,
                market_distance,
                road_weight,
                multipliers: if multipliers.is_empty() {
                    DEFAULT_MULTIPLIERS.to_vec()
                } else {
                    multipliers
                },
                segments,
                sort_by_distance,
                scoring: if parallel {
                    ScoringMode::Parallel
                } else {
                    ScoringMode::Sequential
                },
                parallel_chunk_size: chunk_size,
                style: StyleParams {
                    num_classes: classes,
                    mode: parse_mode(&mode)?,
                    ..Default::default()
                },
            };

            let coops = read_layer(&cooperatives, "cooperatives")?;
            let roads = read_layer(&roads, "roads")?;
            let markets = read_layer(&markets, "markets")?;
            warn_on_crs_mismatch(&coops, &[("roads", &roads), ("markets", &markets)]);

            let start = Instant::now();
            let feedback = ProgressFeedback::new();
            let mut sink = GeoJsonFileSink::new(&output);
            let report = AccessibilityAnalysis::new(params)
                .run(&coops, &roads, &markets, &mut sink, &feedback)
                .context("Accessibility analysis failed")?;
            feedback.finish();
            let elapsed = start.elapsed();

            if report.canceled {
                warn!("analysis canceled after {} features", report.scores.len());
            }
            print_report(&report);
            if let Some(path) = style {
                write_style(&path, &report)?;
                println!("Style saved to: {}", path.display());
            }
            done("Accessibility results", &output, elapsed);
        }

        Commands::Change {
            before,
            after,
            output,
            ignore_nodata,
        } => {
            let first = read_raster(&before)?;
            let second = read_raster(&after)?;

            let start = Instant::now();
            let result = change_detection(&first, &second, ChangeParams { ignore_nodata })
                .context("Change detection failed")?;
            let elapsed = start.elapsed();

            let pb = spinner("Writing output...");
            write_geotiff(&result.map, &output, Some(GeoTiffOptions::uint8()))
                .with_context(|| format!("Failed to write output: {}", output.display()))?;
            pb.finish_and_clear();

            let stats = result.statistics;
            println!("Total changed area: {} pixels", stats.changed_pixels);
            println!("Percentage changed: {:.2}%", stats.change_percentage);
            done("Change map", &output, elapsed);
        }

        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if !raster.is_empty() {
                println!(
                    "  Valid cells: {} ({:.1}%)",
                    stats.valid_count,
                    100.0 * stats.valid_count as f64 / raster.len() as f64
                );
            }
        }
    }

    Ok(())
}
