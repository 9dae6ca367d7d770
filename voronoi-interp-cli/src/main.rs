//! Voronoi interpolation CLI
//!
//! Rebuilds an image from a sparse set of sites: every pixel takes the
//! average color of the Voronoi cell it falls in.
//!
//! Run with: `voronoi-interp -i img.jpg -o out.png -n 2000`
//!
//! ## Several site counts
//!
//! `-n` may be repeated; each count is rendered to its own file with the
//! count appended to the file stem:
//!
//!   voronoi-interp -i img.jpg -o out.png -n 100 -n 1000 -n 10000
//!
//! writes `out_100.png`, `out_1000.png` and `out_10000.png`.
//!
//! ## Site files
//!
//! Explicit sites can be given as YAML:
//!
//! ```yaml
//! sites:
//!   - [10, 20]
//!   - [300, 45]
//! ```
//!
//! ## Graceful interruption
//!
//! Press Ctrl+C to stop after the run in progress.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use voronoi_interp::{
    random_sites, BruteForceBackend, ComputeBackend, DelaunayBackend, Position, Shading,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShadingArg {
    /// Each pixel gets its cell's average color
    Flat,
    /// Blend the averages of the surrounding Delaunay triangle
    Barycentric,
}

impl From<ShadingArg> for Shading {
    fn from(arg: ShadingArg) -> Self {
        match arg {
            ShadingArg::Flat => Shading::Flat,
            ShadingArg::Barycentric => Shading::Barycentric,
        }
    }
}

/// YAML site file format
#[derive(Debug, Deserialize)]
struct SitesFile {
    sites: Vec<[u32; 2]>,
}

fn load_sites_file(path: &Path) -> anyhow::Result<Vec<Position>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sites file: {:?}", path))?;
    let file: SitesFile = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse sites file: {:?}", path))?;
    Ok(file.sites.into_iter().map(|[x, y]| Position::new(x, y)).collect())
}

/// Resolve target dimensions from CLI overrides.
/// If only one dimension is given, the other is computed to preserve aspect ratio.
fn resolve_dimensions(
    orig_w: u32,
    orig_h: u32,
    cli_w: Option<u32>,
    cli_h: Option<u32>,
) -> (u32, u32) {
    match (cli_w, cli_h) {
        (Some(tw), Some(th)) => (tw, th),
        (Some(tw), None) => {
            let th = (orig_h as f64 * tw as f64 / orig_w as f64).round() as u32;
            (tw, th.max(1))
        }
        (None, Some(th)) => {
            let tw = (orig_w as f64 * th as f64 / orig_h as f64).round() as u32;
            (tw.max(1), th)
        }
        (None, None) => (orig_w, orig_h),
    }
}

/// Output path for one run: `out.png` becomes `out_<n>.png` when several
/// site counts are rendered.
fn run_output_path(output: &Path, label: usize, numbered: bool) -> PathBuf {
    if !numbered {
        return output.to_path_buf();
    }
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let name = match output.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, label, ext),
        None => format!("{}_{}", stem, label),
    };
    output.with_file_name(name)
}

/// Input on the left, reconstruction on the right
fn side_by_side(left: &image::RgbImage, right: &image::RgbImage) -> image::RgbImage {
    let (w, h) = left.dimensions();
    let mut canvas = image::RgbImage::new(w + right.width(), h.max(right.height()));
    image::imageops::replace(&mut canvas, left, 0, 0);
    image::imageops::replace(&mut canvas, right, w as i64, 0);
    canvas
}

#[derive(Parser, Debug)]
#[command(name = "voronoi-interp")]
#[command(about = "Rebuild images from Voronoi cell averages", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Input image path (alpha is discarded)
    #[arg(short, long)]
    input: PathBuf,

    /// Output image path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of random sites; repeat to render several outputs
    #[arg(short = 'n', long = "sites", default_value = "1000")]
    sites: Vec<usize>,

    /// YAML file with explicit sites (overrides -n)
    #[arg(long)]
    sites_file: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value = "0")]
    seed: u64,

    /// How output pixels are colored
    #[arg(long, value_enum, default_value = "flat")]
    shading: ShadingArg,

    /// Number of worker threads (0 = one per core)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Also write input and output side by side to this path
    #[arg(long)]
    compare: Option<PathBuf>,

    /// Process at this width (scales input; preserves aspect ratio if only one dim given)
    #[arg(long)]
    width: Option<u32>,

    /// Process at this height (scales input; preserves aspect ratio if only one dim given)
    #[arg(long)]
    height: Option<u32>,

    /// Run benchmark comparing the triangulation against a full scan
    #[arg(long)]
    benchmark: bool,

    /// Number of timed runs per backend in benchmark mode
    #[arg(long, default_value = "5")]
    bench_runs: usize,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    // Set up SIGINT handler
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .context("failed to set Ctrl-C handler")?;
    }

    // Load input image
    println!("Loading image: {:?}", args.input);
    let mut image = image::open(&args.input)
        .with_context(|| format!("failed to open {:?}", args.input))?
        .to_rgb8();
    let (orig_w, orig_h) = image.dimensions();

    let (target_w, target_h) = resolve_dimensions(orig_w, orig_h, args.width, args.height);
    if (target_w, target_h) != (orig_w, orig_h) {
        println!("Resizing {}x{} -> {}x{}", orig_w, orig_h, target_w, target_h);
        image = image::imageops::resize(&image, target_w, target_h, image::imageops::FilterType::Lanczos3);
    }

    let (width, height) = image.dimensions();
    println!("Image size: {}x{}", width, height);

    // Run benchmark mode if requested
    if args.benchmark {
        return run_benchmark(&image, &args);
    }

    // Require output path for normal rendering
    let output = args.output.as_ref()
        .ok_or_else(|| anyhow::anyhow!("Output path required (use -o/--output)"))?;

    // Each run is (label, sites)
    let runs: Vec<(usize, Vec<Position>)> = match &args.sites_file {
        Some(path) => {
            let sites = load_sites_file(path)?;
            println!("Loaded {} sites from {:?}", sites.len(), path);
            vec![(sites.len(), sites)]
        }
        None => args.sites.iter()
            .map(|&n| (n, random_sites(n, width, height, args.seed)))
            .collect(),
    };
    let numbered = runs.len() > 1;
    tracing::debug!(runs = runs.len(), threads = args.threads, "starting interpolation runs");

    let mut backend = DelaunayBackend::with_threads(args.threads).with_shading(args.shading.into());
    println!("Using {:?} shading (seed: {})", backend.shading, args.seed);

    let progress = ProgressBar::new(runs.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut completed = 0usize;
    for (label, sites) in &runs {
        if interrupted.load(Ordering::Relaxed) {
            progress.abandon_with_message("Interrupted");
            eprintln!("Interrupted after {} of {} runs", completed, runs.len());
            break;
        }
        progress.set_message(format!("{} sites", label));

        let start = Instant::now();
        let rendered = backend.interpolate(&image, sites)
            .with_context(|| format!("interpolation with {} sites failed", label))?;
        let elapsed = start.elapsed();

        let path = run_output_path(output, *label, numbered);
        rendered.save(&path)
            .with_context(|| format!("failed to write {:?}", path))?;

        if let Some(compare) = &args.compare {
            let compare_path = run_output_path(compare, *label, numbered);
            side_by_side(&image, &rendered).save(&compare_path)
                .with_context(|| format!("failed to write {:?}", compare_path))?;
        }

        progress.println(format!(
            "{:>8} sites -> {:?} ({:.1} ms)",
            label, path, elapsed.as_secs_f64() * 1000.0,
        ));
        completed += 1;
        progress.inc(1);
    }

    if !interrupted.load(Ordering::Relaxed) {
        progress.finish_with_message("done");
    }
    println!("Wrote {} of {} outputs", completed, runs.len());
    Ok(())
}

/// Benchmark the triangulation backend against the brute-force scan
fn run_benchmark(image: &image::RgbImage, args: &Args) -> anyhow::Result<()> {
    let (width, height) = image.dimensions();
    let num_runs = args.bench_runs.max(1);

    println!("\n=== Voronoi Interpolation Benchmark ===");
    println!("Image: {}x{}", width, height);
    println!("Runs: {}", num_runs);

    for &num_sites in &args.sites {
        // Generate fixed positions for fair comparison
        let positions = random_sites(num_sites, width, height, args.seed);
        println!("\nSites: {}", num_sites);

        let delaunay_time = benchmark_backend(
            &mut DelaunayBackend::with_threads(args.threads), image, &positions, num_runs,
        )?;
        report("Delaunay", delaunay_time, num_runs);

        let brute_time = benchmark_backend(&mut BruteForceBackend::new(), image, &positions, num_runs)?;
        report("Full scan", brute_time, num_runs);

        let speedup = brute_time.as_secs_f64() / delaunay_time.as_secs_f64();
        println!("  Delaunay is {:.2}x faster than a full scan", speedup);
    }

    Ok(())
}

fn report(name: &str, total: Duration, num_runs: usize) {
    println!(
        "  {:>9}: {:?} total, {:.2} ms/run",
        name,
        total,
        total.as_secs_f64() * 1000.0 / num_runs as f64
    );
}

/// Benchmark a single backend
fn benchmark_backend(
    backend: &mut dyn ComputeBackend,
    image: &image::RgbImage,
    positions: &[Position],
    num_runs: usize,
) -> anyhow::Result<Duration> {
    // Warmup run
    let _ = backend.compute(image, positions)?;

    // Timed runs
    let start = Instant::now();
    for _ in 0..num_runs {
        let _ = backend.compute(image, positions)?;
    }
    Ok(start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_dimensions() {
        assert_eq!(resolve_dimensions(400, 300, None, None), (400, 300));
        assert_eq!(resolve_dimensions(400, 300, Some(200), None), (200, 150));
        assert_eq!(resolve_dimensions(400, 300, None, Some(600)), (800, 600));
        assert_eq!(resolve_dimensions(400, 300, Some(10), Some(10)), (10, 10));
    }

    #[test]
    fn test_run_output_path() {
        let out = Path::new("renders/out.png");
        assert_eq!(run_output_path(out, 100, false), PathBuf::from("renders/out.png"));
        assert_eq!(run_output_path(out, 100, true), PathBuf::from("renders/out_100.png"));
        assert_eq!(run_output_path(Path::new("out"), 7, true), PathBuf::from("out_7"));
    }

    #[test]
    fn test_side_by_side() {
        let left = image::RgbImage::from_pixel(3, 2, image::Rgb([255, 0, 0]));
        let right = image::RgbImage::from_pixel(3, 2, image::Rgb([0, 0, 255]));
        let canvas = side_by_side(&left, &right);
        assert_eq!(canvas.dimensions(), (6, 2));
        assert_eq!(canvas.get_pixel(2, 1).0, [255, 0, 0]);
        assert_eq!(canvas.get_pixel(3, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_sites_file_format() {
        let file: SitesFile = serde_yaml::from_str("sites:\n  - [10, 20]\n  - [3, 4]\n").unwrap();
        assert_eq!(file.sites, vec![[10, 20], [3, 4]]);
    }
}
