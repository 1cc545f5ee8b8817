//! Example: B-COSFIRE vessel segmentation of a retinal image.
//!
//! Loads an RGB image, inverts its green channel, pads it to keep border
//! artifacts out of the result, and runs both B-COSFIRE banks. Writes the
//! combined response, each bank's response and the binary segmentation as
//! grayscale PNGs next to the input, plus a JSON report with the fitted
//! tuples and stage timings.
//!
//! Run from the workspace root:
//!   cargo run --release -p cosfire --example vessels -- --help
//!   cargo run --release -p cosfire --example vessels -- --input data/retina.png

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use cosfire::bcosfire::{
    BcosfireDetector, SegmentParams, asymmetric_config, symmetric_config,
    vessel_subject_from_green,
};
use cosfire::{CircleConfig, Image, TimingBreakdown, Tuple};
use image::{GrayImage, ImageReader};
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Segment vessel-like structures with B-COSFIRE")]
struct Args {
    /// Input RGB image
    #[arg(long, default_value = "data/retina.png")]
    input: PathBuf,

    /// Optional grayscale mask; zero pixels are excluded
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Zero padding added on every side before filtering
    #[arg(long, default_value_t = 20)]
    pad: usize,

    /// Rescaled response above which a pixel is marked as vessel
    #[arg(long, default_value_t = 37.0)]
    cutoff: f32,

    /// JSON file overriding the symmetric bank configuration
    #[arg(long)]
    symmetric: Option<PathBuf>,

    /// JSON file overriding the asymmetric bank configuration
    #[arg(long)]
    asymmetric: Option<PathBuf>,

    /// Output directory (default: next to the input)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    input: String,
    width: usize,
    height: usize,
    symmetric_tuples: &'a [Tuple],
    asymmetric_tuples: &'a [Tuple],
    fit_timings: TimingBreakdown,
    segment_timings: TimingBreakdown,
    vessel_pixels: usize,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>, default: CircleConfig) -> Result<CircleConfig> {
    let Some(path) = path else {
        return Ok(default);
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Copies `src` into the center of a `pad`-bordered image filled with `fill`.
fn pad_image<T: Copy>(src: &Image<T>, pad: usize, fill: T) -> Image<T> {
    let (w, h) = src.shape();
    Image::from_fn(w + 2 * pad, h + 2 * pad, |x, y| {
        if x < pad || y < pad {
            return fill;
        }
        src.get(x - pad, y - pad).copied().unwrap_or(fill)
    })
}

fn crop_image(src: &Image<f32>, pad: usize) -> Result<Image<f32>> {
    let (w, h) = src.shape();
    let inner = src
        .as_view()
        .subview(pad, pad, w - 2 * pad, h - 2 * pad)
        .context("cropping padding")?;
    Ok(inner.to_image())
}

fn save_gray(img: &Image<f32>, scale: f32, path: &Path) -> Result<()> {
    let (w, h) = img.shape();
    let bytes = img
        .data()
        .iter()
        .map(|&v| (v * scale).round().clamp(0.0, 255.0) as u8)
        .collect();
    GrayImage::from_raw(w as u32, h as u32, bytes)
        .context("building output image")?
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rgb = ImageReader::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?
        .decode()
        .with_context(|| format!("decoding {}", args.input.display()))?
        .into_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let green: Vec<u8> = rgb.pixels().map(|p| p[1]).collect();
    let green = Image::from_vec(width, height, green).context("building green channel")?;

    // Zero padding in the green channel becomes bright after inversion.
    let green = pad_image(&green, args.pad, 0u8);
    let subject = vessel_subject_from_green(&green.as_view());

    let mask = match &args.mask {
        Some(path) => {
            let m = ImageReader::open(path)
                .with_context(|| format!("opening {}", path.display()))?
                .decode()
                .with_context(|| format!("decoding {}", path.display()))?
                .into_luma8();
            ensure!(
                (m.width() as usize, m.height() as usize) == (width, height),
                "mask is {}x{}, image is {width}x{height}",
                m.width(),
                m.height()
            );
            let m = Image::from_vec(width, height, m.into_raw()).context("building mask")?;
            let m = m.as_view().map(|&v| if v > 0 { 1.0f32 } else { 0.0 });
            pad_image(&m, args.pad, 0.0)
        }
        None => Image::new_fill(subject.width(), subject.height(), 1.0f32),
    };

    println!("loaded {}: {width}x{height}", args.input.display());

    let symmetric = load_config(args.symmetric.as_deref(), symmetric_config())?;
    let asymmetric = load_config(args.asymmetric.as_deref(), asymmetric_config())?;
    let params = SegmentParams {
        cutoff: args.cutoff,
    };

    let t0 = Instant::now();
    let mut fit_timings = TimingBreakdown::default();
    let detector = BcosfireDetector::fit_with(&symmetric, &asymmetric, params, &mut fit_timings)
        .context("fitting B-COSFIRE banks")?;
    println!(
        "fitted {} symmetric and {} asymmetric tuples ({:.1} ms)",
        detector.symmetric().tuples().len(),
        detector.asymmetric().tuples().len(),
        t0.elapsed().as_secs_f64() * 1e3
    );

    let t0 = Instant::now();
    let mut segment_timings = TimingBreakdown::default();
    let seg = detector
        .segment_observed(&subject.as_view(), Some(&mask.as_view()), &mut segment_timings)
        .context("applying B-COSFIRE")?;
    println!("segmented in {:.1} ms", t0.elapsed().as_secs_f64() * 1e3);

    let response = crop_image(&seg.response, args.pad)?;
    let binary = crop_image(&seg.binary, args.pad)?;
    let vessel_pixels = binary.data().iter().filter(|&&v| v > 0.0).count();

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let stem = args
        .input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();

    // Stretch the cropped response so its maximum maps to white.
    let peak = response.data().iter().copied().fold(0.0f32, f32::max);
    let scale = if peak > 0.0 { 255.0 / peak } else { 1.0 };
    save_gray(&response, scale, &out_dir.join(format!("{stem}_response.png")))?;
    save_gray(&binary, 1.0, &out_dir.join(format!("{stem}_vessels.png")))?;
    for (name, bank) in [("symmetric", &seg.symmetric), ("asymmetric", &seg.asymmetric)] {
        let bank = crop_image(bank, args.pad)?;
        save_gray(&bank, 1.0, &out_dir.join(format!("{stem}_{name}.png")))?;
    }

    let report = Report {
        input: args.input.display().to_string(),
        width,
        height,
        symmetric_tuples: detector.symmetric().tuples(),
        asymmetric_tuples: detector.asymmetric().tuples(),
        fit_timings,
        segment_timings,
        vessel_pixels,
    };
    let report_path = out_dir.join(format!("{stem}_report.json"));
    let file = std::fs::File::create(&report_path)
        .with_context(|| format!("creating {}", report_path.display()))?;
    serde_json::to_writer_pretty(file, &report)
        .with_context(|| format!("writing {}", report_path.display()))?;

    println!(
        "{vessel_pixels} vessel pixels; results written to {}",
        out_dir.display()
    );
    Ok(())
}
