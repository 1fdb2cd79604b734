use clap::{Parser, Subcommand};
use deepqr::tools::{
    BenchSummary, bench_limit_from_env, binary_preview, dark_ratio, dataset_images,
    dataset_root_from_env, expected_symbol_count, load_gray, max_dim_from_env,
};
use deepqr::utils::binarization::{Binarizer, binarize};
use deepqr::{Detector, DetectorConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "deepqr CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect and decode QR codes in a single image
    Detect {
        #[arg(long)]
        image: PathBuf,
        /// Detector input scale in (0, 1]; other values use the area policy
        #[arg(long)]
        scale_factor: Option<f32>,
        /// Disable the super-resolution model
        #[arg(long)]
        no_sr: bool,
    },
    /// Write the binarized image for inspection
    Binarize {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run detection over every image in a dataset directory
    DatasetBench {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Detect {
            image,
            scale_factor,
            no_sr,
        } => detect_cmd(&image, scale_factor, no_sr),
        Command::Binarize { image, out } => binarize_cmd(&image, &out),
        Command::DatasetBench { root, limit } => dataset_bench_cmd(root, limit),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn build_detector(scale_factor: Option<f32>, no_sr: bool) -> Result<Detector, String> {
    let mut config = DetectorConfig::from_env();
    if let Some(factor) = scale_factor {
        config.set_scale_factor(factor);
    }
    if no_sr {
        config.use_super_resolution = false;
    }

    #[cfg(feature = "onnx")]
    {
        let backend = deepqr::inference::onnx::OnnxBackend::new();
        Detector::from_config(&backend, config).map_err(|e| format!("Failed to create detector: {e}"))
    }
    #[cfg(not(feature = "onnx"))]
    {
        if config.detect_model.is_some() || config.sr_model.is_some() {
            log::warn!("model paths configured but the onnx feature is disabled; running without models");
        }
        Ok(Detector::from_models(None, None, config))
    }
}

fn detect_cmd(image: &Path, scale_factor: Option<f32>, no_sr: bool) -> Result<(), String> {
    let mut detector = build_detector(scale_factor, no_sr)?;
    let gray = load_gray(image, max_dim_from_env())
        .map_err(|e| format!("Failed to load image {}: {e}", image.display()))?;

    let start = Instant::now();
    let results = detector.detect_and_decode(&gray);
    let elapsed = start.elapsed();

    println!("Image: {} ({}x{})", image.display(), gray.width(), gray.height());
    println!("Found {} QR codes in {:.2?}", results.len(), elapsed);
    for (i, record) in results.iter().enumerate() {
        let corners: Vec<String> = record
            .quad
            .points
            .iter()
            .map(|p| format!("({:.1}, {:.1})", p.x, p.y))
            .collect();
        println!("  QR {}: content={:?} corners=[{}]", i, record.text, corners.join(", "));
    }
    Ok(())
}

fn binarize_cmd(image: &Path, out: &Path) -> Result<(), String> {
    let gray = load_gray(image, max_dim_from_env())
        .map_err(|e| format!("Failed to load image {}: {e}", image.display()))?;
    let variant = Binarizer::select(gray.width(), gray.height());
    let binary = binarize(&gray);
    binary_preview(&binary)
        .save(out)
        .map_err(|e| format!("Failed to write {}: {e}", out.display()))?;
    println!(
        "{:?}: {}x{} dark_ratio={:.2}% -> {}",
        variant,
        binary.width(),
        binary.height(),
        dark_ratio(&binary) * 100.0,
        out.display()
    );
    Ok(())
}

fn dataset_bench_cmd(root: Option<PathBuf>, limit: Option<usize>) -> Result<(), String> {
    let root = root.unwrap_or_else(dataset_root_from_env);
    let limit = limit.or_else(bench_limit_from_env);
    if !root.exists() {
        return Err(format!("Dataset root not found: {}", root.display()));
    }

    let images = dataset_images(&root, limit);
    if images.is_empty() {
        println!("No images found under {}", root.display());
        return Ok(());
    }

    let mut detector = build_detector(None, false)?;
    let max_dim = max_dim_from_env();
    let mut summary = BenchSummary::default();

    for path in images {
        let gray = match load_gray(&path, max_dim) {
            Ok(gray) => gray,
            Err(err) => {
                eprintln!("Failed to load {}: {}", path.display(), err);
                continue;
            }
        };
        let label = path.with_extension("txt");
        let expected = label.exists().then(|| expected_symbol_count(&label));

        let start = Instant::now();
        let results = detector.detect_and_decode(&gray);
        let elapsed = start.elapsed();
        summary.record(&results, expected, elapsed);

        println!(
            "{}: {}x{} -> {} results ({:.2?})",
            path.display(),
            gray.width(),
            gray.height(),
            results.len(),
            elapsed
        );
    }

    println!(
        "Images: {}  hits: {}  symbols: {}",
        summary.images, summary.hits, summary.symbols
    );
    if let Some(rate) = summary.reading_rate() {
        println!(
            "Reading rate: {}/{} = {:.2}%",
            summary.labeled_hits, summary.labeled, rate
        );
    }
    println!(
        "Total time: {:.2?} (mean {:.2?})",
        summary.elapsed,
        summary.mean_time()
    );
    Ok(())
}
