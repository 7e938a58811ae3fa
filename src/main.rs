use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use image::RgbaImage;
use rand::thread_rng;

use ferrite_sketch::error::{Result, SketchError};
use ferrite_sketch::pipeline::{self, LoadOutcome};
use ferrite_sketch::{
    grid, ActivationFunction, ModeConfig, ModeContext, ModeKey, ModelMetadata, Network,
    SketchConfig, Stroke, StrokeCanvas, TensorInfo,
};

#[derive(Parser)]
#[command(name = "ferrite-sketch", version, about = "Handwritten digit and letter recognition")]
struct Cli {
    /// Settings file; created with defaults if missing.
    #[arg(long, global = true, default_value = "ferrite-sketch.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify an image file or a JSON list of strokes.
    Predict {
        #[arg(long, default_value = "digit")]
        mode: ModeKey,
        /// Model file; defaults to the configured path for the mode.
        #[arg(long)]
        model: Option<PathBuf>,
        input: PathBuf,
    },
    /// Write an untrained dense model with the mode's tensor metadata.
    Scaffold {
        #[arg(long, default_value = "digit")]
        mode: ModeKey,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 64)]
        hidden: usize,
    },
    /// Print the diagram columns planned for a model.
    Plan {
        #[arg(long, default_value = "digit")]
        mode: ModeKey,
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = SketchConfig::load_or_init(&cli.config)?;
    match cli.command {
        Command::Predict { mode, model, input } => {
            let path = model.unwrap_or_else(|| settings.model_path(mode));
            predict(mode, &path, &input, settings.canvas_size)
        }
        Command::Scaffold { mode, out, hidden } => scaffold(mode, &out, hidden),
        Command::Plan { mode, model } => {
            let path = model.unwrap_or_else(|| settings.model_path(mode));
            plan(mode, &path)
        }
    }
}

fn load_context(mode: ModeKey, path: &Path) -> Result<ModeContext> {
    let ctx = ModeContext::new(ModeConfig::for_key(mode));
    match pipeline::load_path(&ctx, path) {
        LoadOutcome::Installed => Ok(ctx),
        other => Err(SketchError::ModelLoad(other.status_text(mode))),
    }
}

fn read_canvas(input: &Path, canvas_size: u32) -> Result<RgbaImage> {
    let bytes = std::fs::read(input)?;
    if input.extension().and_then(|e| e.to_str()) == Some("json") {
        let strokes: Vec<Stroke> = serde_json::from_slice(&bytes)
            .map_err(|e| SketchError::InvalidCanvas(format!("bad stroke file: {}", e)))?;
        let mut canvas = StrokeCanvas::new(canvas_size);
        canvas.draw_all(&strokes);
        Ok(canvas.into_image())
    } else {
        grid::decode_canvas(&bytes)
    }
}

fn predict(mode: ModeKey, model: &Path, input: &Path, canvas_size: u32) -> Result<()> {
    let ctx = load_context(mode, model)?;
    let canvas = read_canvas(input, canvas_size)?;
    let loaded = ctx
        .model()
        .ok_or_else(|| SketchError::ModelLoad(format!("{} model not loaded", mode)))?;
    let prediction = pipeline::predict(&loaded, ctx.config(), &canvas)?;
    let report = prediction.report();

    print!("{}", report.grid.to_ascii());
    println!("ink: {:.2}", report.ink_sum);
    if prediction.is_idle() {
        println!("{}", report.status_text());
        return Ok(());
    }
    if let Some(shape) = &report.accepted_shape {
        println!("accepted shape: {:?}", shape);
    }
    println!("{}  ({:.1}%)", report.status_text(), report.confidence * 100.0);

    let mut ranked: Vec<(&String, f32)> = report.labels.iter().zip(report.probabilities.iter().cloned()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (label, p) in ranked.iter().take(5) {
        let bar = "#".repeat((p * 40.0).round() as usize);
        println!("  {:>3}  {:6.2}%  {}", label, p * 100.0, bar);
    }
    Ok(())
}

fn scaffold(mode: ModeKey, out: &Path, hidden: usize) -> Result<()> {
    let config = ModeConfig::for_key(mode);
    let features = grid::GRID_SIZE * grid::GRID_SIZE;
    // The letter corpus ships flat batches; digits come as NCHW images.
    let input_dims = match mode {
        ModeKey::Digit => vec![1, 1, grid::GRID_SIZE as i64, grid::GRID_SIZE as i64],
        ModeKey::Letter => vec![-1, features as i64],
    };
    let metadata = ModelMetadata {
        description: Some(format!("untrained {} classifier", mode)),
        inputs: vec![TensorInfo::new("pixels", input_dims)],
        outputs: vec![TensorInfo::new("probabilities", vec![1, config.class_count as i64])],
        output_labels: Some(config.labels()),
    };

    let mut rng = thread_rng();
    let network = Network::new(vec![
        (hidden, features, ActivationFunction::ReLU),
        (config.class_count, hidden, ActivationFunction::Softmax),
    ], &mut rng)
    .with_metadata(metadata);

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    network.save_json(out)?;
    log::info!("wrote {} model to {}", mode, out.display());
    Ok(())
}

fn plan(mode: ModeKey, model: &Path) -> Result<()> {
    let ctx = ModeContext::new(ModeConfig::for_key(mode));
    match pipeline::load_path(&ctx, model) {
        LoadOutcome::Installed => {}
        other => log::warn!("{}; showing the default plan", other.status_text(mode)),
    }
    for layer in ctx.layers() {
        println!("{:<10} {:>3}", layer.name, layer.nodes);
    }
    Ok(())
}
