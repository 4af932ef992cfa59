use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Mat4;
use std::path::{Path, PathBuf};
use stereocube_assets::Texture;
use stereocube_input::ScriptedInput;
use stereocube_render::{FrameOrchestrator, FrameReport, RecordingBackend, RenderConfig, SceneAssets};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stereocube-cli", about = "Headless tooling for the stereo cube renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Render config (YAML). Built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective config
    Info,
    /// Run the frame loop against the recording backend
    Simulate {
        /// Number of frames before the scripted exit press
        #[arg(short, long, default_value = "3")]
        frames: usize,
        /// Slider positions, repeated across the frames
        #[arg(
            short,
            long,
            num_args = 1..,
            default_value = "0.6",
            allow_negative_numbers = true
        )]
        separation: Vec<f32>,
        /// Print frame reports as JSON
        #[arg(long)]
        json: bool,
        /// Print the recorded backend command log
        #[arg(long)]
        trace: bool,
    },
    /// Print both eye projections for a slider position
    Projection {
        #[arg(short, long, default_value = "1.0", allow_negative_numbers = true)]
        separation: f32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("stereocube-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", stereocube_assets::crate_info());
            println!("input: {}", stereocube_input::crate_info());
            println!("render: {}", stereocube_render::crate_info());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Simulate {
            frames,
            separation,
            json,
            trace,
        } => {
            let assets = SceneAssets::cube(Texture::checkerboard(64, 8, [255; 4], [40, 60, 160, 255]));
            let mut orchestrator = FrameOrchestrator::new(RecordingBackend::new(), config, &assets)
                .context("initializing renderer")?;
            let init_log = orchestrator.backend_mut().take_commands();

            let mut input = ScriptedInput::new(separation_schedule(&separation, frames));
            let mut reports = Vec::new();
            let summary = stereocube_render::run_loop(&mut orchestrator, &mut input, |report| {
                reports.push(report.clone())
            })?;

            if json {
                let out = serde_json::json!({ "frames": reports, "summary": summary });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for report in &reports {
                    println!("{}", format_report(report));
                }
                println!(
                    "{} frames ({} stereo, {} mono)",
                    summary.frames, summary.stereo_frames, summary.mono_frames
                );
            }

            if trace {
                println!("-- init: {} commands", init_log.len());
                print!("{}", orchestrator.backend().describe());
            }
        }
        Commands::Projection { separation } => {
            let iod = config.interocular(separation);
            let projection = config.projection();
            println!("separation {separation:.2} -> interocular {iod:.4}");
            println!("left eye (iod {:+.4}):", -iod);
            print_matrix(&projection.matrix(-iod));
            println!("right eye (iod {iod:+.4}):");
            print_matrix(&projection.matrix(iod));
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    match path {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(RenderConfig::default()),
    }
}

/// `frames` slider readings, cycling through `separations`.
fn separation_schedule(separations: &[f32], frames: usize) -> Vec<f32> {
    separations.iter().copied().cycle().take(frames).collect()
}

fn format_report(report: &FrameReport) -> String {
    let passes: Vec<String> = report
        .passes
        .iter()
        .map(|p| format!("{} {:+.4}", p.eye, p.interocular))
        .collect();
    format!(
        "frame {:>4}: separation {:.2} passes [{}] angle {:.1}°",
        report.frame,
        report.separation,
        passes.join(", "),
        report.rotation.angle_x.to_degrees()
    )
}

fn print_matrix(m: &Mat4) {
    for i in 0..4 {
        let row = m.row(i);
        println!(
            "  [{:>9.4} {:>9.4} {:>9.4} {:>9.4}]",
            row.x, row.y, row.z, row.w
        );
    }
}
