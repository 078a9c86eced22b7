//! Brain Viewer - Rust Implementation
//!
//! CLI commands:
//! - inspect: Summarize a payload (mesh, activation, faults)
//! - render: Export one frame's buffers as JSON
//! - play: Run playback on the wall-clock timer
//! - pick: Resolve the hover readout for a vertex
//! - legend: Write a palette color bar as PNG
//! - synth: Attach the synthetic wave to a mesh and save it as a payload

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use brain_viewer::config::{Environment, Settings};
use brain_viewer::logging;
use brain_viewer::palette::{self, ColorScale};
use brain_viewer::playback::TickOutcome;
use brain_viewer::{ActivationDataset, BrainPayload, BrainViewer, PickEvent, RenderFrame, TokioTicker};

#[derive(Parser)]
#[command(name = "brain_viewer")]
#[command(about = "Time-varying activation rendering over brain surfaces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to viewer.yaml settings
    #[arg(short, long, default_value = "viewer.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a payload (.json or .ply)
    Inspect {
        payload: PathBuf,
    },

    /// Export one frame's render buffers as JSON
    Render {
        payload: PathBuf,

        #[arg(short, long, default_value = "0")]
        time_index: usize,

        /// rainbow, heatmap or blueRed (defaults to settings)
        #[arg(short, long)]
        palette: Option<String>,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play through frames on the real timer
    Play {
        payload: PathBuf,

        /// Number of ticks before stopping
        #[arg(short = 'n', long, default_value = "10")]
        ticks: usize,

        /// Tick interval override in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },

    /// Show the hover readout for a vertex at a time index
    Pick {
        payload: PathBuf,

        #[arg(short, long)]
        vertex: usize,

        #[arg(short, long, default_value = "0")]
        time_index: usize,
    },

    /// Write a palette legend bar as PNG
    Legend {
        #[arg(short, long, default_value = "rainbow")]
        palette: String,

        #[arg(short, long, default_value = "legend.png")]
        output: PathBuf,

        #[arg(long, default_value = "256")]
        width: u32,

        #[arg(long, default_value = "24")]
        height: u32,
    },

    /// Generate the synthetic activation wave for a mesh
    Synth {
        mesh: PathBuf,

        #[arg(short, long, default_value = "brain_data.json")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct RenderExport<'a> {
    generated: String,
    source: String,
    #[serde(flatten)]
    frame: RenderFrame<'a>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = Environment::load();
    let settings = Settings::load_or_default(&cli.config)?.with_environment(&env)?;

    let _guard = logging::init_logging(&settings.logging.dir, &settings.logging.filter)?;
    tracing::info!("Brain Viewer starting up");
    tracing::debug!("Settings: {:?}", settings);

    match cli.command {
        Commands::Inspect { payload } => {
            inspect(&payload, &settings)?;
        }

        Commands::Render { payload, time_index, palette, output } => {
            render(&payload, &settings, time_index, palette.as_deref(), output.as_deref())?;
        }

        Commands::Play { payload, ticks, interval_ms } => {
            let mut settings = settings;
            if let Some(ms) = interval_ms {
                settings.playback.interval_ms = ms;
                settings.validate()?;
            }
            play(&payload, &settings, ticks).await?;
        }

        Commands::Pick { payload, vertex, time_index } => {
            pick(&payload, &settings, vertex, time_index)?;
        }

        Commands::Legend { palette, output, width, height } => {
            let scale = ColorScale::from_name(&palette);
            palette::legend(scale, width, height)
                .save(&output)
                .with_context(|| format!("writing legend to {:?}", output))?;
            println!("{} legend -> {:?} ({}x{})", scale, output, width, height);
        }

        Commands::Synth { mesh, output } => {
            synth(&mesh, &settings, &output)?;
        }
    }

    Ok(())
}

fn open(path: &Path, settings: &Settings) -> anyhow::Result<BrainViewer> {
    let payload = BrainPayload::load(path).with_context(|| format!("loading {:?}", path))?;
    Ok(BrainViewer::new(payload, settings))
}

/// Print mesh and activation summary
fn inspect(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    let viewer = open(path, settings)?;

    println!("Payload: {:?}", path);
    match viewer.geometry() {
        Some(mesh) => {
            let bounds = mesh.bounds();
            println!("  Vertices: {}", mesh.vertex_count());
            println!("  Faces:    {}", mesh.face_count());
            println!("  Bounds:   {:?} .. {:?}", bounds.min, bounds.max);
            println!("  Center:   {:?} (extent {:.3})", bounds.center(), bounds.max_extent());
        }
        None => println!("  No renderable geometry"),
    }

    let dataset = viewer.dataset();
    println!(
        "  Frames:   {} ({:?}, {:.3}s)",
        dataset.frame_count(),
        dataset.origin(),
        dataset.duration()
    );
    if let Some((min, max)) = viewer.current_range() {
        println!("  Frame 0 range: [{:.4}, {:.4}]", min, max);
    }
    if let Some(fault) = viewer.fault() {
        let kind = if fault.is_structural() { "structural" } else { "load" };
        println!("  Fault:    {} ({})", fault, kind);
    }
    Ok(())
}

/// Dump one frame's buffers as JSON
fn render(
    path: &Path,
    settings: &Settings,
    time_index: usize,
    palette: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut viewer = open(path, settings)?;
    if let Some(name) = palette {
        viewer.set_color_scale(name);
    }
    viewer.set_time_index(time_index);

    let frame = viewer
        .render_frame()
        .ok_or_else(|| anyhow::anyhow!("{:?} has no renderable geometry", path))?;
    let export = RenderExport {
        generated: chrono::Local::now().to_rfc3339(),
        source: path.display().to_string(),
        frame,
    };
    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(out) => {
            std::fs::write(out, json)?;
            println!(
                "Frame {} ({}) -> {:?}",
                export.frame.time_index, export.frame.palette, out
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Drive playback with the tokio timer for `ticks` ticks
async fn play(path: &Path, settings: &Settings, ticks: usize) -> anyhow::Result<()> {
    let payload = BrainPayload::load(path).with_context(|| format!("loading {:?}", path))?;
    let (ticker, mut rx) = TokioTicker::new();
    let mut viewer = BrainViewer::with_scheduler(payload, settings, ticker);

    if viewer.dataset().is_empty() {
        anyhow::bail!("{:?} has no frames to play", path);
    }

    viewer.play();
    println!(
        "Playing {} frames every {}ms",
        viewer.dataset().frame_count(),
        viewer.playback_state().interval_ms
    );

    let mut delivered = 0;
    while delivered < ticks {
        let Some(token) = rx.recv().await else {
            break;
        };
        if let TickOutcome::Advanced(index) = viewer.on_tick(token) {
            viewer.refresh();
            let (min, max) = viewer.current_range().unwrap_or((0.0, 0.0));
            let time = viewer.dataset().time_at(index).unwrap_or(0.0);
            println!("  [{:>4}] t={:.3}s range=[{:.4}, {:.4}]", index, time, min, max);
            delivered += 1;
        }
    }

    viewer.pause();
    println!("Stopped at frame {}", viewer.time_index());
    Ok(())
}

/// Print the hover readout for one vertex as JSON
fn pick(path: &Path, settings: &Settings, vertex: usize, time_index: usize) -> anyhow::Result<()> {
    let mut viewer = open(path, settings)?;
    let point = viewer
        .geometry()
        .and_then(|mesh| mesh.vertex(vertex))
        .ok_or_else(|| anyhow::anyhow!("vertex {} not in mesh", vertex))?;

    viewer.set_time_index(time_index);
    let hover = viewer.pointer_over(PickEvent::new(point, vertex));
    println!("{}", serde_json::to_string_pretty(&hover)?);
    Ok(())
}

/// Write the mesh plus synthetic activation as a payload
fn synth(mesh: &Path, settings: &Settings, output: &Path) -> anyhow::Result<()> {
    let payload = BrainPayload::load(mesh).with_context(|| format!("loading {:?}", mesh))?;
    let dataset = ActivationDataset::synthetic(&payload.vertices, settings.synthetic.time_step_s);

    payload.with_activation(&dataset).save(output)?;
    println!(
        "Synthetic wave: {} frames x {} vertices -> {:?}",
        dataset.frame_count(),
        dataset.frames().first().map_or(0, |f| f.len()),
        output
    );
    Ok(())
}
