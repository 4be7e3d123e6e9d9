use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stride_projector::calibration::{
    CandidateSet, SelectionMode, StdinOperator, SweepController, SweepReport,
    default_fine_tune_bases, fine_tune_candidates,
};
use stride_projector::config::{ConfigStore, DEFAULT_CONFIG_FILE};
use stride_projector::display::{self, DEFAULT_FPS, MirrorOptions, Pipeline};
use stride_projector::logging::{self, info, warn};
use stride_projector::sink::{DEFAULT_DEVICE, DEFAULT_OUTPUT, FileSink, require_device};
use stride_projector::source::framebuffer::DEFAULT_FRAMEBUFFER;
use stride_projector::source::{
    FramebufferSource, PixelLayout, ProviderChain, SourceSpec, TestPatternSource,
};
use stride_projector::{Filter, Frame, Offset, Shutdown};

/// Push images to a GM12U320 USB projector and calibrate its frame layout.
#[derive(Parser, Debug)]
#[command(name = "projector")]
#[command(about = "📽️ Drive a USB projector through its raw framebuffer file")]
#[command(long_about = "Encode pictures into the row-stride byte layout the projector driver reads,
and find that layout empirically with a calibration sweep.")]
struct Cli {
    /// Projector device node that must exist before anything is written
    #[arg(long, global = true, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// File the driver reads frames from
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Calibrated layout record
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Resampling filter
    #[arg(long, global = true, value_enum, default_value = "lanczos3")]
    filter: Filter,

    /// Append a plain-text copy of the log here
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Skip the device node check (for dry runs against a plain file)
    #[arg(long, global = true)]
    no_device_check: bool,

    /// Seconds each calibration trial stays on screen
    #[arg(long, global = true, default_value_t = 3.0)]
    dwell: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one image with the calibrated layout until Ctrl+C
    Show {
        /// Local path or http(s) URL
        image: String,
        /// Width correction in pixels (negative shrinks)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        dx: i32,
        /// Height correction in pixels (negative shrinks)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        dy: i32,
    },
    /// Sweep the standard candidate layouts and save the one chosen
    Calibrate {
        image: String,
        /// Pick the winner by padding instead of asking
        #[arg(long)]
        unattended: bool,
    },
    /// Sweep the neighbourhood of the saved and commonly working layouts
    FineTune {
        image: String,
        #[arg(long)]
        unattended: bool,
    },
    /// Mirror the Linux framebuffer, falling back to a test pattern
    Mirror {
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
        #[arg(long, default_value = DEFAULT_FRAMEBUFFER)]
        framebuffer: PathBuf,
        #[arg(long, default_value_t = 1024)]
        fb_width: u32,
        #[arg(long, default_value_t = 768)]
        fb_height: u32,
        #[arg(long, value_enum, default_value = "bgra32")]
        fb_layout: PixelLayout,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;

    if !cli.no_device_check {
        require_device(&cli.device)?;
    }
    let mut sink = FileSink::new(&cli.output);
    let store = ConfigStore::new(&cli.config);
    let mut shutdown = Shutdown::on_ctrl_c();

    match cli.command {
        Command::Show { ref image, dx, dy } => {
            let config = store.load();
            let mut source = SourceSpec::classify(image).into_source()?;
            let mut pipeline = Pipeline::new(config, cli.filter)?.with_offset(Offset { dx, dy });
            display::show(source.as_mut(), &mut pipeline, &mut sink, &mut shutdown).await?;
        }
        Command::Calibrate {
            ref image,
            unattended,
        } => {
            let controller = SweepController::builder().with_candidates(CandidateSet::standard());
            let frame = load_image(image).await?;
            let report = sweep(&cli, controller, unattended, store, &frame, &mut sink, &mut shutdown).await?;
            summarize(&report, &cli.config);
        }
        Command::FineTune {
            ref image,
            unattended,
        } => {
            let mut bases = Vec::new();
            match store.try_load() {
                Ok(Some(saved)) => bases.push(saved),
                Ok(None) => {}
                Err(e) => warn!("Ignoring saved layout: {}", e),
            }
            bases.extend(default_fine_tune_bases());
            let controller = SweepController::builder().with_configs(fine_tune_candidates(&bases));
            let frame = load_image(image).await?;
            let report = sweep(&cli, controller, unattended, store, &frame, &mut sink, &mut shutdown).await?;
            summarize(&report, &cli.config);
        }
        Command::Mirror {
            fps,
            frames,
            ref framebuffer,
            fb_width,
            fb_height,
            fb_layout,
        } => {
            let config = store.load();
            let mut chain = ProviderChain::new()
                .with(FramebufferSource::new(framebuffer, fb_width, fb_height, fb_layout))
                .with(TestPatternSource::new(config.width, config.height));
            let mut pipeline = Pipeline::new(config, cli.filter)?;
            let options = MirrorOptions {
                fps,
                max_frames: frames,
            };
            let stats =
                display::mirror(&mut chain, &mut pipeline, &mut sink, options, &mut shutdown).await?;
            info!(
                "Mirror finished: {} frames delivered, {} source failures, {} write failures",
                stats.delivered, stats.source_failures, stats.sink_failures
            );
        }
    }
    Ok(())
}

async fn load_image(location: &str) -> Result<Frame> {
    let mut source = SourceSpec::classify(location).into_source()?;
    let frame = source
        .acquire()
        .await
        .with_context(|| format!("loading {}", location))?;
    Ok(frame)
}

async fn sweep(
    cli: &Cli,
    builder: stride_projector::calibration::SweepControllerBuilder,
    unattended: bool,
    store: ConfigStore,
    frame: &Frame,
    sink: &mut FileSink,
    shutdown: &mut Shutdown,
) -> Result<SweepReport> {
    let dwell = Duration::try_from_secs_f64(cli.dwell)
        .with_context(|| format!("invalid dwell {}", cli.dwell))?;
    let selection = if unattended {
        SelectionMode::Unattended
    } else {
        SelectionMode::Interactive
    };
    let mut controller = builder
        .with_dwell(dwell)
        .with_selection(selection)
        .with_store(store)
        .with_filter(cli.filter)
        .build()?;
    let report = controller
        .run(frame, sink, &mut StdinOperator::new(), shutdown)
        .await?;
    Ok(report)
}

fn summarize(report: &SweepReport, store_path: &std::path::Path) {
    match (&report.winner, report.store_written) {
        (Some(winner), true) => info!(
            "Saved [{}] {} to {}",
            winner.index,
            winner.config,
            store_path.display()
        ),
        _ if report.cancelled => info!("Calibration cancelled; {} untouched", store_path.display()),
        _ => warn!("No configuration saved"),
    }
}
