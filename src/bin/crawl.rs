use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "crawl", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the full intro as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Directory holding the background, logo, font and soundtrack.
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// JSON file overriding render parameters.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output MP4 path.
    #[arg(long, default_value = crawl::config::DEFAULT_OUT_FILE)]
    out: PathBuf,

    /// Leave the soundtrack out.
    #[arg(long)]
    no_audio: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Movie time in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn init_logger(verbose: bool) {
    let default = if verbose { "crawl=debug,info" } else { "crawl=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<crawl::CrawlConfig> {
    let cfg = match path {
        Some(p) => crawl::CrawlConfig::from_json_file(p)?,
        None => crawl::CrawlConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.scene.config.as_deref())?;
    let opts = crawl::RenderToMp4Opts {
        with_audio: !args.no_audio,
        ..crawl::RenderToMp4Opts::new(&args.out)
    };
    let stats = crawl::render_to_mp4(cfg, &args.scene.assets, opts)
        .with_context(|| format!("render '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({} frames in {:.1}s)",
        args.out.display(),
        stats.frames_total,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.at.is_finite() && args.at >= 0.0,
        "--at must be a non-negative number of seconds"
    );
    let cfg = load_config(args.scene.config.as_deref())?;
    let scene = crawl::prepare_scene(cfg, &args.scene.assets)?;

    let idx = crawl::FrameIndex(scene.fps().secs_to_frames_floor(args.at));
    let range = scene.frame_range()?;
    anyhow::ensure!(
        range.contains(idx),
        "--at {} is past the end of the movie",
        args.at
    );
    let frame = scene.render_frame(idx)?;

    crawl::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
