use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "loopcomp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a layout over a background and write the animation.
    Compose(ComposeArgs),
    /// Print the timeline plan for a layout as JSON.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Background image.
    #[arg(long)]
    background: PathBuf,

    /// Layout manifest JSON.
    #[arg(long)]
    layout: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = FormatChoice::Apng)]
    format: FormatChoice,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Options JSON; environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Layout manifest JSON.
    #[arg(long)]
    layout: PathBuf,

    /// Options JSON; environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Apng,
    Gif,
}

impl From<FormatChoice> for loopcomp::OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Apng => Self::Apng,
            FormatChoice::Gif => Self::Gif,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn load_opts(config: Option<&Path>) -> anyhow::Result<loopcomp::ComposeOpts> {
    let mut opts = match config {
        Some(path) => loopcomp::ComposeOpts::from_path(path)?,
        None => loopcomp::ComposeOpts::default(),
    };
    opts.apply_env()?;
    opts.validate()?;
    Ok(opts)
}

fn load_layout(layout: &Path) -> anyhow::Result<loopcomp::LoadedLayout> {
    let manifest = loopcomp::LayoutManifest::from_path(layout)?;
    let root = layout.parent().unwrap_or_else(|| Path::new("."));
    let prepare = loopcomp::PrepareOpts::from_env()?;
    Ok(manifest.load(root, &prepare)?)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let opts = load_opts(args.config.as_deref())?;
    let background = image::open(&args.background)
        .with_context(|| format!("open background '{}'", args.background.display()))?
        .to_rgba8();
    let layout = load_layout(&args.layout)?;
    let background = layout.paint_statics(&background);

    let out = loopcomp::compose_animation(
        &background,
        &layout.placements,
        &layout.assets,
        args.format.into(),
        &opts,
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &out.bytes)
        .with_context(|| format!("write '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}, {} frames, {} bytes)",
        args.out.display(),
        out.mime,
        out.frame_count,
        out.bytes.len()
    );
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let opts = load_opts(args.config.as_deref())?;
    let layout = load_layout(&args.layout)?;
    let plan = loopcomp::plan_timeline(&layout.assets, &opts)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
