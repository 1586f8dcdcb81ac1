use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pixelframe", version)]
struct Cli {
    /// Config JSON; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the snapshot file from the config.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Claim the next free tile for an owner.
    Claim(ClaimArgs),
    /// Render the canvas as a PNG.
    Render(RenderArgs),
    /// Print an owner's claims as JSON.
    Owner(OwnerArgs),
    /// Print claim counters as JSON.
    Stats,
}

#[derive(Parser, Debug)]
struct ClaimArgs {
    /// Owner identity.
    #[arg(long)]
    owner: String,

    /// Also write the highlighted preview PNG here.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Tile to highlight, as `x,y`.
    #[arg(long, conflicts_with = "owner")]
    highlight: Option<pixelframe::TileCoord>,

    /// Highlight this owner's most recent tile.
    #[arg(long)]
    owner: Option<String>,
}

#[derive(Parser, Debug)]
struct OwnerArgs {
    /// Owner identity.
    #[arg(long)]
    owner: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = match &cli.config {
        Some(path) => pixelframe::FrameConfig::from_path(path)?,
        None => pixelframe::FrameConfig::default(),
    };
    if let Some(snapshot) = cli.snapshot {
        cfg.snapshot_path = snapshot;
    }

    match cli.cmd {
        Command::Claim(args) => cmd_claim(&cfg, args),
        Command::Render(args) => cmd_render(&cfg, args),
        Command::Owner(args) => cmd_owner(&cfg, args),
        Command::Stats => cmd_stats(&cfg),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_claim(cfg: &pixelframe::FrameConfig, args: ClaimArgs) -> anyhow::Result<()> {
    let service = cfg.build_service(Box::new(pixelframe::TrustAll))?;
    let resp = service.handle_claim(&pixelframe::FrameAction::new(args.owner))?;

    println!("{}", resp.outcome.message());
    match (&args.out, &resp.png) {
        (Some(out), Some(png)) => write_png(out, png)?,
        (Some(out), None) => eprintln!("preview unavailable, not writing {}", out.display()),
        (None, _) => {}
    }
    Ok(())
}

fn cmd_render(cfg: &pixelframe::FrameConfig, args: RenderArgs) -> anyhow::Result<()> {
    let canvas = cfg.open_canvas()?;
    let highlight = match (&args.highlight, &args.owner) {
        (Some(coord), _) => Some(*coord),
        (None, Some(owner)) => {
            let last = canvas.claims_for(owner).last().copied();
            if last.is_none() {
                eprintln!("owner '{owner}' has no claims, rendering without highlight");
            }
            last
        }
        (None, None) => None,
    };

    let compositor = cfg.compositor()?;
    let png = {
        let state = canvas.read();
        compositor.render_png(&state, highlight)?
    };
    write_png(&args.out, &png)
}

fn cmd_owner(cfg: &pixelframe::FrameConfig, args: OwnerArgs) -> anyhow::Result<()> {
    let canvas = cfg.open_canvas()?;
    let claims = canvas.claims_for(&args.owner);
    println!(
        "{}",
        serde_json::to_string(&claims).context("serialize claims")?
    );
    Ok(())
}

fn cmd_stats(cfg: &pixelframe::FrameConfig) -> anyhow::Result<()> {
    let canvas = cfg.open_canvas()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&canvas.stats()).context("serialize stats")?
    );
    Ok(())
}

fn write_png(path: &Path, png: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, png).with_context(|| format!("write png '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
