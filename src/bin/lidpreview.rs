use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lid_compositor::{CompositorConfig, DesignProfile, FsAssetSource, Snapshot, render_design};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lidpreview", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a saved design profile to a PNG.
    Render(RenderArgs),
    /// List the texture catalog with unit prices.
    Catalog(CatalogArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Design profile JSON.
    #[arg(long)]
    profile: PathBuf,

    /// Directory asset references resolve against.
    #[arg(long)]
    assets: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Compositor config JSON. Defaults to the built-in storefront config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device pixel ratio, clamped to 1..=2.
    #[arg(long)]
    pixel_ratio: Option<f32>,

    /// Artwork reference, overriding the profile's `artworkRef`.
    #[arg(long)]
    artwork: Option<String>,

    /// Leave out the dashed bleed guide, for production artwork.
    #[arg(long)]
    no_guides: bool,
}

#[derive(Parser, Debug)]
struct CatalogArgs {
    /// Compositor config JSON. Defaults to the built-in storefront config.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Catalog(args) => cmd_catalog(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CompositorConfig> {
    match path {
        Some(path) => CompositorConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display())),
        None => Ok(CompositorConfig::default()),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ratio) = args.pixel_ratio {
        config.surface = config.surface.with_pixel_ratio(ratio);
    }

    let json = std::fs::read_to_string(&args.profile)
        .with_context(|| format!("read profile '{}'", args.profile.display()))?;
    let mut profile = DesignProfile::from_json(&json).with_context(|| "parse profile JSON")?;
    if let Some(artwork) = args.artwork {
        profile.artwork_ref = Some(artwork);
    }
    if args.no_guides {
        profile.layers.guides = false;
    }

    let pixmap = render_design(config, &profile, FsAssetSource::new(&args.assets))
        .with_context(|| format!("render '{}'", args.profile.display()))?;
    let snapshot = Snapshot::encode(&pixmap, 0)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, snapshot.png_bytes())
        .with_context(|| format!("write '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{})",
        args.out.display(),
        snapshot.width(),
        snapshot.height()
    );
    Ok(())
}

fn cmd_catalog(args: CatalogArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let catalog = config.catalog()?;
    let default_id = catalog.default_texture().id.clone();
    for texture in catalog.iter() {
        let marker = if texture.id == default_id { "*" } else { " " };
        println!(
            "{marker} {:<14} {:<22} {:>8.2} {}",
            texture.id,
            texture.display_name,
            lid_compositor::unit_price(config.base_price, texture),
            config.currency
        );
    }
    Ok(())
}
