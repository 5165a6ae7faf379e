use blurframe::imaging::{
    ExtractRect, RustBackend, ThumbnailConfig, create_thumbnail, get_dimensions,
};
use blurframe::{config, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("BLURFRAME_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("BLURFRAME_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "blurframe")]
#[command(about = "Crop-and-frame thumbnail service")]
#[command(long_about = "\
Crop-and-frame thumbnail service

Takes an image and a crop rectangle and renders a fixed-size thumbnail: the
crop, scaled to fit without distortion, centered on a blurred backdrop made
from the same crop.

HTTP API (blurframe serve):

  POST /api/thumbnail           multipart: img, top, left, width, height
                                → ./api/thumbnail/get?id=<id>
  GET  /api/thumbnail/get?id=N  the JPEG, once; the file is deleted after

Run 'blurframe gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve,
    /// Render one thumbnail from a local file
    Render(RenderArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Source image
    #[arg(long)]
    input: PathBuf,
    /// Where to write the JPEG
    #[arg(long)]
    output: PathBuf,
    #[arg(long, allow_negative_numbers = true)]
    top: i64,
    #[arg(long, allow_negative_numbers = true)]
    left: i64,
    #[arg(long, allow_negative_numbers = true)]
    width: i64,
    #[arg(long, allow_negative_numbers = true)]
    height: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            init_tracing();
            let config = config::load_config(&cli.config)?;
            server::serve(config).await?;
        }
        Command::Render(args) => {
            init_tracing();
            let config = config::load_config(&cli.config)?;
            let thumbnail_config = ThumbnailConfig::from(&config.thumbnail);
            let backend = RustBackend::new();

            let source = std::fs::read(&args.input)?;
            let dims = get_dimensions(&backend, &source)?;
            println!(
                "==> {} ({}x{})",
                args.input.display(),
                dims.width,
                dims.height
            );

            let rect = ExtractRect::new(args.top, args.left, args.width, args.height);
            let thumbnail = create_thumbnail(&backend, &source, &rect, &thumbnail_config)?;
            std::fs::write(&args.output, &thumbnail)?;
            println!(
                "==> Wrote {} ({}x{}, {} bytes)",
                args.output.display(),
                thumbnail_config.canvas.width,
                thumbnail_config.canvas.height,
                thumbnail.len()
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
