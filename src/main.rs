use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use randimg::commands;
use randimg::render::Render;

const HELP_TEXT: &str = r#"
  Environment
    UNSPLASH_ACCESS_KEY   Unsplash API access key (ACCESS_KEY also accepted)
    RUST_LOG              Log filter, overrides --verbose

  Examples
    $ randimg ~/.cache/randimg/requests.json ~/Pictures/wallpapers
    $ randimg -v requests.json ./out --archive all-requests.json
"#;

#[derive(Parser)]
#[command(
    name = "randimg",
    version = env!("CARGO_PKG_VERSION"),
    about = "Download a random Unsplash image",
    after_help = HELP_TEXT
)]
struct Cli {
    /// JSON file to track requests
    tracker_json: PathBuf,

    /// Directory to save image
    output_dir: PathBuf,

    /// Control the amount of information to display
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Archive of every accepted request (default: <tracker>.archive.json)
    #[arg(long, value_name = "PATH")]
    archive: Option<PathBuf>,

    /// Config file (default: ~/.randimg.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let result = commands::run(
        &cli.tracker_json,
        &cli.output_dir,
        cli.archive.as_deref(),
        cli.config.as_deref(),
        cli.verbose,
    );

    if let Err(e) = result {
        Render::new(cli.verbose).error(&e);
        process::exit(1);
    }
}
