use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use phonedeck::store;
use phonedeck::ui;

/// Terminal dashboard for phone deployment clusters.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Cluster file to load and keep saved
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("PHONEDECK_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        // the terminal belongs to the UI, logs are swallowed unless asked for
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    info!("Starting phonedeck with {}", args.config.display());
    let root = match store::load(&args.config) {
        Ok(root) => root,
        Err(err) => {
            error!("Could not load {}: {}", args.config.display(), err);
            eprintln!("Could not load {}: {}", args.config.display(), err);
            process::exit(1);
        }
    };

    let app = ui::App::new(root, args.config);
    if let Err(err) = ui::run(app).await {
        error!("UI loop failed: {}", err);
        eprintln!("phonedeck: {}", err);
        process::exit(1);
    }
}
