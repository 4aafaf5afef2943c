#![deny(unsafe_code)]
//! CLI binary for hueify.
//!
//! Subcommands:
//! - `sort <tracks.json>`: extract artwork colors and print the playlist in
//!   perceptual order, optionally saving it as a new playlist file
//! - `lch <hex>`: print the CIELCh coordinates of a color

mod error;
mod files;

use clap::{Parser, Subcommand};
use error::CliError;
use files::{JsonDirSink, JsonFileSource};
use hueify_core::{rgb_to_lch, LightnessOrder, Rgb};
use hueify_pipeline::{
    CancellationToken, DuplicateAlbumPolicy, HttpLoader, Orchestrator, PipelineConfig,
    SortedPlaylist,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hueify", about = "Sort playlists by album artwork color")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log per-track colors (equivalent to RUST_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sort a JSON track list by artwork color.
    Sort {
        /// Track list: an array of track objects or a playlist items page.
        tracks: PathBuf,

        /// Pipeline settings as a JSON file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tracks processed concurrently per batch.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Per-track load and extraction budget in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Artwork variant to sample (0 = largest, 2 = smallest).
        #[arg(long)]
        artwork_index: Option<usize>,

        /// Duplicate album handling (inherit, exclude, off).
        #[arg(long)]
        duplicates: Option<String>,

        /// Lightness tie-break (dark_first, light_first).
        #[arg(long)]
        lightness: Option<String>,

        /// Directory that root-relative artwork paths resolve against.
        #[arg(long)]
        asset_root: Option<PathBuf>,

        /// Save the sorted order as a new playlist with this name.
        #[arg(long)]
        save: Option<String>,

        /// Directory saved playlists are written to.
        #[arg(long, default_value = ".")]
        sink_dir: PathBuf,
    },
    /// Print the LCH coordinates of a hex color.
    Lch {
        /// Color such as "#ff0000".
        color: String,
    },
}

/// Flag overrides applied on top of the config file.
#[derive(Debug, Default)]
struct Overrides {
    batch_size: Option<usize>,
    timeout_ms: Option<u64>,
    artwork_index: Option<usize>,
    duplicates: Option<String>,
    lightness: Option<String>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_config(path: Option<&Path>) -> Result<PipelineConfig, CliError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid config {}: {e}", path.display())))?;
    Ok(PipelineConfig::from_json(&value))
}

fn build_config(path: Option<&Path>, overrides: Overrides) -> Result<PipelineConfig, CliError> {
    let mut config = read_config(path)?;
    if let Some(n) = overrides.batch_size {
        config.batch_size = n;
    }
    if let Some(ms) = overrides.timeout_ms {
        config.item_timeout = Duration::from_millis(ms);
    }
    if let Some(index) = overrides.artwork_index {
        config.artwork_index = index;
    }
    if let Some(name) = overrides.duplicates {
        config.duplicate_albums = DuplicateAlbumPolicy::from_name(&name)
            .ok_or_else(|| CliError::Input(format!("unknown duplicate policy: {name}")))?;
    }
    if let Some(name) = overrides.lightness {
        config.sort.lightness_order = LightnessOrder::from_name(&name)
            .ok_or_else(|| CliError::Input(format!("unknown lightness order: {name}")))?;
    }
    config.validate()?;
    Ok(config)
}

/// Cancels `token` on Ctrl-C so no further batches start.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; finishing current batch");
            token.cancel();
        }
    });
}

fn print_sorted(sorted: &SortedPlaylist, saved: Option<&str>, json: bool) -> Result<(), CliError> {
    if json {
        let info = serde_json::json!({
            "tracks": sorted.ordered_tracks,
            "uris": sorted.ordered_uris,
            "fallbacks": sorted.fallback_count(),
            "saved_playlist": saved,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        for uri in &sorted.ordered_uris {
            println!("{uri}");
        }
        if let Some(id) = saved {
            eprintln!("saved {} tracks to playlist {id}", sorted.ordered_uris.len());
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Lch { color } => {
            let rgb = Rgb::from_hex(&color)?;
            let lch = rgb_to_lch(rgb);
            if cli.json {
                let info = serde_json::json!({"color": rgb, "lch": lch});
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{} L {:.2} C {:.2} H {:.2}", rgb.to_hex(), lch.l, lch.c, lch.h);
            }
        }
        Command::Sort {
            tracks,
            config,
            batch_size,
            timeout_ms,
            artwork_index,
            duplicates,
            lightness,
            asset_root,
            save,
            sink_dir,
        } => {
            let overrides = Overrides {
                batch_size,
                timeout_ms,
                artwork_index,
                duplicates,
                lightness,
            };
            let config = build_config(config.as_deref(), overrides)?;

            let mut loader = HttpLoader::new()?;
            if let Some(root) = asset_root {
                loader = loader.with_asset_root(root);
            }
            let orchestrator = Orchestrator::with_loader(loader, config)?;

            let source = JsonFileSource::new(".");
            let playlist_id = tracks.to_string_lossy();

            let token = CancellationToken::new();
            cancel_on_ctrl_c(token.clone());
            let sorted = orchestrator
                .sort_from_source_with_progress(&source, &playlist_id, &token, |progress| {
                    if progress.is_complete() && progress.all_failed() {
                        warn!(total = progress.total, "no artwork could be processed");
                    }
                })
                .await?;

            let saved = match save {
                Some(name) => {
                    let sink = JsonDirSink::new(sink_dir);
                    Some(orchestrator.save_sorted(&sink, &name, &sorted).await?)
                }
                None => None,
            };
            print_sorted(&sorted, saved.as_deref(), cli.json)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli).await {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
