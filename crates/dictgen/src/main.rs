use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use dictgen::artifacts;
use wiktextract_dict::Dictionary;
use wiktextract_fetch::{CACHE_FILE_NAME, KAIKKI_FRENCH_URL, Progress, fetch_cached};

/// Build full, bundled and phrase dictionaries from a wiktextract dump.
#[derive(Parser, Debug)]
#[command(name = "dictgen", version)]
struct Cli {
    /// Local dump to process; skips the download step entirely.
    #[arg(long, conflicts_with_all = ["url", "cache_dir"])]
    input: Option<PathBuf>,

    /// Dump URL fetched when no --input is given.
    #[arg(long, default_value = KAIKKI_FRENCH_URL)]
    url: String,

    /// Directory the downloaded dump is cached in.
    #[arg(long, default_value = ".")]
    cache_dir: PathBuf,

    /// Directory the artifacts are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Artifact name prefix: <prefix>-full.json, <prefix>.json,
    /// <prefix>-phrases.json.
    #[arg(long, default_value = "fr-en")]
    prefix: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let input = match &cli.input {
        Some(path) => path.clone(),
        None => {
            let dest = cli.cache_dir.join(CACHE_FILE_NAME);
            fetch_cached(&cli.url, &dest, download_progress())
                .with_context(|| format!("fetching {}", cli.url))?
        }
    };

    info!("processing {}", input.display());
    let start = Instant::now();
    let dict = Dictionary::build_from_file(&input)?;
    let stats = dict.stats();
    info!(
        "{} lines read, {} malformed, {} without usable definitions",
        stats.lines, stats.malformed, stats.empty_records
    );
    info!(
        "{} entries ({} base, {} inflected forms collected, {} added) in {} ms",
        dict.len(),
        stats.base_entries,
        stats.forms_collected,
        stats.form_entries,
        start.elapsed().as_millis()
    );

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create output dir {}", cli.out_dir.display()))?;

    let full_path = cli.out_dir.join(format!("{}-full.json", cli.prefix));
    artifacts::write_artifact(dict.entries(), dict.len(), &full_path)?;

    let bundled = artifacts::bundled(&dict);
    let bundled_path = cli.out_dir.join(format!("{}.json", cli.prefix));
    artifacts::write_artifact(&bundled, bundled.len(), &bundled_path)?;

    let phrases = artifacts::phrases(&dict);
    let phrases_path = cli.out_dir.join(format!("{}-phrases.json", cli.prefix));
    artifacts::write_artifact(&phrases, phrases.len(), &phrases_path)?;

    Ok(())
}

/// Log download progress at 5% steps, or every 64 MB when the server does
/// not announce a length.
fn download_progress() -> impl FnMut(Progress) {
    let mut last = 0u64;
    move |progress: Progress| match progress.total {
        Some(total) if total > 0 => {
            let pct = progress.downloaded * 100 / total;
            if pct >= last + 5 {
                last = pct;
                info!(
                    "downloaded {:.1} / {:.1} MB ({pct}%)",
                    mib(progress.downloaded),
                    mib(total)
                );
            }
        }
        _ => {
            if progress.downloaded >= last + 64 * 1024 * 1024 {
                last = progress.downloaded;
                info!("downloaded {:.1} MB", mib(progress.downloaded));
            }
        }
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
