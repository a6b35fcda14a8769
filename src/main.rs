use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sip::{
    container::archive_file_name,
    use_cases::{CorruptPolicy, CreateArchiveUseCase, ExtractArchiveUseCase, ListArchiveUseCase},
    Config, LogFormat,
};

const DEFAULT_ARCHIVE_NAME: &str = "archive";

/// Pack files and directories into a Huffman-compressed .sipped archive
#[derive(Parser, Debug)]
#[command(name = "sip", version)]
struct Cli {
    /// Extract ARCHIVE into DESTINATION (default: current directory)
    #[arg(short = 'x', long, conflicts_with = "list")]
    extract: bool,

    /// List the entries of ARCHIVE
    #[arg(short = 'l', long)]
    list: bool,

    /// Archive to create (".sipped" is appended if missing)
    #[arg(short = 'o', long, value_name = "ARCHIVE")]
    output: Option<PathBuf>,

    /// Files compressed concurrently (overrides SIP_WORKERS)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Keep extracting past entries whose payload does not decode
    #[arg(long, requires = "extract")]
    skip_corrupt: bool,

    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Inputs and optional archive name; with -x/-l the archive and destination
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    match cli.verbose {
        0 => {}
        1 => config.log_filter = "debug".to_string(),
        _ => config.log_filter = "trace".to_string(),
    }
    config.validate().map_err(anyhow::Error::msg)?;

    init_tracing(&config);

    if cli.extract {
        let (archive, destination) = resolve_archive_args(&cli.paths, "-x")?;
        let destination = destination.unwrap_or_else(|| PathBuf::from("."));
        let policy = if cli.skip_corrupt {
            CorruptPolicy::Skip
        } else {
            CorruptPolicy::Abort
        };

        let summary = ExtractArchiveUseCase::new(policy)
            .execute(&archive, &destination)
            .await
            .with_context(|| format!("failed to extract {}", archive.display()))?;

        println!(
            "Extracted {} files ({} bytes) into {}",
            summary.files_written,
            summary.bytes_written,
            destination.display()
        );
        for path in &summary.skipped {
            println!("skipped corrupt entry: {}", path);
        }
    } else if cli.list {
        let (archive, extra) = resolve_archive_args(&cli.paths, "-l")?;
        if let Some(extra) = extra {
            anyhow::bail!("unexpected argument {} for -l", extra.display());
        }

        let entries = ListArchiveUseCase::new()
            .execute(&archive)
            .await
            .with_context(|| format!("failed to list {}", archive.display()))?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            for entry in &entries {
                println!(
                    "{:>10} {:>8} {:>3} {:<7} {}",
                    entry.original_len,
                    entry.payload_len,
                    entry.map_entries,
                    entry.encoding.as_str(),
                    entry.path
                );
            }
        }
    } else {
        let (inputs, archive) =
            resolve_create_args(cli.paths, cli.output, |path| path.exists());

        info!("Configuration loaded and validated ({} workers)", config.workers);
        let summary = CreateArchiveUseCase::from_config(&config)
            .execute(&inputs, &archive)
            .await
            .with_context(|| format!("failed to create {}", archive.display()))?;

        println!(
            "Created {} with {} entries ({} -> {} bytes)",
            summary.archive_path.display(),
            summary.entries,
            summary.input_bytes,
            summary.archive_bytes
        );
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Split the positionals of a create invocation into inputs and archive path.
///
/// `-o` wins. Otherwise, with two or more positionals, a last one that does
/// not exist on disk names the archive.
fn resolve_create_args(
    mut paths: Vec<PathBuf>,
    output: Option<PathBuf>,
    exists: impl Fn(&Path) -> bool,
) -> (Vec<PathBuf>, PathBuf) {
    let name = match output {
        Some(name) => name,
        None if paths.len() >= 2 && paths.last().is_some_and(|p| !exists(p)) => {
            paths.pop().unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_NAME))
        }
        None => PathBuf::from(DEFAULT_ARCHIVE_NAME),
    };
    (paths, archive_file_name(&name))
}

/// `<archive> [second]` for the extract and list modes.
fn resolve_archive_args(
    paths: &[PathBuf],
    flag: &str,
) -> anyhow::Result<(PathBuf, Option<PathBuf>)> {
    match paths {
        [archive] => Ok((archive.clone(), None)),
        [archive, second] => Ok((archive.clone(), Some(second.clone()))),
        _ => anyhow::bail!("{flag} takes an archive and at most one more path"),
    }
}
