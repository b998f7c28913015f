use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use piecemap_core::{
    ByteSpan, FileEntry, FileOffset, FilePieceMap, FilePriorities, FileSpan, FilesWanted,
    PieceLayout, Priority,
};
use serde::Serialize;
use size_format::SizeFormatterBinary as SF;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Parser)]
#[command(version, author, about)]
struct Opts {
    /// The loglevel
    #[arg(value_enum, short = 'v')]
    log_level: Option<LogLevel>,

    /// Piece size in bytes.
    #[arg(short = 'p', long = "piece-size", env = "PIECEMAP_PIECE_SIZE")]
    piece_size: u32,

    /// File sizes in bytes, in torrent order, comma separated, e.g. 100,0,250.
    #[arg(short = 's', long = "sizes", value_delimiter = ',', conflicts_with = "sizes_json")]
    file_sizes: Vec<u64>,

    /// Read file sizes from a JSON array stored in this file.
    #[arg(long = "sizes-json")]
    sizes_json: Option<PathBuf>,

    /// Set a file's priority, e.g. 2=high or 2=1. Can be repeated.
    #[arg(long = "priority", value_parser = parse_file_priority)]
    priorities: Vec<(usize, Priority)>,

    /// Mark a file as not wanted. Can be repeated.
    #[arg(long = "skip")]
    skip: Vec<usize>,

    #[command(subcommand)]
    subcommand: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    /// Print the layout and every file's byte and piece spans.
    Layout,
    /// Find the file containing a global byte offset.
    Locate { offset: u64 },
    /// Show the files overlapping a piece, its priority and whether it's wanted.
    Piece { index: u32 },
    /// Summarize what is selected for download.
    Wanted,
}

fn parse_file_priority(s: &str) -> anyhow::Result<(usize, Priority)> {
    let (file, priority) = s
        .split_once('=')
        .context("expected FILE=PRIORITY, e.g. 2=high")?;
    let file = file
        .trim()
        .parse()
        .with_context(|| format!("invalid file index {file:?}"))?;
    let priority = priority.trim().parse()?;
    Ok((file, priority))
}

fn init_logging(opts: &Opts) {
    let default_rust_log = match opts.log_level.as_ref() {
        Some(level) => match level {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        },
        None => "info",
    };
    let rust_log = std::env::var("RUST_LOG").ok();
    let stderr_filter = EnvFilter::builder()
        .parse(rust_log.as_deref().unwrap_or(default_rust_log))
        .or_else(|_| EnvFilter::builder().parse(default_rust_log))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(stderr_filter)
        .init();
}

fn read_sizes_json(path: &Path) -> anyhow::Result<Vec<u64>> {
    let buf =
        std::fs::read(path).with_context(|| format!("error reading {}", path.display()))?;
    serde_json::from_slice(&buf)
        .with_context(|| format!("error parsing {} as a JSON array of sizes", path.display()))
}

#[derive(Serialize)]
struct LayoutReport {
    total_size: u64,
    piece_size: u32,
    piece_count: u32,
    files: Vec<FileEntry>,
}

#[derive(Serialize)]
struct LocateReport {
    global_offset: u64,
    #[serde(flatten)]
    location: FileOffset,
}

#[derive(Serialize)]
struct PieceReport {
    piece: u32,
    /// None for indices past the last piece, e.g. the slot of a trailing empty file.
    bytes: Option<ByteSpan>,
    files: FileSpan,
    priority: Priority,
    wanted: bool,
}

#[derive(Serialize)]
struct WantedReport {
    wanted_files: usize,
    wanted_bytes: u64,
    wanted_pieces: Vec<usize>,
}

fn build_map(opts: &Opts) -> anyhow::Result<FilePieceMap> {
    let sizes = match &opts.sizes_json {
        Some(path) => read_sizes_json(path)?,
        None => opts.file_sizes.clone(),
    };
    let map = FilePieceMap::from_file_sizes(&sizes, opts.piece_size)
        .context("error building file/piece map")?;
    let layout: &PieceLayout = map.layout();
    info!(
        "{} files, total {}, {} pieces of {}",
        map.size(),
        SF::new(layout.total_size()),
        layout.piece_count(),
        SF::new(layout.piece_size() as u64),
    );
    Ok(map)
}

fn apply_selection<'a>(
    opts: &Opts,
    priorities: &mut FilePriorities<'a>,
    wanted: &mut FilesWanted<'a>,
) -> anyhow::Result<()> {
    let file_count = priorities.map().size();
    let check = |file: usize| -> anyhow::Result<()> {
        if file >= file_count {
            anyhow::bail!("file index {file} out of range, torrent has {file_count} files");
        }
        Ok(())
    };
    for (file, priority) in opts.priorities.iter().copied() {
        check(file)?;
        debug!(file, %priority, "setting priority");
        priorities.set(file, priority);
    }
    for file in opts.skip.iter().copied() {
        check(file)?;
    }
    wanted.set_many(opts.skip.iter().copied(), false);
    Ok(())
}

fn run(opts: &Opts) -> anyhow::Result<serde_json::Value> {
    let map = build_map(opts)?;
    let mut priorities = FilePriorities::new(&map);
    let mut wanted = FilesWanted::new(&map);
    apply_selection(opts, &mut priorities, &mut wanted)?;

    let value = match &opts.subcommand {
        SubCommand::Layout => {
            let layout = map.layout();
            serde_json::to_value(LayoutReport {
                total_size: layout.total_size(),
                piece_size: layout.piece_size(),
                piece_count: layout.piece_count(),
                files: map.iter().collect(),
            })?
        }
        SubCommand::Locate { offset } => {
            let location = map.checked_byte_offset(*offset).with_context(|| {
                format!(
                    "offset {offset} is out of range, total size is {}",
                    map.layout().total_size()
                )
            })?;
            serde_json::to_value(LocateReport {
                global_offset: *offset,
                location,
            })?
        }
        SubCommand::Piece { index } => serde_json::to_value(PieceReport {
            piece: *index,
            bytes: map.layout().piece_byte_span(*index),
            files: map.file_span(*index),
            priority: priorities.piece_priority(*index),
            wanted: wanted.piece_wanted(*index),
        })?,
        SubCommand::Wanted => serde_json::to_value(WantedReport {
            wanted_files: wanted.wanted_count(),
            wanted_bytes: wanted.wanted_bytes(),
            wanted_pieces: wanted.wanted_pieces().iter_ones().collect(),
        })?,
    };
    Ok(value)
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(&opts);

    let value = run(&opts)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
