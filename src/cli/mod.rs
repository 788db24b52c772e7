//! # CLI Module
//!
//! Command-line interface for the duplicate file engine.
//!
//! ## Usage
//! ```bash
//! # Move duplicate songs aside
//! doppelfiles scan ~/Music --category audio --dest ~/Music-dups
//!
//! # Preview what would happen to photos
//! doppelfiles scan ~/Photos --category image --dest ~/dups --dry-run
//!
//! # Stricter photo matching with two algorithms
//! doppelfiles scan ~/Photos -c image -d ~/dups --algorithms average,perceptual --threshold 4
//!
//! # Put everything back
//! doppelfiles undo
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use doppelfiles::core::engine::{Engine, ScanOutcome};
use doppelfiles::core::fingerprint::{HashAlgorithmKind, VideoHashMode};
use doppelfiles::core::grouper::SimilarityThresholds;
use doppelfiles::core::oplog::default_log_dir;
use doppelfiles::core::quality::{MoveTarget, RelocationPlan};
use doppelfiles::core::relocation::RelocationReport;
use doppelfiles::core::scanner::MediaCategory;
use doppelfiles::core::undo::UndoOutcome;
use doppelfiles::error::Result;
use doppelfiles::events::{
    EngineEvent, Event, EventChannel, FingerprintEvent, RelocateEvent, ScanEvent,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;

/// doppelfiles - Move duplicate files aside, reversibly
#[derive(Parser, Debug)]
#[command(name = "doppelfiles")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find duplicates under a directory and move the extra copies aside
    Scan {
        /// Directory to scan
        root: PathBuf,

        /// Kind of files to look at
        #[arg(short, long)]
        category: Category,

        /// Folder that receives the duplicates
        #[arg(short, long)]
        dest: PathBuf,

        /// Report the groups and planned moves without moving anything
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Image hash algorithms; every one must match
        #[arg(short, long, value_delimiter = ',', default_value = "average")]
        algorithms: Vec<Algorithm>,

        /// How video frames are combined into one signature
        #[arg(long, default_value = "aggregate")]
        video_mode: VideoMode,

        /// Maximum Hamming distance for a perceptual match (0-64)
        #[arg(short, long)]
        threshold: Option<u32>,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Directory holding the operation and error logs
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Move every file from the last run back to where it was
    Undo {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Directory holding the operation and error logs
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Category {
    Audio,
    Image,
    Video,
    Document,
    Other,
}

impl Category {
    /// Extensions scanned for this category
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Category::Audio => &["mp3", "m4a", "wav", "flac", "aac", "ogg"],
            Category::Image => &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"],
            Category::Video => &["mp4", "avi", "mov", "mkv", "flv", "wmv", "webm"],
            Category::Document => &[
                "txt", "doc", "docx", "xls", "xlsx", "xlsm", "ppt", "pptx", "ppsx", "odt", "ods",
                "odp", "pdf", "epub", "mobi",
            ],
            Category::Other => &["zip", "rar", "7z", "tar", "gz", "iso", "ttf", "otf"],
        }
    }
}

impl From<Category> for MediaCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Audio => MediaCategory::Audio,
            Category::Image => MediaCategory::Image,
            Category::Video => MediaCategory::Video,
            Category::Document => MediaCategory::Document,
            Category::Other => MediaCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Average Hash - Fast, good for exact duplicates (default)
    Average,
    /// Difference Hash - Tracks gradients, tolerant of brightness changes
    Difference,
    /// Perceptual Hash - Most robust to edits
    Perceptual,
}

impl From<Algorithm> for HashAlgorithmKind {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Average => HashAlgorithmKind::Average,
            Algorithm::Difference => HashAlgorithmKind::Difference,
            Algorithm::Perceptual => HashAlgorithmKind::Perceptual,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VideoMode {
    /// Average of sampled frame hashes; identical encodes only (default)
    Aggregate,
    /// Most common sampled frame code; tolerates re-encodes
    MajorityVote,
}

impl From<VideoMode> for VideoHashMode {
    fn from(mode: VideoMode) -> Self {
        match mode {
            VideoMode::Aggregate => VideoHashMode::Aggregate,
            VideoMode::MajorityVote => VideoHashMode::MajorityVote,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Options for one scan run
struct ScanArgs {
    root: PathBuf,
    category: Category,
    dest: PathBuf,
    dry_run: bool,
    output: OutputFormat,
    algorithms: Vec<Algorithm>,
    video_mode: VideoMode,
    threshold: Option<u32>,
    include_hidden: bool,
    log_dir: Option<PathBuf>,
    verbose: bool,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    doppelfiles::init_tracing(if cli.verbose {
        "doppelfiles=debug"
    } else {
        "doppelfiles=warn"
    });

    match cli.command {
        Commands::Scan {
            root,
            category,
            dest,
            dry_run,
            output,
            algorithms,
            video_mode,
            threshold,
            include_hidden,
            log_dir,
        } => run_scan(ScanArgs {
            root,
            category,
            dest,
            dry_run,
            output,
            algorithms,
            video_mode,
            threshold,
            include_hidden,
            log_dir,
            verbose: cli.verbose,
        }),
        Commands::Undo { yes, log_dir } => run_undo(yes, log_dir),
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("doppelfiles").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let mut builder = Engine::builder()
        .log_dir(args.log_dir.unwrap_or_else(default_log_dir))
        .include_hidden(args.include_hidden)
        .exclude_dir(&args.dest)
        .algorithms(args.algorithms.iter().copied().map(HashAlgorithmKind::from))
        .video_mode(args.video_mode.into());

    if let Some(threshold) = args.threshold {
        builder = builder.thresholds(SimilarityThresholds::uniform(threshold));
    }

    let engine = builder.build()?;

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    let progress = pretty.then(|| {
        let pb = ProgressBar::new(0);
        let bar_style = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(bar_style);
        pb
    });

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Engine(EngineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Completed { total_files }) => {
                    pb.set_length(total_files as u64);
                }
                Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Fingerprint(FingerprintEvent::Failed { path, message }) if verbose => {
                    pb.println(format!("  {} {}: {}", style("!").yellow(), path.display(), message));
                }
                Event::Relocate(RelocateEvent::Started { total_moves }) => {
                    pb.set_position(0);
                    pb.set_length(total_moves as u64);
                }
                Event::Relocate(RelocateEvent::Moved { .. })
                | Event::Relocate(RelocateEvent::Quarantined { .. }) => pb.inc(1),
                Event::Relocate(RelocateEvent::Failed { path, message }) => {
                    pb.println(format!("  {} {}: {}", style("✗").red(), path.display(), message));
                }
                _ => {}
            }
        }
    });

    let category = MediaCategory::from(args.category);
    let result = run_engine(&engine, &args.root, category, args.category, &args.dest, args.dry_run, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let (outcome, report) = result?;
    let plans = engine.plan(&outcome.groups);

    match args.output {
        OutputFormat::Pretty => {
            print_pretty_results(&term, &outcome, &plans, report.as_ref(), &args.dest);
            term.write_line(&format!(
                "  {} {}",
                style("Logs:").dim(),
                style(engine.config().logs.dir.display()).dim()
            ))
            .ok();
        }
        OutputFormat::Json => print_json_results(&outcome, &plans, report.as_ref()),
    }

    Ok(())
}

/// Scan, then quarantine and resolve unless this is a dry run
fn run_engine(
    engine: &Engine,
    root: &Path,
    category: MediaCategory,
    extensions: Category,
    dest: &Path,
    dry_run: bool,
    sender: &doppelfiles::events::EventSender,
) -> Result<(ScanOutcome, Option<RelocationReport>)> {
    let outcome = engine.scan_and_group_with_events(root, category, extensions.extensions(), sender)?;
    if dry_run {
        return Ok((outcome, None));
    }

    let mut report = engine.quarantine_failures_with_events(&outcome.failures, dest, sender)?;
    report.merge(engine.resolve_with_events(&outcome.groups, dest, sender)?);
    Ok((outcome, Some(report)))
}

fn run_undo(yes: bool, log_dir: Option<PathBuf>) -> Result<()> {
    let term = Term::stderr();
    let engine = Engine::builder()
        .log_dir(log_dir.unwrap_or_else(default_log_dir))
        .build()?;

    let outcome = engine.undo(|count| {
        if yes {
            return true;
        }
        term.write_str(&format!(
            "Move {} file(s) back to their original location? [y/N] ",
            style(count).cyan()
        ))
        .ok();
        term.read_line()
            .map(|answer| matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    })?;

    match outcome {
        UndoOutcome::NothingToUndo => {
            term.write_line("No previous operations to undo.").ok();
        }
        UndoOutcome::Cancelled => {
            term.write_line("Undo cancelled.").ok();
        }
        UndoOutcome::Completed(report) => {
            term.write_line(&format!(
                "{} Restored {} file(s)",
                style("✓").green().bold(),
                style(report.restored.len()).cyan()
            ))
            .ok();
            for failure in &report.failures {
                term.write_line(&format!("  {} {}", style("✗").red(), failure)).ok();
            }
            if report.retained > 0 {
                term.write_line(&format!(
                    "{} {} entr(ies) kept in the operation log for another undo",
                    style("!").yellow().bold(),
                    report.retained
                ))
                .ok();
            }
        }
    }

    Ok(())
}

fn print_pretty_results(
    term: &Term,
    outcome: &ScanOutcome,
    plans: &[RelocationPlan],
    report: Option<&RelocationReport>,
    dest: &Path,
) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} files scanned in {:.1}s",
        style(outcome.total_files).cyan(),
        outcome.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups found",
        style(outcome.groups.len()).cyan()
    ))
    .ok();

    let duplicate_count: usize = outcome.groups.iter().map(|g| g.duplicate_count()).sum();
    term.write_line(&format!(
        "  {} duplicate files",
        style(duplicate_count).cyan()
    ))
    .ok();

    if !outcome.failures.is_empty() {
        term.write_line(&format!(
            "  {} files could not be read",
            style(outcome.failures.len()).yellow()
        ))
        .ok();
    }

    term.write_line("").ok();

    if plans.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
    } else {
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, (group, plan)) in outcome.groups.iter().zip(plans).enumerate() {
            term.write_line(&format!(
                "  {} {} ({} files, {})",
                style(format!("Group {}:", i + 1)).bold(),
                style(group.match_type.to_string()).yellow(),
                group.members.len(),
                format_bytes(group.total_size())
            ))
            .ok();

            term.write_line(&format!(
                "    {} {}",
                style("★").green(),
                display_path(&plan.keep.path)
            ))
            .ok();
            for planned in &plan.moves {
                let marker = match planned.target {
                    MoveTarget::Duplicates => style("○").dim().to_string(),
                    MoveTarget::Thumbnails => style("◌").dim().to_string(),
                };
                term.write_line(&format!("    {} {}", marker, display_path(&planned.record.path)))
                    .ok();
            }
            term.write_line("").ok();
        }
    }

    match report {
        None => {
            term.write_line(&format!(
                "{}",
                style("Dry run: no files were moved.").dim()
            ))
            .ok();
        }
        Some(report) => {
            term.write_line(&format!(
                "  {} moved to {}",
                style(report.relocated.len()).cyan(),
                display_path(dest)
            ))
            .ok();
            if !report.quarantined.is_empty() {
                term.write_line(&format!(
                    "  {} quarantined",
                    style(report.quarantined.len()).yellow()
                ))
                .ok();
            }
            if !report.errors.is_empty() {
                term.write_line(&format!(
                    "  {} errors, see the error log",
                    style(report.errors.len()).red()
                ))
                .ok();
            }
            term.write_line(&format!(
                "{}",
                style("Run `doppelfiles undo` to put everything back.").dim()
            ))
            .ok();
        }
    }
}

fn print_json_results(
    outcome: &ScanOutcome,
    plans: &[RelocationPlan],
    report: Option<&RelocationReport>,
) {
    let output = serde_json::json!({
        "total_files": outcome.total_files,
        "duplicate_groups": outcome.groups.len(),
        "duplicate_count": outcome.groups.iter().map(|g| g.duplicate_count()).sum::<usize>(),
        "duration_ms": outcome.duration_ms,
        "dry_run": report.is_none(),
        "groups": outcome.groups.iter().zip(plans).map(|(g, plan)| {
            serde_json::json!({
                "id": g.id.to_string(),
                "match_type": g.match_type.to_string(),
                "max_distance": g.max_distance,
                "files": g.paths(),
                "keep": plan.keep.path,
                "moves": plan.moves,
            })
        }).collect::<Vec<_>>(),
        "failures": outcome.failures,
        "scan_errors": outcome.scan_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "report": report,
    });

    println!("{:#}", output);
}

fn display_path(path: &Path) -> String {
    dirs::home_dir()
        .and_then(|home| path.strip_prefix(home).ok().map(|rel| format!("~/{}", rel.display())))
        .unwrap_or_else(|| path.display().to_string())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_scan() {
        let cli = Cli::try_parse_from([
            "doppelfiles",
            "scan",
            "/photos",
            "--category",
            "image",
            "--dest",
            "/dups",
            "--algorithms",
            "average,perceptual",
            "--threshold",
            "4",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Scan {
                algorithms,
                threshold,
                dry_run,
                ..
            } => {
                assert_eq!(algorithms.len(), 2);
                assert_eq!(threshold, Some(4));
                assert!(dry_run);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn scan_requires_destination() {
        assert!(Cli::try_parse_from(["doppelfiles", "scan", "/x", "-c", "audio"]).is_err());
    }

    #[test]
    fn category_extensions_are_lowercase_without_dot() {
        for category in [
            Category::Audio,
            Category::Image,
            Category::Video,
            Category::Document,
            Category::Other,
        ] {
            for ext in category.extensions() {
                assert_eq!(*ext, ext.to_lowercase());
                assert!(!ext.starts_with('.'));
            }
        }
    }

    #[test]
    fn other_category_covers_archives_disk_images_and_fonts() {
        let other = Category::Other.extensions();
        for ext in ["zip", "rar", "7z", "tar", "gz", "iso", "ttf", "otf"] {
            assert!(other.contains(&ext), "missing {}", ext);
        }
        assert_eq!(other.len(), 8);
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
