//! # CLI Module
//!
//! Command-line interface for the media library deduplicator.
//!
//! ## Usage
//! ```bash
//! # Scan a movie library (one folder per movie)
//! media-dedupe scan ~/Media/Movies
//!
//! # Episode libraries hold loose files instead of folders
//! media-dedupe scan ~/Media/TV --mode episodes
//!
//! # Fast name-only pass: no ffprobe, no fingerprinting
//! media-dedupe scan ~/Media/Movies --no-probe --no-hash
//!
//! # JSON output for scripting
//! media-dedupe scan ~/Media/Movies --output json
//!
//! # Explain how one release name is interpreted
//! media-dedupe inspect "Alien.1979.2160p.Remux.HEVC.TrueHD.Atmos.mkv"
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_dedupe::core::hasher;
use media_dedupe::core::naming::{identify, normalize};
use media_dedupe::core::pipeline::{Pipeline, ScanOutcome};
use media_dedupe::core::probe::{FfprobeProber, MediaProber};
use media_dedupe::core::quality::{score, AttributeSource};
use media_dedupe::core::scanner::ScanMode;
use media_dedupe::error::Result;
use media_dedupe::events::{AnalyzeEvent, Event, EventChannel, PipelineEvent, ScanEvent};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Media Dedupe - Find duplicate releases and keep the best copy
#[derive(Parser, Debug)]
#[command(name = "media-dedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a media library for duplicate entries
    Scan {
        /// Library root to scan
        root: PathBuf,

        /// Library layout to expect
        #[arg(short, long, default_value = "movies")]
        mode: Mode,

        /// Skip content fingerprinting (title matching only)
        #[arg(long)]
        no_hash: bool,

        /// Skip ffprobe entirely; derive quality from names alone
        #[arg(long)]
        no_probe: bool,

        /// Seconds to wait for ffprobe before falling back to the name
        #[arg(long, default_value = "15")]
        probe_timeout: u64,

        /// Worker threads for the analysis phase
        #[arg(short, long)]
        threads: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Include hidden entries
        #[arg(long)]
        include_hidden: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Explain how one name or file would be parsed and scored
    Inspect {
        /// Folder, file, or bare release name
        path: PathBuf,

        /// Probe the file with ffprobe instead of reading the name alone
        #[arg(long)]
        probe: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// One folder per title; the largest video inside is primary
    Movies,
    /// Loose episode files directly under the root
    Episodes,
}

impl From<Mode> for ScanMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Movies => ScanMode::Movies,
            Mode::Episodes => ScanMode::Episodes,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths of removable duplicates only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            root,
            mode,
            no_hash,
            no_probe,
            probe_timeout,
            threads,
            output,
            include_hidden,
            verbose,
        } => run_scan(
            root,
            mode.into(),
            no_hash,
            no_probe,
            probe_timeout,
            threads,
            output,
            include_hidden,
            verbose,
        ),
        Commands::Inspect { path, probe } => run_inspect(path, probe),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_scan(
    root: PathBuf,
    mode: ScanMode,
    no_hash: bool,
    no_probe: bool,
    probe_timeout: u64,
    threads: Option<usize>,
    output: OutputFormat,
    include_hidden: bool,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    // Print header
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Media Dedupe").bold().cyan(),
            style("v0.1.0").dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Build pipeline
    let mut builder = Pipeline::builder()
        .root(root)
        .mode(mode)
        .include_hidden(include_hidden)
        .hashing(!no_hash)
        .probing(!no_probe)
        .probe_timeout(Duration::from_secs(probe_timeout));

    if let Some(threads) = threads {
        builder = builder.threads(threads);
    }

    let pipeline = builder.build();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose_clone = verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message(format!("{}", phase));
                    }
                }
                Event::Scan(ScanEvent::Completed {
                    total_candidates, ..
                }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(total_candidates as u64);
                    }
                }
                Event::Analyze(AnalyzeEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.completed as u64);
                        if verbose_clone {
                            pb.set_message(
                                p.current_path
                                    .file_name()
                                    .unwrap_or_default()
                                    .to_string_lossy()
                                    .to_string(),
                            );
                        }
                    }
                }
                Event::Analyze(AnalyzeEvent::ProbeFallback { path, reason }) => {
                    if verbose_clone {
                        if let Some(ref pb) = progress_clone {
                            pb.println(format!(
                                "  probe fallback: {} ({reason})",
                                path.display()
                            ));
                        }
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let outcome = result?;

    // Output results
    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &outcome, verbose),
        OutputFormat::Json => print_json_results(&outcome),
        OutputFormat::Minimal => print_minimal_results(&outcome),
    }

    Ok(())
}

fn run_inspect(path: PathBuf, probe: bool) -> Result<()> {
    let term = Term::stdout();

    let raw_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    term.write_line(&format!("{} {}", style("Name:").bold(), raw_name))
        .ok();

    let parsed = normalize(&raw_name);
    term.write_line(&format!("{} {}", style("Title key:").bold(), parsed.key()))
        .ok();
    if let Some(year) = &parsed.year {
        term.write_line(&format!("{} {}", style("Year:").bold(), year))
            .ok();
    }

    let episode = identify(&raw_name);
    if episode.is_episode() {
        let numbers = episode
            .episodes
            .iter()
            .map(|e| format!("E{e:02}"))
            .collect::<Vec<_>>()
            .join("");
        term.write_line(&format!(
            "{} S{:02}{}",
            style("Episode:").bold(),
            episode.season.unwrap_or(0),
            numbers
        ))
        .ok();
        if let Some(show) = &episode.show_title {
            term.write_line(&format!("{} {}", style("Show:").bold(), show))
                .ok();
        }
        if let Some(title) = &episode.episode_title {
            term.write_line(&format!("{} {}", style("Episode title:").bold(), title))
                .ok();
        }
    }

    let attributes = if probe {
        let prober = FfprobeProber::new();
        match prober.probe(&path) {
            Ok(attrs) => AttributeSource::Probed(attrs),
            Err(e) => {
                term.write_line(&format!("{} {e}", style("Probe failed:").yellow()))
                    .ok();
                AttributeSource::FilenameDerived
            }
        }
    } else {
        AttributeSource::FilenameDerived
    };

    let quality = score(&raw_name, attributes);
    term.write_line("").ok();
    term.write_line(&format!(
        "{} {} ({})",
        style("Quality score:").bold(),
        style(quality.score).cyan(),
        quality.data_source
    ))
    .ok();
    for line in &quality.rationale {
        term.write_line(&format!("  {} {line}", style("+").dim())).ok();
    }
    if quality.rationale.is_empty() {
        term.write_line(&format!(
            "  {}",
            style("no recognizable quality markers").dim()
        ))
        .ok();
    }

    if path.is_file() {
        term.write_line("").ok();
        match hasher::fingerprint(&path) {
            Ok(hash) => {
                term.write_line(&format!("{} {hash}", style("Fingerprint:").bold()))
                    .ok();
            }
            Err(e) => {
                term.write_line(&format!("{} {e}", style("Fingerprint failed:").yellow()))
                    .ok();
            }
        }
    }

    Ok(())
}

fn print_pretty_results(term: &Term, outcome: &ScanOutcome, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} entries analyzed in {:.1}s",
        style(outcome.entries.len()).cyan(),
        outcome.duration.as_secs_f64()
    ))
    .ok();

    if !outcome.skipped.is_empty() {
        term.write_line(&format!(
            "  {} entries skipped",
            style(outcome.skipped.len()).yellow()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} duplicate groups found",
        style(outcome.groups.len()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} duplicate entries",
        style(outcome.duplicate_count()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} reclaimable space",
        style(format_bytes(outcome.reclaimable_bytes())).yellow()
    ))
    .ok();

    if outcome.stats.probe_fallbacks > 0 {
        term.write_line(&format!(
            "  {} scored from names only",
            style(outcome.stats.probe_fallbacks).dim()
        ))
        .ok();
    }

    term.write_line("").ok();

    // Show groups
    if outcome.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
    } else {
        term.write_line(&format!(
            "{}",
            style("Duplicate Groups:").bold().underlined()
        ))
        .ok();
        term.write_line("").ok();

        for (i, group) in outcome.groups.iter().enumerate() {
            let tags = group
                .match_types
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" + ");

            term.write_line(&format!(
                "  {} {} ({} entries, {} reclaimable)",
                style(format!("Group {}:", i + 1)).bold(),
                style(tags).yellow(),
                group.members.len(),
                format_bytes(group.reclaimable_bytes)
            ))
            .ok();

            for (rank, member) in group.members.iter().enumerate() {
                let marker = if rank == 0 {
                    style("★").green().to_string()
                } else {
                    style("○").dim().to_string()
                };

                term.write_line(&format!(
                    "    {} {} {}",
                    marker,
                    display_path(&member.path),
                    style(format!(
                        "[{} pts, {}, {}, {}]",
                        member.quality.score,
                        member.quality.resolution,
                        member.quality.source,
                        format_bytes(member.file_size_bytes)
                    ))
                    .dim()
                ))
                .ok();

                if verbose && !member.quality.rationale.is_empty() {
                    term.write_line(&format!(
                        "       {}",
                        style(member.quality.rationale.join(" | ")).dim()
                    ))
                    .ok();
                }
            }

            if verbose && group.members.len() > 1 {
                term.write_line(&format!(
                    "    {} {}",
                    style("Recommended:").dim(),
                    style("Keep the starred (★) entry").dim()
                ))
                .ok();
            }

            term.write_line("").ok();
        }
    }

    // Footer
    term.write_line(&format!(
        "{}",
        style("No files were modified. Review each group before deleting anything.").dim()
    ))
    .ok();
}

fn print_json_results(outcome: &ScanOutcome) {
    let output = serde_json::json!({
        "completed_at": outcome.completed_at.to_rfc3339(),
        "total_entries": outcome.entries.len(),
        "skipped": outcome.skipped.len(),
        "duplicate_groups": outcome.groups.len(),
        "duplicate_count": outcome.duplicate_count(),
        "reclaimable_bytes": outcome.reclaimable_bytes(),
        "duration_ms": outcome.duration.as_millis() as u64,
        "stats": &outcome.stats,
        "groups": outcome.groups.iter().map(|g| {
            serde_json::json!({
                "id": g.id.to_string(),
                "match_types": g.match_types.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
                "reclaimable_bytes": g.reclaimable_bytes,
                "members": g.members.iter().map(|m| {
                    serde_json::json!({
                        "path": m.path,
                        "raw_name": m.raw_name,
                        "title_key": m.title_key(),
                        "size_bytes": m.file_size_bytes,
                        "score": m.quality.score,
                        "resolution": m.quality.resolution,
                        "source": m.quality.source,
                        "data_source": m.quality.data_source.to_string(),
                        "match_types": m.match_types.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
                    })
                }).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>()
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn print_minimal_results(outcome: &ScanOutcome) {
    for group in &outcome.groups {
        // Members are ranked best-first; everything after the keep is removable
        for member in group.members.iter().skip(1) {
            println!("{}", member.path.display());
        }
    }
}

/// Shorten paths under the home directory to `~/...` for display.
fn display_path(path: &Path) -> String {
    let home = dirs::home_dir().unwrap_or_default();
    if !home.as_os_str().is_empty() && path.starts_with(&home) {
        format!("~/{}", path.strip_prefix(&home).unwrap_or(path).display())
    } else {
        path.display().to_string()
    }
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
