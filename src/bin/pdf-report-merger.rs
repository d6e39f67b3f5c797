//! PDF Report Merger CLI tool
//!
//! Merges a main report with trial PDFs, adding a cover page before each
//! trial and a "Page k of N" footer on every page.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pdf_report_merger::layout::PaperSize;
use pdf_report_merger::pdf::inspect;
use pdf_report_merger::{plan_only, MergePipeline, MergeRequest, PlanEntry};

/// PDF Report Merger - Combine a report with trial PDFs
#[derive(Parser)]
#[command(name = "pdf-report-merger")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge a report with two trials
    pdf-report-merger merge report.pdf trial-a.pdf trial-b.pdf --title \"Field Trials 2024\"

    # Merge with every trial in a directory (sorted by name)
    pdf-report-merger merge report.pdf \"trials/*.pdf\" -o combined.pdf

    # Show where the cover pages will land
    pdf-report-merger plan report.pdf \"trials/*.pdf\"")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the main PDF and trial PDFs into one document
    Merge {
        /// Main report PDF (placed first)
        main: PathBuf,

        /// Trial PDFs in order. Supports glob patterns like "trials/*.pdf"
        trials: Vec<String>,

        /// Output PDF file path [default: <MAIN>_WithCovers.pdf]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report title shown in every footer
        #[arg(long, default_value = "")]
        title: String,

        /// Cover page size when the main PDF has no pages
        #[arg(long, value_enum, default_value_t = PageSizeArg::Letter)]
        page_size: PageSizeArg,

        /// Footer font size in points
        #[arg(long)]
        footer_font_size: Option<f32>,

        /// Cover label font size in points
        #[arg(long)]
        cover_font_size: Option<f32>,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show the page plan without writing anything
    Plan {
        /// Main report PDF
        main: PathBuf,

        /// Trial PDFs in order. Supports glob patterns
        trials: Vec<String>,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PageSizeArg {
    Letter,
    A4,
}

impl From<PageSizeArg> for PaperSize {
    fn from(arg: PageSizeArg) -> Self {
        match arg {
            PageSizeArg::Letter => PaperSize::Letter,
            PageSizeArg::A4 => PaperSize::A4,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    let result = match cli.command {
        Commands::Merge {
            main,
            trials,
            output,
            title,
            page_size,
            footer_font_size,
            cover_font_size,
            open,
        } => cmd_merge(MergeArgs {
            main,
            trials,
            output,
            title,
            page_size,
            footer_font_size,
            cover_font_size,
            open,
        }),
        Commands::Plan { main, trials } => cmd_plan(main, trials),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdf_report_merger={level}")));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Expand glob patterns in trial arguments
///
/// Matches of one pattern are sorted; the order of arguments is kept.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("Invalid pattern: {pattern}"))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => warn!(%pattern, error = %e, "glob error"),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

struct MergeArgs {
    main: PathBuf,
    trials: Vec<String>,
    output: Option<PathBuf>,
    title: String,
    page_size: PageSizeArg,
    footer_font_size: Option<f32>,
    cover_font_size: Option<f32>,
    open: bool,
}

fn cmd_merge(args: MergeArgs) -> Result<()> {
    let trials = expand_globs(args.trials)?;
    let output = args
        .output
        .unwrap_or_else(|| MergeRequest::default_output_for(&args.main));

    let mut request = MergeRequest::new(args.main, trials, args.title, output);
    request.cover_fallback = args.page_size.into();
    if let Some(size) = args.footer_font_size {
        if size <= 0.0 {
            bail!("Footer font size must be positive");
        }
        request.footer_style.font_size = size;
    }
    if let Some(size) = args.cover_font_size {
        if size <= 0.0 {
            bail!("Cover font size must be positive");
        }
        request.cover_style.font_size = size;
    }

    info!(trials = request.trials.len(), "merging PDFs");
    let summary = MergePipeline::new(request)
        .run()
        .context("Merge failed")?;

    eprintln!(
        "Merged {} pages to: {}",
        summary.total_pages,
        summary.output.display()
    );

    if args.open {
        open_file(&summary.output)?;
    }

    Ok(())
}

fn cmd_plan(main: PathBuf, trials: Vec<String>) -> Result<()> {
    let trials = expand_globs(trials)?;
    let output = MergeRequest::default_output_for(&main);
    let request = MergeRequest::new(main, trials, "", output);
    let plan = plan_only(&request)?;

    for (number, entry) in plan.numbered() {
        match entry {
            PlanEntry::Original { source, index } => {
                println!("{:>5}  {:?} page {}", number, source, index + 1);
            }
            PlanEntry::Cover { label, .. } => {
                println!("{:>5}  cover: {}", number, label);
            }
        }
    }
    println!("Total: {} pages", plan.total_pages());

    Ok(())
}

fn cmd_info(input: &Path) -> Result<()> {
    let info = inspect(input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", info.page_count);

    if let Some(size) = info.first_page_size {
        println!("Page size: {:.1} x {:.1} pt", size.width, size.height);
    }
    if let Some(title) = info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = info.author {
        println!("Author: {}", author);
    }

    Ok(())
}
