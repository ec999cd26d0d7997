//! docx-items CLI - flatten Word documents into content items
//!
//! A command-line tool for turning .docx files into an ordered JSON list of
//! text, image and MathML items.

use clap::{Parser, Subcommand};
use colored::*;
use docx_items::container::Archive;
use docx_items::{ContentItem, ConvertOptions, Converter, JsonFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Exit status for documents the converter rejects.
const EXIT_CLIENT_ERROR: i32 = 2;

/// Flatten Word documents into text, image and math items
#[derive(Parser)]
#[command(
    name = "docx-items",
    author = "iyulab",
    version,
    about = "Flatten Word documents into ordered content items",
    long_about = "docx-items - Word (.docx) to content item converter.\n\n\
                  Emits text runs, embedded images and MathML (converted from Office Math) \
                  in reading order as JSON."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to JSON content items
    Convert {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,

        /// Math stylesheet to use instead of the bundled one
        #[arg(long, conflicts_with = "no_math")]
        stylesheet: Option<PathBuf>,

        /// Drop math blocks instead of converting them
        #[arg(long)]
        no_math: bool,

        /// Write images into this directory instead of inlining data URIs
        #[arg(long)]
        assets_dir: Option<PathBuf>,

        /// Maximum input size in MiB
        #[arg(long, default_value = "25")]
        max_size: u64,

        /// Keep tab and line break items in the output
        #[arg(long)]
        keep_breaks: bool,
    },

    /// Show the package structure of a document
    Inspect {
        /// Input file path
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        let code = if e.is_client_error() { EXIT_CLIENT_ERROR } else { 1 };
        std::process::exit(code);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn run(cli: Cli) -> docx_items::Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            compact,
            stylesheet,
            no_math,
            assets_dir,
            max_size,
            keep_breaks,
        } => {
            let mut options = ConvertOptions::new().with_max_input_size(max_size.saturating_mul(1024 * 1024));
            if let Some(path) = stylesheet {
                options = options.with_stylesheet(path);
            }
            if no_math {
                options = options.without_math();
            }
            if let Some(dir) = assets_dir {
                options = options.with_asset_dir(dir);
            }
            if keep_breaks {
                options = options.with_layout_markers();
            }

            let pb = create_spinner("Converting document...");
            let converter = Converter::new(options);
            if !no_math && !converter.has_math() {
                pb.suspend(|| {
                    eprintln!(
                        "{} Math stylesheet unavailable, math blocks will be dropped",
                        "!".yellow().bold()
                    )
                });
            }

            let result = converter.convert_file(&input);
            pb.finish_and_clear();
            let items = result?;

            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let json = docx_items::to_json(&items, format)?;
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Converted {} ({}): {}",
                    "✓".green().bold(),
                    input.display(),
                    summarize(&items),
                    path.display()
                );
            }
        }

        Commands::Inspect { input, json } => {
            let pb = create_spinner("Analyzing document...");
            let archive = Archive::open(&input);
            pb.finish_and_clear();
            let info = docx_items::inspect(&archive?);

            if json {
                let text = serde_json::to_string_pretty(&info)?;
                write_output(None, &text)?;
                return Ok(());
            }

            println!("{}", "Document Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), info.format);
            match &info.document_part {
                Some(part) => println!("{}: {}", "Document part".bold(), part),
                None => println!("{}: {}", "Document part".bold(), "missing".red()),
            }
            println!("{}: {}", "Relationships".bold(), info.relationships);
            println!("{}: {}", "Entries".bold(), info.entries);
            println!("{}: {}", "Media".bold(), info.media.len());
            for name in &info.media {
                println!("  {}", name);
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn summarize(items: &[ContentItem]) -> String {
    let count = |kind: &str| items.iter().filter(|item| item.kind() == kind).count();
    format!(
        "{} text, {} images, {} math",
        count("text"),
        count("image"),
        count("math")
    )
}

fn print_version() {
    println!("{} {}", "docx-items".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Word documents to ordered text, image and MathML items");
    println!();
    println!("Supported formats: DOCX (legacy .doc is detected and rejected)");
    println!("Repository: https://github.com/iyulab/docx-items");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> io::Result<()> {
    match path {
        Some(p) => fs::write(p, content),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)
        }
    }
}
