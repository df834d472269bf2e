//! txtconv CLI - text file encoding detector and converter

use anyhow::Result;
use clap::Parser;
use console::Style;
use std::fmt::Display;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use txtconv::batch;
use txtconv::{
    ColumnWidths, Conversion, Converter, Detection, Outcome, TargetFormat, Totals, TxtconvError,
    list_files,
};

/// Text file encoding detector and converter.
///
/// Detects the encoding of text files and converts them, trying the Central
/// European code pages windows-1250 and ISO-8859-2 before trusting a
/// non-Unicode guess.
#[derive(Parser, Debug)]
#[command(name = "txtconv")]
#[command(version, about, long_about = None)]
#[command(after_help = "Supported formats: UTF8 | UTF8WBOM | UTF8BOM | ANSI | ISO8859_2 | UTF16LE | UTF16BE\n\n\
    With only -i, the detected encoding is shown. With -i and --format but no -o,\n\
    the output is named FILE_FORMAT.ext.")]
struct Args {
    /// Input file to analyze or convert
    #[arg(short = 'i', long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file after conversion
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Target format (case-insensitive)
    #[arg(long, value_name = "FORMAT")]
    format: Option<TargetFormat>,

    /// Convert all files with the given extension
    #[arg(long, value_name = "EXT")]
    all: Option<String>,

    /// Suffix for converted file names (default: target format)
    #[arg(long, value_name = "NAME")]
    suffix: Option<String>,

    /// Source directory
    #[arg(short = 'd', long, default_value = ".")]
    dir: PathBuf,

    /// Search subdirectories recursively
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Show the encoding of all files with the given extension
    #[arg(long, value_name = "EXT")]
    show: Option<String>,

    /// Show file size, date and totals (with --show)
    #[arg(long, requires = "show")]
    stat: bool,

    /// Align columns (with --show)
    #[arg(long, requires = "show")]
    rem: bool,

    /// Enable colorized output
    #[arg(long)]
    color: bool,

    /// Overwrite existing output files without asking
    #[arg(long)]
    overwrite: bool,

    /// Log every decode attempt to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Terminal styling, enabled only when requested and stdout is a terminal.
#[derive(Debug, Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    fn new(requested: bool) -> Self {
        Self {
            enabled: requested && io::stdout().is_terminal(),
        }
    }

    fn paint(&self, style: Style, text: impl Display) -> String {
        if self.enabled {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn blue(&self, text: impl Display) -> String {
        self.paint(Style::new().blue(), text)
    }

    fn green(&self, text: impl Display) -> String {
        self.paint(Style::new().green(), text)
    }

    fn yellow(&self, text: impl Display) -> String {
        self.paint(Style::new().yellow(), text)
    }

    fn red(&self, text: impl Display) -> String {
        self.paint(Style::new().red(), text)
    }

    fn cyan(&self, text: impl Display) -> String {
        self.paint(Style::new().cyan(), text)
    }

    fn magenta(&self, text: impl Display) -> String {
        self.paint(Style::new().magenta(), text)
    }

    fn dim(&self, text: impl Display) -> String {
        self.paint(Style::new().dim(), text)
    }
}

fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "txtconv=debug" } else { "warn" }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let palette = Palette::new(args.color);
    let converter = Converter::new();

    match run(&args, &converter, palette) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", palette.red("ERROR:"));
            ExitCode::FAILURE
        }
    }
}

/// Dispatch on the requested action. Returns `false` if any file failed.
fn run(args: &Args, converter: &Converter, palette: Palette) -> Result<bool> {
    if let Some(ext) = &args.show {
        show_files(args, converter, ext, palette);
        return Ok(true);
    }

    if let Some(ext) = &args.all {
        let Some(target) = args.format else {
            println!(
                "{} Using --all requires specifying --format.",
                palette.red("ERROR:")
            );
            return Ok(false);
        };
        return convert_all(args, converter, ext, target, palette);
    }

    let Some(input) = &args.input else {
        println!(
            "{} No action specified. Use -i, --all, or --show. Use -h for help.",
            palette.red("ERROR:")
        );
        return Ok(false);
    };

    match (&args.output, args.format) {
        (Some(output), Some(target)) => Ok(convert_one(converter, input, output, target, palette)),
        (None, Some(target)) => {
            let output = batch::output_path(input, target.name());
            if output.exists() && !args.overwrite {
                let question = format!(
                    "Output file '{}' already exists. Overwrite?",
                    output.display()
                );
                if !confirm(&question)? {
                    println!("{}", palette.yellow("Aborted by user. File not overwritten."));
                    return Ok(true);
                }
            }
            Ok(convert_one(converter, input, &output, target, palette))
        }
        (None, None) => match converter.detect_path(input) {
            Ok(detection) => {
                println!(
                    "{} File '{}' detected encoding: {} (confidence {:.1}%)",
                    palette.blue("[INFO]"),
                    palette.cyan(input.display()),
                    palette.yellow(detection.label()),
                    detection.confidence() * 100.0
                );
                Ok(true)
            }
            Err(e) => {
                println!("{}", palette.red(format!("Error: {e}")));
                Ok(false)
            }
        },
        (Some(_), None) => {
            println!(
                "{} For single file conversion, you must specify -i, -o, and --format.",
                palette.red("ERROR:")
            );
            Ok(false)
        }
    }
}

/// Ask a yes/no question on stdin. Anything but `y` (including EOF) is no.
fn confirm(question: &str) -> io::Result<bool> {
    print!("{question} [y/N]: ");
    io::stdout().flush()?;
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn print_detection(detection: &Detection, palette: Palette) {
    println!(
        "{} Detected: {} (confidence {:.1}%)",
        palette.blue("[INFO]"),
        palette.yellow(detection.label()),
        detection.confidence() * 100.0
    );
}

fn print_decoding(conversion: &Conversion, palette: Palette) {
    let name = conversion.decoded_with.name();
    if conversion.used_fallback() {
        println!(
            "{} Used fallback '{name}' for successful decoding.",
            palette.yellow("[INFO]")
        );
    } else if conversion.detection.is_unicode() {
        println!(
            "{} Successfully decoded using detected Unicode format: '{name}'.",
            palette.blue("[INFO]")
        );
    } else {
        println!("{} Successfully decoded using '{name}'.", palette.blue("[INFO]"));
    }
}

/// Convert one file and report the outcome. Returns `true` on success.
fn convert_one(
    converter: &Converter,
    input: &Path,
    output: &Path,
    target: TargetFormat,
    palette: Palette,
) -> bool {
    match converter.convert_file(input, output, target) {
        Ok(Outcome::EmptyInput) => {
            println!(
                "{} Created empty file {} ({target})",
                palette.green("[OK]"),
                palette.cyan(output.display())
            );
            true
        }
        Ok(Outcome::Written(conversion)) => {
            print_detection(&conversion.detection, palette);
            print_decoding(&conversion, palette);
            println!(
                "{} Saved as {} ({target})",
                palette.green("[OK]"),
                palette.cyan(output.display())
            );
            true
        }
        Err(TxtconvError::AllDecodeAttemptsFailed { detection, .. }) => {
            print_detection(&detection, palette);
            println!(
                "{}",
                palette.red(
                    "ERROR: All decoding attempts failed. Could not correctly read the source file. Conversion aborted."
                )
            );
            false
        }
        Err(e) => {
            if let TxtconvError::EncodeFailed {
                detection,
                decoded_with,
                ..
            } = &e
            {
                print_detection(detection, palette);
                println!("{} Decoded using '{decoded_with}'.", palette.blue("[INFO]"));
            }
            println!("{}", palette.red(format!("Error: {e}")));
            false
        }
    }
}

fn convert_all(
    args: &Args,
    converter: &Converter,
    ext: &str,
    target: TargetFormat,
    palette: Palette,
) -> Result<bool> {
    let ext = batch::normalize_extension(ext);
    let suffix = args.suffix.as_deref().unwrap_or(target.name());

    let files = batch::collect_files(&args.dir, ext, args.recursive);
    if files.is_empty() {
        println!(
            "No files found with extension .{ext} in {}",
            absolute(&args.dir).display()
        );
        return Ok(true);
    }

    let plan = batch::plan_batch(files, suffix);
    let existing = batch::conflicts(&plan);
    if !existing.is_empty() && !args.overwrite {
        println!(
            "{} The following {} output file(s) already exist:",
            palette.red("ERROR:"),
            existing.len()
        );
        for path in &existing {
            println!("  - {}", path.display());
        }
        if !confirm("Overwrite all conflicting files and continue batch processing?")? {
            println!(
                "{}",
                palette.yellow("Aborted by user. No files were converted.")
            );
            return Ok(true);
        }
    }

    println!(
        "Processing {} file(s) with extension {} in {}",
        palette.yellow(plan.len()),
        palette.magenta(format!(".{ext}")),
        palette.cyan(absolute(&args.dir).display())
    );

    let mut all_ok = true;
    for job in &plan {
        all_ok &= convert_one(converter, &job.input, &job.output, target, palette);
    }
    println!("Batch conversion complete.");
    Ok(all_ok)
}

fn padding(width: usize, text: &str) -> String {
    " ".repeat(width.saturating_sub(text.chars().count()))
}

fn show_files(args: &Args, converter: &Converter, ext: &str, palette: Palette) {
    let ext = batch::normalize_extension(ext);
    let files = batch::collect_files(&args.dir, ext, args.recursive);
    if files.is_empty() {
        println!(
            "No files found with extension .{ext} in {}",
            absolute(&args.dir).display()
        );
        return;
    }

    let mut grand_total = Totals::default();
    for listing in list_files(converter, files, args.stat) {
        if args.recursive || listing.dir != args.dir {
            println!(
                "\n{}{}",
                palette.green("Directory: "),
                palette.cyan(absolute(&listing.dir).display())
            );
        }

        let widths = if args.rem {
            listing.widths()
        } else {
            ColumnWidths::default()
        };

        for file in &listing.files {
            let name = file.name();
            let encoding = file.encoding_column();
            let mut line = format!(
                "  -> {}{} | {}{}",
                palette.cyan(&name),
                padding(widths.name, &name),
                palette.yellow(&encoding),
                padding(widths.encoding, &encoding)
            );
            if args.stat {
                match (file.size_column(), file.date_column()) {
                    (Some(size), Some(date)) => line.push_str(&format!(
                        " | {}{} | {}",
                        padding(widths.size, &size),
                        palette.magenta(&size),
                        palette.dim(date)
                    )),
                    _ => line.push_str(&format!(" | {}", palette.red("Stats not accessible"))),
                }
            }
            println!("{line}");
        }

        let totals = listing.totals();
        if args.stat && totals.files > 0 {
            println!(
                "{}",
                palette.yellow(format!(
                    "--- Subtotal: {} file(s), Total size: {} ---",
                    totals.files,
                    txtconv::format_size(totals.size)
                ))
            );
        }
        grand_total.add(totals);
    }

    if args.stat && grand_total.files > 0 {
        let rule = "=".repeat(67);
        println!("\n{}", palette.blue(&rule));
        println!(
            "{}",
            palette.green(format!(
                "Grand Total: {} file(s), Total cumulative size: {}",
                grand_total.files,
                txtconv::format_size(grand_total.size)
            ))
        );
        println!("{}", palette.blue(&rule));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_invalid_format_rejected_by_parser() {
        let err = Args::try_parse_from(["txtconv", "-i", "a.txt", "--format", "utf32"]).unwrap_err();
        assert!(err.to_string().contains("Invalid format"));
    }

    #[test]
    fn test_format_parsed_case_insensitively() {
        let args = Args::try_parse_from(["txtconv", "--all", "txt", "--format", "utf8bom"]).unwrap();
        assert_eq!(args.format, Some(TargetFormat::Utf8Bom));
        assert_eq!(args.dir, PathBuf::from("."));
    }

    #[test]
    fn test_stat_requires_show() {
        assert!(Args::try_parse_from(["txtconv", "--stat"]).is_err());
        assert!(Args::try_parse_from(["txtconv", "--show", "txt", "--stat", "--rem"]).is_ok());
    }

    #[test]
    fn test_palette_disabled_is_plain() {
        let palette = Palette { enabled: false };
        assert_eq!(palette.red("x"), "x");
    }

    #[test]
    fn test_default_log_filter_shows_warnings() {
        assert_eq!(default_log_filter(false), "warn");
        assert_eq!(default_log_filter(true), "txtconv=debug");
    }

    #[test]
    fn test_padding() {
        assert_eq!(padding(5, "ab"), "   ");
        assert_eq!(padding(1, "abc"), "");
        assert_eq!(padding(3, "żó"), " ");
    }
}
