use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlstyle::config::KeywordCase;
use sqlstyle::mode::Mode;
use sqlstyle::report::Report;

/// sqlstyle - a clause-aware SQL pretty-printer.
#[derive(Parser, Debug)]
#[command(name = "sqlstyle", version, about)]
struct Cli {
    /// Files or directories to format. Use "-" to read from stdin.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Check formatting without writing changes.
    #[arg(long)]
    check: bool,

    /// Show formatting diff.
    #[arg(long)]
    diff: bool,

    /// Skip the token equivalence check.
    #[arg(long)]
    fast: bool,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Path to config file (sqlstyle.toml or pyproject.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keyword casing.
    #[arg(long, value_enum)]
    keyword_case: Option<KeywordCase>,

    /// Spaces per indent level.
    #[arg(long)]
    indent_width: Option<usize>,

    /// Align AS keywords across the SELECT list.
    #[arg(long)]
    align_aliases: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let is_stdin = cli.files.len() == 1 && cli.files[0].to_string_lossy() == "-";

    let base_mode = match sqlstyle::load_config(&cli.files, cli.config.as_deref()) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let mut formatter = base_mode.formatter;
    if let Some(case) = cli.keyword_case {
        formatter = formatter.with_keyword_case(case);
    }
    if let Some(width) = cli.indent_width {
        formatter = formatter.with_indent_width(width);
    }
    if cli.align_aliases {
        formatter = formatter.with_align_aliases(true);
    }

    let mode = Mode {
        check: cli.check,
        diff: cli.diff,
        fast: cli.fast || base_mode.fast,
        exclude: if cli.exclude.is_empty() {
            base_mode.exclude
        } else {
            cli.exclude
        },
        verbose: cli.verbose,
        quiet: cli.quiet,
        formatter,
    };

    if is_stdin {
        let mut source = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut source) {
            eprintln!("Error reading stdin: {}", e);
            std::process::exit(2);
        }

        match sqlstyle::format_string(&source, &mode) {
            Ok(formatted) => println!("{}", formatted),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            }
        }
        return;
    }

    let report = sqlstyle::run(&cli.files, &mode);

    if !mode.quiet {
        print_verbose_results(&report, &mode);
        eprintln!("{}", report.summary(mode.check));
    }

    report.print_errors();

    if report.has_errors() {
        std::process::exit(2);
    } else if mode.check && report.has_changes() {
        std::process::exit(1);
    }
}

fn print_verbose_results(report: &Report, mode: &Mode) {
    if !mode.verbose {
        return;
    }
    let verb = if mode.check || mode.diff { "would reformat" } else { "reformatted" };
    for path in report.changed_paths() {
        eprintln!("{} {}", verb, path.display());
    }
}
