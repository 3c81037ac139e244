//! aspdiag - parse BUILD files and report deferrals and diagnostics.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use aspdiag_core::{
    parse_files, pending_labels, BuildLabel, FormatConfig, GenDirLayout, ParseError,
    ParseOptions,
};
use aspdiag_core::source::DEFAULT_GEN_DIR;
use clap::Parser;
use miette::{Diagnostic, IntoDiagnostic};
use tracing_subscriber::EnvFilter;

/// Parse BUILD files and report what went wrong, with source context.
#[derive(Debug, Parser)]
#[command(name = "aspdiag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// BUILD files to parse.
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Label that is already built, so `subinclude` of it succeeds (repeatable).
    #[arg(long = "built", value_name = "LABEL")]
    built: Vec<BuildLabel>,

    /// Directory generated files are written to.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_GEN_DIR)]
    gen_dir: String,

    /// Only print what immediately went wrong, without source context.
    #[arg(long)]
    short: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,

    /// Enable verbose logging (can be repeated: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info,aspdiag_core=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .ok(); // Ignore if already initialized
}

fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = ParseOptions {
        built: cli.built.into_iter().collect(),
        layout: GenDirLayout::new(cli.gen_dir),
    };
    let format = FormatConfig::for_terminal(io::stderr().is_terminal() && !cli.no_color);

    let reports = parse_files(&cli.files, &options);
    let mut stdout = io::stdout().lock();
    let mut failed = false;
    for report in &reports {
        match &report.result {
            Ok(package) => {
                tracing::info!("{}: {} rule(s)", report.path.display(), package.rules.len());
            }
            Err(ParseError::Deferred(deferred)) => {
                writeln!(stdout, "{}: requires build of {}", report.path.display(), deferred.label)
                    .into_diagnostic()?;
            }
            Err(ParseError::Stack(stack)) => {
                failed = true;
                if cli.short {
                    eprintln!("{}: {}", report.path.display(), stack.short_error());
                } else {
                    eprintln!("{}", stack.render(&format));
                    if let Some(help) = stack.help() {
                        eprintln!("help: {help}");
                    }
                }
            }
        }
    }

    stdout.flush().into_diagnostic()?;

    let pending = pending_labels(&reports);
    let code = if failed {
        ExitCode::FAILURE
    } else if !pending.is_empty() {
        tracing::info!(
            "waiting on {}",
            pending.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };
    Ok(code)
}
