///
/// reprc CLI - Generate C headers from Rust layout declarations
///
/// Usage:
/// - reprc <file>: Print the header for <file> to stdout
/// - reprc <file> -o <header>: Write <header>, only if its content changed
/// - reprc - / reprc: Read the input from stdin
///
/// Skipped and untranslatable declarations are reported on stderr; they do
/// not fail the run. Anything the grammar cannot recognize does.
///

use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;

use reprc::{
    DiagnosticReporter, HeaderConfig, SourceFile, WriteOutcome, translate_source, write_if_changed,
};

#[derive(Parser)]
#[command(name = "reprc")]
#[command(author, version, about = "Translate #[repr(C)] Rust declarations into a C header", long_about = None)]
struct Cli {
    /// Input file; `-` or absent reads stdin
    input: Option<PathBuf>,

    /// Header to write; absent prints to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include line used when no declaration needs the optional wrapper
    #[arg(long, default_value = "rust/rust_spt.h")]
    include: String,

    /// Include line used when some declaration needs the optional wrapper
    #[arg(long, default_value = "rust/rust-common.h")]
    option_include: String,

    /// Log matching and translation progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let source_file = read_input(cli.input.as_ref());
    let config = HeaderConfig {
        include: cli.include,
        option_include: cli.option_include,
    };

    let translation = match translate_source(&source_file.source) {
        Ok(t) => t,
        Err(e) => {
            DiagnosticReporter::new(&source_file).report(&e);
            std::process::exit(1);
        }
    };

    for notice in &translation.notices {
        eprintln!("{}", notice);
    }

    let header = translation.render(&config);
    match cli.output {
        Some(path) => match write_if_changed(&path, &header) {
            Ok(WriteOutcome::Written) => {}
            Ok(WriteOutcome::Unchanged) => {
                eprintln!("No changes for file {}", path.display());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(header.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("Error writing output: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn read_input(input: Option<&PathBuf>) -> SourceFile {
    match input {
        Some(path) if path.as_os_str() != "-" => match std::fs::read_to_string(path) {
            Ok(s) => SourceFile::new(path.display().to_string(), s),
            Err(e) => {
                eprintln!("Error reading file: {}", e);
                std::process::exit(1);
            }
        },
        _ => {
            let mut s = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut s) {
                eprintln!("Error reading stdin: {}", e);
                std::process::exit(1);
            }
            SourceFile::new("<stdin>", s)
        }
    }
}
