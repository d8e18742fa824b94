use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use wendc_drv::{Config, Session, Stage};

/// Teaching-grade compiler front-end: scans, parses, type-checks, lowers
/// to three-address code, and (by default) interprets it.
#[derive(Debug, Parser)]
#[command(name = "wendc", version, about)]
struct Args {
    /// Source file to compile.
    source: PathBuf,

    /// Which stage's output to print.
    #[arg(long, default_value = "run")]
    stage: String,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// File of newline-separated answers for `cin`, consumed in order.
    #[arg(long)]
    input: Option<PathBuf>,
}

/// Reads one line from the process's stdin per `cin`, consumed once the
/// `--input` file (if any) runs dry. Returns `None` at EOF.
fn stdin_input() -> Option<String> {
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(_) => None,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let stage = match Stage::from_name(&args.stage) {
        Some(stage) => stage,
        None => {
            eprintln!(
                "error: unknown --stage '{}' (expected one of: tokens, ast, sem, tac, run)",
                args.stage
            );
            return ExitCode::FAILURE;
        }
    };

    let config = Config {
        stage,
        verbose: args.verbose,
        input_path: args.input,
    };
    let session = Session::new(config);

    let on_input: Box<dyn FnMut() -> Option<String>> = Box::new(stdin_input);
    let output = match session.compile_file_with_input(&args.source, Some(on_input)) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    print!("{}", session.render(&output));

    let diagnostics = session.render_diagnostics(&output);
    if !diagnostics.is_empty() {
        eprintln!("{diagnostics}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
