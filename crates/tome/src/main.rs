//! tome CLI - Markdown to HTML converter.
//!
//! Converts a Markdown file into an HTML page, or a directory of Markdown
//! files into a mirrored directory of pages. With `--watch`, keeps the
//! output up to date until interrupted.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::ConvertArgs;
use error::CliError;
use output::Output;

/// tome - Markdown to HTML converter.
#[derive(Parser)]
#[command(name = "tome", version, about)]
struct Cli {
    #[command(flatten)]
    args: ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli.args) {
        output.error(&format!("Error: {err}"));
        if !err.is_user_error() {
            for cause in err.causes() {
                output.error(&format!("  caused by: {cause}"));
            }
        }
        std::process::exit(1);
    }
}

fn run(args: ConvertArgs) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(args.execute(&cwd))
}
