//! # NovaSVG CLI
//!
//! Entry point for the `novasvg` binary.

use clap::Parser;
use novasvg_cli::{run, CliArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing on stderr.
///
/// Set `RUST_LOG` to control log levels (default: warn, info for the novasvg crates;
/// `--quiet` lowers it to errors). Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing(quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        "warn,novasvg=info,novasvg_core=info,novasvg_cli=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.quiet);

    tracing::debug!(command = ?args.command, "starting novasvg");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&args, &mut out)
}
