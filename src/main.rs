//! cairn-installer CLI entry point.

use std::process::ExitCode;

use cairn_installer::cli::Cli;
use cairn_installer::install;
use cairn_installer::steps::Pipeline;
use cairn_installer::ui::StepRenderer;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("cairn_installer=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cairn_installer=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("installer starting with args: {:?}", cli);

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let mut renderer = StepRenderer::new(cli.verbose);
    renderer.show_header(&cli.module, &cli.cairn_version);

    let steps = install::installation_steps(cli.module, cli.cairn_version);
    let mut pipeline = Pipeline::new(steps);

    if pipeline.run(&mut renderer) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
