use std::process::ExitCode;

use buildstep::cli::{self, CliArgs};
use buildstep::logger;
use buildstep::settings::Settings;
use clap::Parser;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let settings = Settings::load();

    if settings.session_log && !args.no_log {
        logger::init();
    }

    cli::run(args, &settings)
}
