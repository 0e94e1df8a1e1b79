use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use pixelsmith::cli::{self, CliArgs};
use pixelsmith::logger;
use pixelsmith::settings::EditorSettings;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    logger::init(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let settings = EditorSettings::load();
    let code = cli::run(args, settings);
    log::logger().flush();
    code
}
