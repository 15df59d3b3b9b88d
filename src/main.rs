mod comparator;
mod config;
mod disk;
mod engine;
mod error;
mod pattern_source;
mod report;
mod scanner;
mod slot;

use clap::Parser;

use config::{EngineConfig, Opt};
use engine::Engine;
use error::ScanError;

fn main() {
    let opt = parse_args();

    env_logger::Builder::new()
        .filter_level(log_level(opt.verbose))
        .format_timestamp(None)
        .init();

    if let Err(err) = run(opt) {
        err.report();
        std::process::exit(err.exit_code());
    }
}

fn run(opt: Opt) -> Result<(), ScanError> {
    let config = EngineConfig::from_opt(opt)?;

    log::info!(
        "scanning {} against patterns in {} with {} slots",
        config.device.display(),
        config.patterns.display(),
        config.threads
    );

    let mut engine = Engine::new(config)?;
    engine.run()
}

/// clap's own exit code for a parse failure is 2; §6 reserves 2 for
/// device/directory open failures and wants argument errors on 1, so help
/// and version requests still exit through clap (code 0) but every other
/// parse error is reprinted and reconciled to exit code 1.
fn parse_args() -> Opt {
    Opt::try_parse().unwrap_or_else(|err| {
        use clap::error::ErrorKind;

        if matches!(
            err.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
        ) {
            err.exit();
        }

        let _ = err.print();
        std::process::exit(1);
    })
}

fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
