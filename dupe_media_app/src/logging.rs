use std::io::IsTerminal;

use eyre::{Context, Result};

/// Wires up `fern` as `log`'s backend: colored level tags on stdout
/// when attached to a terminal, plain otherwise. Grounded on
/// `erikvader-imgdup`'s `bin_common::init::init_logger`, with the
/// formatter written directly against `fern`'s own `.format()` closure
/// instead of depending on the git-sourced `fern-format` crate the
/// original uses.
pub fn init_logger(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let color = std::io::stdout().is_terminal();

    fern::Dispatch::new()
        .level(level)
        .format(move |out, message, record| {
            let level_tag = if color {
                colorize(record.level())
            } else {
                record.level().to_string()
            };
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                level_tag,
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
        .apply()
        .wrap_err("failed to install the logger")
}

fn colorize(level: log::Level) -> String {
    let code = match level {
        log::Level::Error => "31",
        log::Level::Warn => "33",
        log::Level::Info => "32",
        log::Level::Debug => "36",
        log::Level::Trace => "90",
    };
    format!("\x1b[{code}m{level}\x1b[0m")
}
