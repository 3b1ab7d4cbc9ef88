//! Logging setup using tracing.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the verbosity flags.
pub const LOG_ENV: &str = "ROMCATALOG_LOG";

pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "romcatalog=warn,warn",
        1 => "romcatalog=info,warn",
        2 => "romcatalog=debug,info",
        _ => "trace",
    }
}

/// Initialize the logging subsystem, writing to stderr.
///
/// ```bash
/// ROMCATALOG_LOG=debug romcatalog --device alioth
/// ```
pub fn init(verbose: u8, ansi: bool) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(ansi)
                .with_target(verbose >= 2),
        )
        .try_init();
}
