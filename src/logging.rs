//! Tracing setup for the binary.
//!
//! Logs go to stderr so they never interleave with menu output on stdout.
//! `RUST_LOG` takes precedence over the verbosity flag.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "debug,arrest_warehouse=debug"
    } else {
        "warn"
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
