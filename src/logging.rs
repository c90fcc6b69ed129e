//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never interleave with streamed answers on
//! stdout. The filter comes from `CHATWIRE_LOG`, then `RUST_LOG`, and
//! defaults to `warn` (`debug` with `--verbose`).

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::constants::LOG_ENV_VAR;

fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    // Disable ANSI color codes when stderr is redirected
    let is_tty = std::io::stderr().is_terminal();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_ansi(is_tty)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
