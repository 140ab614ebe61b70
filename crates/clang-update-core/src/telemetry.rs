//! Tracing initialisation for the clang-update binary.
//!
//! Progress messages are ordinary `info!` events written to stdout, so they
//! interleave with the output of svn, cmake and ninja. Events from
//! third-party crates are held at `warn` unless `RUST_LOG` says otherwise.

use std::io;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Crates whose events follow the `--verbose` level.
const OWN_TARGETS: [&str; 3] = ["clang_update_core", "toolchain_env", "update_clang"];

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    std::iter::once("warn".to_string())
        .chain(OWN_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// `json` switches to newline-delimited JSON records with timestamps; the
/// plain format drops them since child output carries none either. Only the
/// first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let base = fmt::layer().with_target(false).with_writer(io::stdout);
    let layer = if json {
        base.json().with_current_span(false).boxed()
    } else {
        base.without_time().boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .ok();
}
