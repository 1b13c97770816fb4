use std::{io, slice};

use native_header::core_header::LogLevel;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Target of events forwarded from native libraries through `HostH::log_fn`.
pub const NATIVE_TARGET: &str = "nativebind::native";

/// Filter used when `RUST_LOG` is not set.
///
/// Native libraries log their calls at info, so those stay visible by default.
/// Verbose mode also lets through their debug and trace output.
fn default_directives(verbose: bool) -> String {
    if verbose {
        format!("warn,nativebind=debug,{}=trace", NATIVE_TARGET)
    } else {
        format!("warn,nativebind=info,{}=info", NATIVE_TARGET)
    }
}

/// Installs the CLI subscriber, writing to stderr so stdout only carries results.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_cli_logger(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .without_time()
                .compact(),
        )
        .try_init()
        .is_ok()
}

/// Log sink handed to native libraries through `HostH::log_fn`.
pub(crate) extern "C" fn native_log(level: u32, ptr: *const u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    let bytes = unsafe { slice::from_raw_parts(ptr, len) };
    let message = String::from_utf8_lossy(bytes);

    match LogLevel::from_raw(level) {
        Some(LogLevel::Error) => tracing::error!(target: NATIVE_TARGET, "{}", message),
        Some(LogLevel::Warn) => tracing::warn!(target: NATIVE_TARGET, "{}", message),
        Some(LogLevel::Info) => tracing::info!(target: NATIVE_TARGET, "{}", message),
        Some(LogLevel::Debug) => tracing::debug!(target: NATIVE_TARGET, "{}", message),
        Some(LogLevel::Trace) => tracing::trace!(target: NATIVE_TARGET, "{}", message),
        None => tracing::warn!(target: NATIVE_TARGET, level, "{}", message),
    }
}
