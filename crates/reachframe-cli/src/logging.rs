//! Logging setup for the command-line runner.
//!
//! Human-readable compact output goes to stderr, so stdout stays clean for
//! the report. With `--log-file`, every event is also written as JSON lines.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// A `MakeWriter` that serializes events onto one shared file.
#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            guard: self.file.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Holds the file lock for one event.
struct SharedFileGuard<'a> {
    guard: MutexGuard<'a, File>,
}

impl io::Write for SharedFileGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut *self.guard, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut *self.guard)
    }
}

/// Default filter directive: `warn` normally, `debug` with `--verbose`.
/// `RUST_LOG` overrides either.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Install the global subscriber.
///
/// A second call is a no-op, so the in-process runner can be invoked
/// repeatedly.
///
/// # Errors
///
/// Returns `io::Error` if the log file cannot be created.
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let json_layer = match log_file {
        Some(path) => {
            let writer = SharedFileWriter {
                file: Arc::new(Mutex::new(File::create(path)?)),
            };
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true),
            )
        }
        None => None,
    };

    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(terminal_layer)
        .with(json_layer)
        .try_init();
    Ok(())
}
