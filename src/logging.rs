//! Logging infrastructure - structured tracing for the bridge
//!
//! Design: `tracing` macros everywhere, one subscriber per process:
//! - Targets: `interface`, `dispatch`, `marshal`, `callable`, `registry`
//! - `RUST_LOG` wins over the configured level
//! - Output is non-blocking, to stderr or a single file
//!
//! A process embedding the bridge that installs its own subscriber can
//! skip `init` entirely; events then go wherever that subscriber sends them.

use crate::config::LogConfig;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for use throughout the bridge
pub use tracing::{debug, error, info, trace, warn, Level};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Keeps the background writer alive for the lifetime of the process
static GUARD: Mutex<Option<WorkerGuard>> = parking_lot::const_mutex(None);

/// Initialize logging from `HOSTLINK_*` environment variables
pub fn init() {
    init_with_config(&LogConfig::from_env());
}

/// Initialize logging once; later calls are ignored
pub fn init_with_config(config: &LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = build_filter(config);

        let (writer, guard) = match &config.log_path {
            Some(path) => {
                let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
                let file_name = path.file_name().map(|f| f.to_os_string()).unwrap_or_else(|| "hostlink.log".into());
                let appender = tracing_appender::rolling::never(directory.unwrap_or_else(|| std::path::Path::new(".")), file_name);
                tracing_appender::non_blocking(appender)
            }
            None => tracing_appender::non_blocking(std::io::stderr()),
        };

        let span_events = if config.show_spans { FmtSpan::NEW | FmtSpan::CLOSE } else { FmtSpan::NONE };

        let json_layer = config.json_format.then(|| {
            fmt::layer()
                .json()
                .with_writer(writer.clone())
                .with_span_events(span_events.clone())
        });
        let text_layer = (!config.json_format).then(|| {
            fmt::layer()
                .compact()
                .with_writer(writer)
                .with_span_events(span_events)
        });

        // Another subscriber may already be installed by the host process
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .with(text_layer)
            .try_init()
            .is_ok();

        if installed {
            *GUARD.lock() = Some(guard);
            info!(target: "interface", level = %config.level, json = config.json_format, "logging initialized");
        }
    });
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Log a dispatched call
#[inline]
pub fn log_call(method: &dyn std::fmt::Display, args_count: usize) {
    trace!(
        target: "dispatch",
        method = %method,
        args_count,
        "method call"
    );
}

/// Log a call the runtime rejected or could not resolve
#[inline]
pub fn log_call_failed(method: &dyn std::fmt::Display, reason: &dyn std::fmt::Display) {
    debug!(
        target: "dispatch",
        method = %method,
        reason = %reason,
        "call produced no result"
    );
}

/// Log an argument list too long for the fixed-arity arrays
#[inline]
pub fn log_heap_marshal(args_count: usize) {
    trace!(
        target: "marshal",
        args_count,
        "argument pointers marshaled on the heap"
    );
}

/// Log a host closure that panicked inside the trampoline
#[inline]
pub fn log_closure_panic(name: &str, message: &str) {
    error!(
        target: "callable",
        name,
        message,
        "host closure panicked"
    );
}
