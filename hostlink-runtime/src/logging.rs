//! Logging utilities for the hostlink runtime
//!
//! Provides lightweight logging for object lifecycle, method dispatch and
//! callable invocation. Uses `tracing` for structured logging with minimal
//! overhead. The runtime never installs a subscriber; the embedding process
//! (usually the bridge) decides where events go.

// Re-export tracing macros for use throughout the runtime
pub use tracing::{debug, error, info, trace, warn, Level};

/// Log an object construction
#[inline]
pub fn log_object_new(class: &str, id: u64) {
    trace!(
        target: "runtime",
        class,
        id,
        "object constructed"
    );
}

/// Log an object being freed (last reference released)
#[inline]
pub fn log_object_free(class: &str, id: u64) {
    trace!(
        target: "runtime",
        class,
        id,
        "object freed"
    );
}

/// Log a method call through the class table
#[inline]
pub fn log_method_call(class: &str, method: &str, args_count: usize) {
    trace!(
        target: "dispatch",
        class,
        method,
        args_count,
        "method call"
    );
}

/// Log a rejected call
#[inline]
pub fn log_call_error(method: &str, error: u32, argument: i32) {
    debug!(
        target: "dispatch",
        method,
        error,
        argument,
        "call rejected"
    );
}

/// Log a utility function call
#[inline]
pub fn log_utility_call(name: &str, args_count: usize) {
    trace!(
        target: "builtins",
        name,
        args_count,
        "utility function called"
    );
}

/// Log a class registration
#[inline]
pub fn log_class_registered(class: &str, parent: &str) {
    info!(
        target: "runtime",
        class,
        parent,
        "class registered"
    );
}

/// Log a method registration
#[inline]
pub fn log_method_registered(class: &str, method: &str) {
    debug!(
        target: "runtime",
        class,
        method,
        "method registered"
    );
}

/// Log runtime initialization
#[inline]
pub fn log_runtime_init(classes: usize) {
    info!(target: "runtime", classes, "hostlink runtime initialized");
}
